//! Per-host content selectors for known publishing platforms.

use url::Url;

/// Platform table: host suffix and its selectors, tried in order.
pub static PLATFORM_SELECTORS: &[(&str, &[&str])] = &[
    (
        "techcrunch.com",
        &[
            ".wp-block-post-content",
            ".article-content",
            "[data-module='ArticleBody']",
            ".post-content",
        ],
    ),
    (
        "medium.com",
        &[
            "article section",
            "[data-testid='storyContent']",
            ".story-content",
            "article div[data-selectable-paragraph]",
        ],
    ),
    (
        "theverge.com",
        &[
            ".duet--article--article-body",
            "[data-testid='ArticleBodyWrapper']",
            ".c-entry-content",
            ".l-article-content",
        ],
    ),
    (
        "arstechnica.com",
        &[".post-content", "[itemprop='articleBody']", ".article-content"],
    ),
    (
        "wired.com",
        &[
            "[data-testid='BodyWrapper']",
            ".article__chunks",
            "[data-testid='ArticleBodyWrapper']",
        ],
    ),
    (
        "engadget.com",
        &["[data-module='ArticleBody']", ".article-text", ".o-article_body"],
    ),
    (
        "techradar.com",
        &["[data-testid='article-body']", "#article-body", ".text-copy"],
    ),
    (
        "zdnet.com",
        &[".storyBody", "[data-module='ArticleBody']", ".content"],
    ),
    (
        "bbc.com",
        &[
            "[data-component='text-block']",
            ".story-body__inner",
            "[data-testid='article-text']",
        ],
    ),
    (
        "cnn.com",
        &[
            ".zn-body__paragraph",
            "[data-testid='article-content']",
            ".l-container",
        ],
    ),
    (
        "reuters.com",
        &[
            "[data-testid='paragraph']",
            ".ArticleBodyWrapper",
            ".StandardArticleBody",
        ],
    ),
    (
        "theguardian.com",
        &["[data-gu-name='body']", ".content__article-body", "#maincontent"],
    ),
    (
        "nytimes.com",
        &[
            "section[name='articleBody']",
            ".StoryBodyCompanionColumn",
            "[data-testid='articleBody']",
        ],
    ),
    (
        "washingtonpost.com",
        &["[data-testid='article-body']", ".article-body", "#article-body"],
    ),
    (
        "wsj.com",
        &["[data-module='ArticleBody']", ".wsj-snippet-body", ".article-content"],
    ),
    (
        "forbes.com",
        &[".article-body", "[data-testid='article-body']", ".body-container"],
    ),
    ("news.ycombinator.com", &[".comment", ".commtext"]),
    (
        "reddit.com",
        &["[data-testid='post-content']", ".md", "[data-click-id='text']"],
    ),
    (
        "github.blog",
        &[".post-content", "[data-testid='article-body']", ".markdown-body"],
    ),
    (
        "stackoverflow.blog",
        &[".s-prose", ".post-content", "[itemprop='text']"],
    ),
    (
        "dev.to",
        &[
            "[data-article-id] .crayons-article__body",
            ".article-body",
            "#article-body",
        ],
    ),
    (
        "substack.com",
        &[".markup", "[data-testid='post-content']", ".post-content"],
    ),
    (
        "blogspot.com",
        &[".post-body", ".entry-content", "[itemprop='articleBody']"],
    ),
    (
        "wordpress.com",
        &[".entry-content", ".post-content", "[data-testid='post-content']"],
    ),
    (
        "mashable.com",
        &["[data-testid='article-body']", ".article-content", ".blueprint"],
    ),
    (
        "venturebeat.com",
        &[".article-content", "[data-module='ArticleBody']", ".the-content"],
    ),
    (
        "9to5mac.com",
        &[".post-content", "[data-testid='post-content']", ".entry-content"],
    ),
    (
        "9to5google.com",
        &[".post-content", "[data-testid='post-content']", ".entry-content"],
    ),
];

/// Generic content selectors, semantic tags first.
pub static GENERIC_SELECTORS: &[&str] = &[
    "article",
    "main",
    ".content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".story-body",
    ".post-body",
    "[role=main]",
    "[itemprop='articleBody']",
    ".article-body",
    ".post-body-content",
    ".article",
    ".blog-post",
];

fn lookup(host: &str) -> Option<&'static [&'static str]> {
    PLATFORM_SELECTORS
        .iter()
        .find(|(domain, _)| *domain == host)
        .map(|(_, selectors)| *selectors)
}

/// Selectors for the platform serving `page_url`, if it is a known one.
///
/// Lookup order: exact host, host without `www.`, then the first table
/// entry the host is a subdomain of.
pub fn platform_selectors(page_url: &str) -> Option<&'static [&'static str]> {
    let parsed = Url::parse(page_url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();

    if let Some(selectors) = lookup(&host) {
        return Some(selectors);
    }
    if let Some(bare) = host.strip_prefix("www.") {
        if let Some(selectors) = lookup(bare) {
            return Some(selectors);
        }
    }
    PLATFORM_SELECTORS
        .iter()
        .find(|(domain, _)| {
            host.strip_suffix(domain)
                .is_some_and(|head| head.ends_with('.'))
        })
        .map(|(_, selectors)| *selectors)
}

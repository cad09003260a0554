//! Rule-based shortcuts in front of a real classifier.
//!
//! Obvious cases never reach the wrapped classifier: an explicit attribution
//! near the start of the text is referenced reporting, a strong
//! self-reference anywhere is primary reporting, and text too short to judge
//! is treated as primary with low confidence.

use super::{ClassificationRequest, ClassificationVerdict, ContentClassifier};
use crate::error::ClassifierError;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Attribution phrases are only looked for in this many leading characters.
pub const ATTRIBUTION_WINDOW_CHARS: usize = 200;

/// Below this many characters of prepared text there is nothing to classify.
pub const MIN_CLASSIFIABLE_CHARS: usize = 10;

/// Explicit attribution phrase and the source it names.
pub const ATTRIBUTION_PHRASES: &[(&str, &str)] = &[
    ("according to reuters,", "Reuters"),
    ("reuters reports that", "Reuters"),
    ("reuters reported that", "Reuters"),
    ("according to cnn,", "CNN"),
    ("cnn reports that", "CNN"),
    ("cnn reported that", "CNN"),
    ("according to bbc,", "BBC News"),
    ("bbc reports that", "BBC News"),
    ("bbc reported that", "BBC News"),
    ("according to ap,", "Associated Press"),
    ("associated press reports", "Associated Press"),
    ("according to bloomberg,", "Bloomberg"),
    ("bloomberg reports that", "Bloomberg"),
    ("bloomberg reported that", "Bloomberg"),
    ("according to wsj,", "Wall Street Journal"),
    ("according to the wall street journal,", "Wall Street Journal"),
    ("wall street journal reports", "Wall Street Journal"),
    ("according to the new york times,", "New York Times"),
    ("new york times reports", "New York Times"),
    ("first reported by", "Unknown"),
    ("originally reported by", "Unknown"),
];

pub const SELF_REFERENCE_PHRASES: &[&str] = &[
    "our exclusive interview",
    "our investigation found",
    "our investigation revealed",
    "our reporters found",
    "our team discovered",
    "we exclusively learned",
    "we can exclusively report",
    "exclusive: ",
    "breaking: our ",
];

/// Decide from the prepared text alone, if the rules allow it.
pub fn rule_verdict(text: &str) -> Option<ClassificationVerdict> {
    if text.chars().count() < MIN_CLASSIFIABLE_CHARS {
        return Some(ClassificationVerdict {
            is_primary_reporting: true,
            original_source_name: None,
            confidence: 0.1,
            reasoning: "Insufficient content for analysis; defaulting to primary reporting".into(),
        });
    }

    let lower = text.to_lowercase();
    let head: String = lower.chars().take(ATTRIBUTION_WINDOW_CHARS).collect();

    if let Some((phrase, source)) = ATTRIBUTION_PHRASES
        .iter()
        .find(|(phrase, _)| head.contains(phrase))
    {
        return Some(ClassificationVerdict {
            is_primary_reporting: false,
            original_source_name: Some(source.to_string()),
            confidence: 0.9,
            reasoning: format!("Explicit attribution {phrase:?} indicates referenced reporting"),
        });
    }

    SELF_REFERENCE_PHRASES
        .iter()
        .find(|phrase| lower.contains(*phrase))
        .map(|phrase| ClassificationVerdict {
            is_primary_reporting: true,
            original_source_name: None,
            confidence: 0.9,
            reasoning: format!("Strong self-reference {phrase:?} indicates primary reporting"),
        })
}

/// Applies [`rule_verdict`] before delegating to `inner`.
#[derive(Debug)]
pub struct RuleBasedClassifier<C> {
    inner: C,
}

impl<C> RuleBasedClassifier<C>
where
    C: ContentClassifier,
{
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<C> ContentClassifier for RuleBasedClassifier<C>
where
    C: ContentClassifier,
{
    #[instrument(level = "debug", skip_all, fields(url = %request.url))]
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationVerdict, ClassifierError> {
        if let Some(verdict) = rule_verdict(&request.prepared_text()) {
            debug!(reasoning = %verdict.reasoning, "Rule decided classification");
            return Ok(verdict);
        }
        self.inner.classify(request).await
    }
}

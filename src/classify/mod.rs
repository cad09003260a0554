//! Primary-vs-referenced reporting classification.
//!
//! The classifier itself is an external collaborator behind
//! [`ContentClassifier`]. This module prepares its input, decorates it with
//! rule-based shortcuts ([`rules`]) and retries ([`retry`]), and maps every
//! possible outcome to the attribution fields of a post through one pure
//! function, [`attribution_for`].

pub mod retry;
pub mod rules;

use crate::error::ClassifierError;
use crate::models::CandidatePost;
use crate::utils::truncate_chars;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Content sent to the classifier is capped at this many characters.
pub const MAX_CLASSIFIER_CONTENT_CHARS: usize = 1_500;

/// What the classifier is asked about.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ClassificationRequest {
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: String,
}

impl ClassificationRequest {
    /// Build a request from a candidate post.
    ///
    /// Extracted full content is preferred over feed body text; either is
    /// capped at [`MAX_CLASSIFIER_CONTENT_CHARS`] with an ellipsis.
    pub fn from_post(post: &CandidatePost) -> Self {
        let content = post
            .full_content
            .as_deref()
            .filter(|c| !c.is_empty())
            .or(post.content.as_deref().filter(|c| !c.is_empty()))
            .map(|c| truncate_chars(c, MAX_CLASSIFIER_CONTENT_CHARS, "..."));

        Self {
            title: post.title.clone(),
            description: post.description.clone().filter(|d| !d.is_empty()),
            content,
            url: post.url.clone(),
        }
    }

    /// The labelled text block a classifier reads.
    pub fn prepared_text(&self) -> String {
        let mut parts = Vec::new();
        if !self.title.is_empty() {
            parts.push(format!("Title: {}", self.title));
        }
        if let Some(description) = &self.description {
            parts.push(format!("Description: {description}"));
        }
        if let Some(content) = &self.content {
            parts.push(format!("Content: {content}"));
        }
        parts.join("\n\n")
    }
}

/// A classifier's decision.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ClassificationVerdict {
    pub is_primary_reporting: bool,
    #[serde(default)]
    pub original_source_name: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

impl ClassificationVerdict {
    /// Parse a verdict from a free-form model reply containing one JSON object.
    ///
    /// [`ContentClassifier`] implementations that wrap a chat model send it
    /// [`ClassificationRequest::prepared_text`] and hand the raw reply here.
    /// Text around the outermost braces is ignored, an empty or `"null"`
    /// source name becomes `None` and an out-of-range confidence becomes 0.5.
    pub fn from_model_reply(reply: &str) -> Result<Self, ClassifierError> {
        let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
            return Err(ClassifierError::InvalidResponse(
                "no JSON object in reply".into(),
            ));
        };
        if end < start {
            return Err(ClassifierError::InvalidResponse(
                "no JSON object in reply".into(),
            ));
        }

        let mut verdict: ClassificationVerdict = serde_json::from_str(&reply[start..=end])
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        verdict.original_source_name = verdict
            .original_source_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "null");
        if !(0.0..=1.0).contains(&verdict.confidence) {
            debug!(confidence = verdict.confidence, "Clamping invalid confidence");
            verdict.confidence = 0.5;
        }
        Ok(verdict)
    }
}

/// External content classifier.
#[async_trait]
pub trait ContentClassifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationVerdict, ClassifierError>;
}

#[async_trait]
impl<T> ContentClassifier for Arc<T>
where
    T: ContentClassifier + ?Sized,
{
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationVerdict, ClassifierError> {
        (**self).classify(request).await
    }
}

/// The three ways a classification attempt can end.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutcome {
    Classified(ClassificationVerdict),
    Unavailable(String),
    Disabled,
}

/// Attribution fields written onto a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub is_primary_reporting: bool,
    pub original_source_name: Option<String>,
}

/// Map a classification outcome to attribution.
///
/// A disabled classifier assumes primary reporting. A failed classifier
/// assumes referenced reporting so the post is flagged for attribution.
pub fn attribution_for(outcome: &ClassifierOutcome) -> Attribution {
    match outcome {
        ClassifierOutcome::Classified(verdict) => Attribution {
            is_primary_reporting: verdict.is_primary_reporting,
            original_source_name: verdict.original_source_name.clone(),
        },
        ClassifierOutcome::Unavailable(_) => Attribution {
            is_primary_reporting: false,
            original_source_name: None,
        },
        ClassifierOutcome::Disabled => Attribution {
            is_primary_reporting: true,
            original_source_name: None,
        },
    }
}

/// Run `classifier` on `post`, or report it disabled when there is none.
pub async fn classify_post(
    classifier: Option<&dyn ContentClassifier>,
    post: &CandidatePost,
) -> ClassifierOutcome {
    let Some(classifier) = classifier else {
        return ClassifierOutcome::Disabled;
    };
    let request = ClassificationRequest::from_post(post);
    match classifier.classify(&request).await {
        Ok(verdict) => {
            debug!(
                guid = %post.guid,
                primary = verdict.is_primary_reporting,
                source = ?verdict.original_source_name,
                confidence = verdict.confidence,
                "Classified post"
            );
            ClassifierOutcome::Classified(verdict)
        }
        Err(e) => {
            warn!(guid = %post.guid, error = %e, "Classification failed; using conservative default");
            ClassifierOutcome::Unavailable(e.to_string())
        }
    }
}

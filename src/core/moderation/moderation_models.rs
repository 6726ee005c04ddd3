// Moderation domain models - data structures for the banned-term filter.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts serenity messages into `InboundMessage`.

use serde::{Deserialize, Serialize};

/// One forbidden word or phrase, scoped to a single community (guild).
///
/// The text is stored verbatim. Detection compares it case- and
/// whitespace-insensitively, removal compares it byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedTerm {
    pub text: String,
    pub community_id: String,
}

impl BannedTerm {
    /// Build a term, rejecting blank text or a blank community id.
    pub fn new(
        text: impl Into<String>,
        community_id: impl Into<String>,
    ) -> Result<Self, super::ModerationError> {
        let text = text.into();
        let community_id = community_id.into();

        if text.trim().is_empty() {
            return Err(super::ModerationError::InvalidTerm(
                "term text must not be blank".to_string(),
            ));
        }
        if community_id.is_empty() {
            return Err(super::ModerationError::InvalidTerm(
                "community id must not be empty".to_string(),
            ));
        }

        Ok(Self { text, community_id })
    }
}

/// Outcome of running the detection engine over one message body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectionResult {
    /// Whether any term was found in the message
    pub matched: bool,
    /// The original text of the first term that matched
    pub matched_term: Option<String>,
    /// The message with every anchored occurrence wrapped in spoiler markup.
    /// Equal to the original body when the anchored pattern found nothing.
    pub redacted_text: Option<String>,
}

impl DetectionResult {
    /// A clean message.
    pub fn clean() -> Self {
        Self::default()
    }

    /// A message that contained `term`.
    pub fn matched(term: impl Into<String>, redacted_text: impl Into<String>) -> Self {
        Self {
            matched: true,
            matched_term: Some(term.into()),
            redacted_text: Some(redacted_text.into()),
        }
    }
}

/// A chat message as the moderation service sees it.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub body: String,
    /// `None` for direct messages
    pub community_id: Option<String>,
    pub author_is_automated: bool,
    pub author_display_name: String,
}

/// What happened to a message after moderation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationOutcome {
    /// Bot author or no community context
    Skipped,
    /// No banned term present
    Clean,
    /// A banned term was found and the delivery steps were attempted
    Redacted {
        matched_term: String,
        deleted: bool,
        published: bool,
    },
}

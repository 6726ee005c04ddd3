// Banned-term moderation service - core business logic.
//
// This service handles:
// - The store connection lifecycle (retrying connect, close)
// - Administrative term management (add, remove, list)
// - Per-message moderation (detect, delete, republish redacted)
//
// NO Discord dependencies here - just pure domain logic.

use super::moderation_models::{BannedTerm, InboundMessage, ModerationOutcome};
use super::retry_policy::{RetryPolicy, Sleeper};
use super::term_detection;
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    /// The store could not be reached, even after retrying.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// A single store operation failed.
    #[error("Persistence operation failed: {0}")]
    PersistenceOperationFailed(String),

    /// Deleting or publishing a message failed.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Invalid term: {0}")]
    InvalidTerm(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting banned terms.
///
/// Implementations must be safe to call concurrently; the service adds no
/// locking of its own.
#[async_trait]
pub trait TermStore: Send + Sync {
    /// Open the connection and verify it with a round-trip query. One attempt.
    async fn open(&self) -> Result<(), ModerationError>;

    /// Insert a term. No uniqueness check.
    async fn add_term(&self, term: BannedTerm) -> Result<(), ModerationError>;

    /// Delete at most one term whose text and community match exactly.
    /// Removing a term that does not exist is not an error.
    async fn remove_term(&self, text: &str, community_id: &str) -> Result<(), ModerationError>;

    /// All terms for a community, in no particular order.
    async fn list_terms(&self, community_id: &str) -> Result<Vec<BannedTerm>, ModerationError>;

    /// Release the connection. Safe to call repeatedly or before `open`.
    async fn close(&self);
}

// ============================================================================
// CHANNEL TRAIT (PORT)
// ============================================================================

/// The channel an inbound message arrived on.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Delete the inbound message.
    async fn delete_message(&self) -> Result<(), ModerationError>;

    /// Post a new message to the same channel.
    async fn publish(&self, text: &str) -> Result<(), ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Banned-term moderation service.
pub struct ModerationService<S: TermStore> {
    store: S,
}

impl<S: TermStore> ModerationService<S> {
    /// Create a new moderation service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Connect to the store, retrying per `policy`.
    ///
    /// Exhausting the attempts yields `PersistenceUnavailable` with the last
    /// underlying error.
    pub async fn connect(
        &self,
        policy: &RetryPolicy,
        sleeper: &dyn Sleeper,
    ) -> Result<(), ModerationError> {
        let store = &self.store;
        policy
            .run(sleeper, move |_attempt| store.open())
            .await
            .map_err(|e| match e {
                ModerationError::PersistenceUnavailable(_) => e,
                other => ModerationError::PersistenceUnavailable(other.to_string()),
            })?;

        tracing::info!("Connected to term store");
        Ok(())
    }

    /// Release the store connection.
    pub async fn close(&self) {
        self.store.close().await;
    }

    /// Ban a term in a community.
    pub async fn add_term(
        &self,
        community_id: &str,
        text: &str,
    ) -> Result<BannedTerm, ModerationError> {
        let term = BannedTerm::new(text, community_id)?;
        self.store.add_term(term.clone()).await?;

        tracing::info!(guild_id = community_id, "Banned term added");
        Ok(term)
    }

    /// Unban a term. Matching is exact; a miss is silently ignored.
    pub async fn remove_term(&self, community_id: &str, text: &str) -> Result<(), ModerationError> {
        self.store.remove_term(text, community_id).await?;

        tracing::info!(guild_id = community_id, "Banned term removal processed");
        Ok(())
    }

    /// List the banned terms for a community.
    pub async fn list_terms(&self, community_id: &str) -> Result<Vec<BannedTerm>, ModerationError> {
        self.store.list_terms(community_id).await
    }

    /// Moderate one inbound message.
    ///
    /// Store failures are returned. Delete and publish failures are logged
    /// and swallowed, and a failed delete does not stop the publish.
    pub async fn moderate_message<C: MessageChannel + ?Sized>(
        &self,
        message: &InboundMessage,
        channel: &C,
    ) -> Result<ModerationOutcome, ModerationError> {
        if message.author_is_automated {
            return Ok(ModerationOutcome::Skipped);
        }
        let community_id = match &message.community_id {
            Some(id) => id,
            None => return Ok(ModerationOutcome::Skipped),
        };

        let terms = self.store.list_terms(community_id).await?;
        let detection = term_detection::detect(&message.body, &terms);

        if !detection.matched {
            return Ok(ModerationOutcome::Clean);
        }
        let matched_term = match detection.matched_term {
            Some(term) => term,
            None => return Ok(ModerationOutcome::Clean),
        };
        let redacted = detection
            .redacted_text
            .unwrap_or_else(|| message.body.clone());

        tracing::debug!(guild_id = %community_id, "Message contained a banned term");

        let deleted = match channel.delete_message().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to delete message with banned term: {}", e);
                false
            }
        };

        let notice = format_notice(&message.author_display_name, &redacted);
        let published = match channel.publish(&notice).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send redacted message: {}", e);
                false
            }
        };

        Ok(ModerationOutcome::Redacted {
            matched_term,
            deleted,
            published,
        })
    }
}

/// The notice posted in place of a removed message.
pub fn format_notice(author: &str, redacted: &str) -> String {
    format!("{}: \"{}\" contains a banned word", author, redacted)
}

// ============================================================================
// TESTS
// ============================================================================

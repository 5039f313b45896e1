//! Timeline service: loads a member's records and builds the statement.

use std::sync::Arc;

use amarra_shared::AppError;
use amarra_shared::types::MemberId;
use thiserror::Error;

use super::builder::build_timeline;
use super::types::Timeline;
use crate::store::{AllocationRepository, InvoiceRepository, PaymentRepository, StoreError};

/// Errors raised while building a timeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// The member's records could not be loaded.
    #[error("Failed to load history of member {member_id}: {source}")]
    LoadFailed {
        /// Member.
        member_id: MemberId,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

impl TimelineError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::LoadFailed { .. } => "TIMELINE_LOAD_FAILED",
        }
    }
}

impl From<TimelineError> for AppError {
    fn from(err: TimelineError) -> Self {
        Self::Database(err.to_string())
    }
}

/// Read-only statement builder over the store.
pub struct TimelineService<S> {
    store: Arc<S>,
}

impl<S> TimelineService<S>
where
    S: InvoiceRepository + PaymentRepository + AllocationRepository,
{
    /// Creates a new timeline service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Chronological statement of a member. A member with no history gets
    /// an empty timeline.
    pub async fn member_timeline(&self, member_id: MemberId) -> Result<Timeline, TimelineError> {
        let load_failed = |source| TimelineError::LoadFailed { member_id, source };

        let invoices = self
            .store
            .list_member_invoices(member_id)
            .await
            .map_err(load_failed)?;
        let payments = self
            .store
            .list_member_payments(member_id)
            .await
            .map_err(load_failed)?;
        let payment_ids: Vec<_> = payments.iter().map(|p| p.id).collect();
        let allocations = if payment_ids.is_empty() {
            Vec::new()
        } else {
            self.store
                .list_allocations_for_payments(&payment_ids)
                .await
                .map_err(load_failed)?
        };

        let timeline = build_timeline(member_id, &invoices, &payments, &allocations);
        tracing::debug!(
            %member_id,
            entries = timeline.entries.len(),
            closing_balance = %timeline.closing_balance,
            "timeline built"
        );
        Ok(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FaultPoint, InMemoryStore};

    #[tokio::test]
    async fn test_member_without_history() {
        let store = Arc::new(InMemoryStore::new());
        let timeline = TimelineService::new(store)
            .member_timeline(MemberId::new())
            .await
            .unwrap();
        assert!(timeline.is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let store = Arc::new(InMemoryStore::new());
        store.fail(FaultPoint::InvoiceReads, StoreError::Unavailable("down".into()));
        let err = TimelineService::new(store)
            .member_timeline(MemberId::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "TIMELINE_LOAD_FAILED");
    }
}

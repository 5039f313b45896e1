//! The identity matcher: runs the tier cascade against a member store.

use std::sync::Arc;

use super::tiers;
use super::types::{MatchResult, MatchTier};
use crate::statement::Movement;
use crate::store::{Member, MemberRepository, StoreResult};
use crate::telemetry::{EventSink, ReconciliationEvent};

/// Result of matching one movement, with per-tier failure bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// The match (Tier F when nothing resolved).
    pub result: MatchResult,
    /// Tiers that had the input they need and queried the store.
    pub attempted: usize,
    /// Tiers whose store lookup failed.
    pub failed: Vec<MatchTier>,
}

impl MatchOutcome {
    /// Returns true if tiers ran and every one of them failed.
    #[must_use]
    pub fn store_unreachable(&self) -> bool {
        self.attempted > 0 && self.failed.len() == self.attempted
    }
}

/// Resolves movements to members through the six-tier cascade.
pub struct IdentityMatcher<S> {
    store: Arc<S>,
    sink: Arc<dyn EventSink>,
}

impl<S: MemberRepository> IdentityMatcher<S> {
    /// Creates a new matcher.
    pub fn new(store: Arc<S>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    /// Runs the cascade; the first tier that resolves wins.
    ///
    /// Lookup failures degrade to "no match at this tier" and are reported
    /// to the sink; they never abort the cascade.
    pub async fn match_movement(&self, movement: &Movement) -> MatchOutcome {
        let mut roster: Option<Vec<Member>> = None;
        let mut attempted = 0;
        let mut failed = Vec::new();

        for tier in MatchTier::CASCADE {
            if !tiers::has_required_input(tier, movement) {
                continue;
            }
            attempted += 1;

            match self.run_tier(tier, movement, &mut roster).await {
                Ok(Some(result)) => {
                    tracing::debug!(
                        line = movement.line,
                        tier = tier.label(),
                        confidence = result.confidence,
                        "movement matched"
                    );
                    return MatchOutcome {
                        result,
                        attempted,
                        failed,
                    };
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        line = movement.line,
                        tier = tier.label(),
                        %error,
                        "tier lookup failed, continuing cascade"
                    );
                    self.sink.emit(&ReconciliationEvent::TierFailed {
                        tier,
                        line: movement.line,
                        error: error.to_string(),
                    });
                    failed.push(tier);
                }
            }
        }

        MatchOutcome {
            result: MatchResult::unmatched(unmatched_reason(attempted, failed.len())),
            attempted,
            failed,
        }
    }

    async fn run_tier(
        &self,
        tier: MatchTier,
        movement: &Movement,
        roster: &mut Option<Vec<Member>>,
    ) -> StoreResult<Option<MatchResult>> {
        let store = self.store.as_ref();
        match tier {
            MatchTier::Cuit => tiers::by_cuit(store, movement).await,
            MatchTier::Dni => tiers::by_dni(store, movement).await,
            MatchTier::CrossCheck => {
                if let Some(result) = tiers::by_cross_check(store, movement).await? {
                    return Ok(Some(result));
                }
                if movement.dni().is_none() {
                    return Ok(None);
                }
                let members = self.roster(roster).await?;
                Ok(tiers::by_cross_check_dni(movement, members))
            }
            MatchTier::FullName => {
                let members = self.roster(roster).await?;
                Ok(tiers::by_full_name(movement, members))
            }
            MatchTier::Surname => {
                let members = self.roster(roster).await?;
                Ok(tiers::by_surname(movement, members))
            }
            MatchTier::Keyword => tiers::by_keyword(store, movement).await,
            MatchTier::Unmatched => Ok(None),
        }
    }

    /// Active members, loaded at most once per movement.
    async fn roster<'a>(&self, cache: &'a mut Option<Vec<Member>>) -> StoreResult<&'a [Member]> {
        if cache.is_none() {
            *cache = Some(self.store.list_active_members().await?);
        }
        Ok(cache.as_deref().unwrap_or_default())
    }
}

fn unmatched_reason(attempted: usize, failed: usize) -> String {
    match (attempted, failed) {
        (0, _) => "no identifying data in description".to_string(),
        (a, f) if f == a => "member lookups failed".to_string(),
        (_, 0) => "no tier resolved a member".to_string(),
        (_, f) => format!("no tier resolved a member ({f} lookups failed)"),
    }
}

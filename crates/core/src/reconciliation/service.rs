//! Reconciliation service: statement analysis and payment confirmation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use amarra_shared::types::money::{is_positive_amount, round_cents};
use amarra_shared::types::{BankMovementId, InvoiceId, MemberId};
use tokio_util::sync::CancellationToken;

use super::error::ReconciliationError;
use super::locks::MemberLocks;
use super::types::{
    AnalyzedMovement, BatchFailure, BatchReport, ConfirmRequest, ConfirmationReceipt,
    DuplicateOf, ManualPayment, PaymentReceipt, StatementAnalysis,
};
use crate::allocation::PaymentAllocator;
use crate::credit::{CreditApplication, CreditSweep};
use crate::fingerprint::Fingerprint;
use crate::matching::{IdentityMatcher, MatchResult, ReviewBucket};
use crate::statement::parse_statement;
use crate::store::{
    BankMovementRecord, MovementLink, MovementStatus, NewBankMovement, NewPayment, PaymentMethod,
    ReconciliationStore, StoreError,
};
use crate::telemetry::{EventSink, ReconciliationEvent};

/// Orchestrates parsing, deduplication, matching and confirmation.
pub struct ReconciliationService<S> {
    store: Arc<S>,
    matcher: IdentityMatcher<S>,
    allocator: PaymentAllocator<S>,
    locks: MemberLocks,
    sink: Arc<dyn EventSink>,
}

impl<S: ReconciliationStore> ReconciliationService<S> {
    /// Creates a new reconciliation service.
    pub fn new(store: Arc<S>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            matcher: IdentityMatcher::new(Arc::clone(&store), Arc::clone(&sink)),
            allocator: PaymentAllocator::new(Arc::clone(&store), Arc::clone(&sink)),
            locks: MemberLocks::new(),
            store,
            sink,
        }
    }

    /// The allocator used for confirmations.
    pub fn allocator(&self) -> &PaymentAllocator<S> {
        &self.allocator
    }

    /// Parses a statement and sorts its movements into review buckets.
    ///
    /// Fingerprints are checked in one bulk query before any matching, so
    /// movements already processed (or repeated within the file) never reach
    /// the cascade. `progress` receives `(current, total, description)`.
    pub async fn analyze<F>(
        &self,
        raw: &str,
        mut progress: F,
    ) -> Result<StatementAnalysis, ReconciliationError>
    where
        F: FnMut(usize, usize, &str) + Send,
    {
        let parsed = parse_statement(raw);
        for skipped in &parsed.malformed {
            self.sink.emit(&ReconciliationEvent::LineSkipped {
                line: skipped.line,
                reason: skipped.reason.clone(),
            });
        }

        let fingerprints: Vec<Fingerprint> = parsed.movements.iter().map(Fingerprint::of).collect();
        let stored = self.stored_movements(&fingerprints).await?;

        let mut analysis = StatementAnalysis {
            malformed: parsed.malformed,
            discarded: parsed.discarded,
            ignored: parsed.ignored,
            ..StatementAnalysis::default()
        };
        let total = parsed.movements.len();
        let mut first_seen: HashMap<&Fingerprint, usize> = HashMap::new();
        let (mut attempted, mut failed) = (0usize, 0usize);

        for (index, (movement, fingerprint)) in parsed.movements.iter().zip(&fingerprints).enumerate() {
            progress(index + 1, total, &movement.description);

            let duplicate_of = stored
                .get(fingerprint)
                .map(|record| DuplicateOf::Stored {
                    movement_id: record.id,
                    payment_id: record.payment_id,
                })
                .or_else(|| {
                    first_seen
                        .get(fingerprint)
                        .map(|&first_line| DuplicateOf::Upload { first_line })
                });
            first_seen.entry(fingerprint).or_insert(movement.line);

            if let Some(duplicate_of) = duplicate_of {
                self.sink.emit(&ReconciliationEvent::DuplicateDetected {
                    line: movement.line,
                    fingerprint: fingerprint.clone(),
                });
                analysis.push(AnalyzedMovement {
                    movement: movement.clone(),
                    fingerprint: fingerprint.clone(),
                    result: MatchResult::unmatched("already processed"),
                    bucket: ReviewBucket::Duplicate,
                    duplicate_of: Some(duplicate_of),
                });
                continue;
            }

            let outcome = self.matcher.match_movement(movement).await;
            attempted += outcome.attempted;
            failed += outcome.failed.len();
            analysis.push(AnalyzedMovement {
                movement: movement.clone(),
                fingerprint: fingerprint.clone(),
                bucket: outcome.result.tier.bucket(),
                result: outcome.result,
                duplicate_of: None,
            });
        }

        if attempted > 0 && failed == attempted {
            return Err(ReconciliationError::StoreUnavailable(
                "every member lookup failed".to_string(),
            ));
        }

        tracing::info!(
            exact = analysis.exact.len(),
            probable = analysis.probable.len(),
            unmatched = analysis.unmatched.len(),
            duplicates = analysis.duplicates.len(),
            malformed = analysis.malformed.len(),
            discarded = analysis.discarded,
            "statement analyzed"
        );
        Ok(analysis)
    }

    async fn stored_movements(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<HashMap<Fingerprint, BankMovementRecord>, ReconciliationError> {
        if fingerprints.is_empty() {
            return Ok(HashMap::new());
        }
        let unique: Vec<Fingerprint> = fingerprints
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        let records = self
            .store
            .find_movements_by_fingerprints(&unique)
            .await
            .map_err(unavailable_or_store)?;
        Ok(records
            .into_iter()
            .map(|record| (record.fingerprint.clone(), record))
            .collect())
    }

    /// Confirms one movement as a bank-transfer payment of the chosen member
    /// and allocates it.
    ///
    /// Rejected with [`ReconciliationError::AlreadyProcessed`] when the
    /// fingerprint is stored with a linked payment. A stored movement without
    /// payment is reused, but only the confirmation that claims it may
    /// record a payment.
    pub async fn confirm(
        &self,
        request: ConfirmRequest,
    ) -> Result<ConfirmationReceipt, ReconciliationError> {
        let ConfirmRequest {
            movement,
            member_id,
            match_tier,
            confidence,
        } = request;

        let amount = round_cents(movement.amount);
        if !is_positive_amount(amount) {
            return Err(ReconciliationError::InvalidAmount(movement.amount));
        }
        let fingerprint = Fingerprint::of(&movement);

        let _guard = self.locks.lock(member_id).await;

        if self.store.get_member(member_id).await?.is_none() {
            return Err(ReconciliationError::MemberNotFound(member_id));
        }

        let movement_id = match self.find_unlinked(&fingerprint).await? {
            Some(id) => id,
            None => {
                let inserted = self
                    .store
                    .insert_movement(NewBankMovement {
                        fingerprint: fingerprint.clone(),
                        date: movement.date,
                        description: movement.description.clone(),
                        amount,
                        reference: movement.reference.clone(),
                        member_id: Some(member_id),
                        match_tier,
                        confidence,
                        status: MovementStatus::Pending,
                    })
                    .await;
                match inserted {
                    Ok(record) => record.id,
                    // Lost a race with another confirmation of the same movement.
                    Err(StoreError::Constraint(_)) => self
                        .find_unlinked(&fingerprint)
                        .await?
                        .ok_or_else(|| {
                            StoreError::Constraint(format!("movement {fingerprint} vanished"))
                        })?,
                    Err(other) => return Err(other.into()),
                }
            }
        };

        if !self.store.claim_movement(movement_id, member_id).await? {
            return Err(self.lost_claim(&fingerprint).await);
        }

        let inserted = self
            .store
            .insert_payment(NewPayment {
                member_id,
                amount,
                date: movement.date,
                method: PaymentMethod::BankTransfer,
                bank_movement_id: Some(movement_id),
                reconciled: true,
                notes: Some(movement.description.clone()),
            })
            .await;
        let payment = match inserted {
            Ok(payment) => payment,
            Err(error) => {
                if let Err(release) = self.store.release_movement(movement_id).await {
                    tracing::warn!(
                        %movement_id,
                        error = %release,
                        "could not release movement claim"
                    );
                }
                return Err(error.into());
            }
        };
        self.store
            .link_movement(
                movement_id,
                MovementLink {
                    member_id,
                    payment_id: payment.id,
                },
            )
            .await?;

        let allocation = self
            .allocator
            .allocate(payment.id, member_id, amount, movement.date)
            .await?;

        tracing::info!(
            %member_id,
            payment_id = %payment.id,
            %amount,
            applied = %allocation.total_applied(),
            overflow = %allocation.overflow,
            "movement confirmed"
        );
        Ok(ConfirmationReceipt {
            movement_id,
            payment_id: payment.id,
            member_id,
            allocation,
        })
    }

    /// Error for a confirmation that lost the claim on its movement.
    async fn lost_claim(&self, fingerprint: &Fingerprint) -> ReconciliationError {
        match self.find_unlinked(fingerprint).await {
            Ok(_) => ReconciliationError::ConfirmationInProgress(fingerprint.clone()),
            Err(error) => error,
        }
    }

    /// Stored movement with this fingerprint and no payment yet.
    async fn find_unlinked(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<BankMovementId>, ReconciliationError> {
        let existing = self
            .store
            .find_movements_by_fingerprints(std::slice::from_ref(fingerprint))
            .await?;
        match existing.into_iter().next() {
            Some(BankMovementRecord {
                payment_id: Some(payment_id),
                ..
            }) => Err(ReconciliationError::AlreadyProcessed {
                fingerprint: fingerprint.clone(),
                payment_id,
            }),
            Some(record) => Ok(Some(record.id)),
            None => Ok(None),
        }
    }

    /// Confirms movements one after another.
    ///
    /// A failed item is recorded and the batch moves on. Cancellation is
    /// checked before each item; confirmed items are never rolled back.
    pub async fn confirm_batch<F>(
        &self,
        requests: Vec<ConfirmRequest>,
        mut progress: F,
        cancel: &CancellationToken,
    ) -> BatchReport
    where
        F: FnMut(usize, usize, &str) + Send,
    {
        let mut report = BatchReport {
            total: requests.len(),
            ..BatchReport::default()
        };

        for (index, request) in requests.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(
                    confirmed = report.succeeded(),
                    remaining = report.total - index,
                    "batch confirmation cancelled"
                );
                report.cancelled = true;
                break;
            }
            let description = request.movement.description.clone();
            progress(index + 1, report.total, &description);

            match self.confirm(request).await {
                Ok(receipt) => report.confirmed.push(receipt),
                Err(error) => {
                    self.sink.emit(&ReconciliationEvent::ConfirmationFailed {
                        index,
                        error: error.to_string(),
                    });
                    report.failures.push(BatchFailure {
                        index,
                        description,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            total = report.total,
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "batch confirmation finished"
        );
        report
    }

    /// Registers a payment made outside the bank statement and allocates it.
    pub async fn record_payment(
        &self,
        payment: ManualPayment,
    ) -> Result<PaymentReceipt, ReconciliationError> {
        let amount = round_cents(payment.amount);
        if !is_positive_amount(amount) {
            return Err(ReconciliationError::InvalidAmount(payment.amount));
        }
        if payment.method == PaymentMethod::CreditApplied {
            return Err(ReconciliationError::UnsupportedMethod(payment.method));
        }

        let _guard = self.locks.lock(payment.member_id).await;

        if self.store.get_member(payment.member_id).await?.is_none() {
            return Err(ReconciliationError::MemberNotFound(payment.member_id));
        }

        let recorded = self
            .store
            .insert_payment(NewPayment {
                member_id: payment.member_id,
                amount,
                date: payment.date,
                method: payment.method,
                bank_movement_id: None,
                reconciled: false,
                notes: payment.notes,
            })
            .await?;
        let allocation = self
            .allocator
            .allocate(recorded.id, recorded.member_id, amount, recorded.date)
            .await?;

        tracing::info!(
            member_id = %recorded.member_id,
            payment_id = %recorded.id,
            method = %recorded.method,
            %amount,
            "manual payment recorded"
        );
        Ok(PaymentReceipt {
            payment: recorded,
            allocation,
        })
    }

    /// Applies any credit of the member to their open invoices under the member lock.
    pub async fn apply_member_credit(
        &self,
        member_id: MemberId,
    ) -> Result<CreditSweep, ReconciliationError> {
        let _guard = self.locks.lock(member_id).await;
        Ok(self
            .allocator
            .credit_ledger()
            .apply_credit_to_open_invoices(member_id)
            .await?)
    }

    /// Applies any credit of the member to one invoice under the member lock.
    pub async fn apply_invoice_credit(
        &self,
        invoice_id: InvoiceId,
        member_id: MemberId,
    ) -> Result<CreditApplication, ReconciliationError> {
        let _guard = self.locks.lock(member_id).await;
        Ok(self
            .allocator
            .credit_ledger()
            .apply_credit_to_invoice(invoice_id, member_id)
            .await?)
    }
}

fn unavailable_or_store(error: StoreError) -> ReconciliationError {
    if error.is_unavailable() {
        ReconciliationError::StoreUnavailable(error.to_string())
    } else {
        ReconciliationError::Store(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::MatchTier;
    use crate::statement::Movement;
    use crate::store::{
        FaultPoint, InMemoryStore, Invoice, InvoiceStatus, Member, MovementRepository,
    };
    use crate::telemetry::RecordingSink;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const STATEMENT: &str = "Ultimos Movimientos\n\
        Fecha\tSuc\tDesc Suc\tCod\tReferencia\tConcepto\tImporte\tSaldo\n\
        01/10/2025\t001\tCentro\t123\tA1\tTRANSFERENCIA RECIBIDA 20123456789\t30.000,00\t100.000,00\n\
        02/10/2025\t001\tCentro\t123\tA2\tTRANSFERENCIA RECIBIDA - GOMEZ MARIA\t25.000,00\t125.000,00\n\
        03/10/2025\t001\tCentro\t123\tA3\tTRANSFERENCIA RECIBIDA - ZZZ QQQ\t1.000,00\t126.000,00\n\
        03/10/2025\t001\tCentro\t456\t\tCOMISION MANTENIMIENTO\t-500,00\t125.500,00\n\
        01/10/2025\t001\tCentro\t123\tA1\tTRANSFERENCIA RECIBIDA 20123456789\t30.000,00\t100.000,00\n\
        04/10/2025\tbroken line\n";

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: ReconciliationService<InMemoryStore>,
        perez: Member,
        gomez: Member,
        invoice: Invoice,
    }

    fn member(surname: &str, given: &str, cuit: Option<&str>) -> Member {
        Member {
            id: MemberId::new(),
            surname: surname.into(),
            given_name: given.into(),
            cuit: cuit.map(String::from),
            dni: None,
            active: true,
        }
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let perez = member("PEREZ", "JUAN", Some("20-12345678-9"));
        let gomez = member("GOMEZ", "MARIA", None);
        let invoice = Invoice {
            id: InvoiceId::new(),
            member_id: perez.id,
            number: "F-2025-10".into(),
            period_year: 2025,
            period_month: 10,
            total: dec!(20000),
            due_date: NaiveDate::from_ymd_opt(2025, 10, 10).unwrap(),
            status: InvoiceStatus::Pending,
            paid_date: None,
        };
        store.add_member(perez.clone());
        store.add_member(gomez.clone());
        store.add_invoice(invoice.clone());
        let service = ReconciliationService::new(Arc::clone(&store), Arc::new(RecordingSink::new()));
        Fixture {
            store,
            service,
            perez,
            gomez,
            invoice,
        }
    }

    #[tokio::test]
    async fn test_analyze_buckets() {
        let fx = fixture();
        let mut calls = Vec::new();

        let analysis = fx
            .service
            .analyze(STATEMENT, |current, total, _| calls.push((current, total)))
            .await
            .unwrap();

        assert_eq!(analysis.exact.len(), 1);
        assert_eq!(analysis.exact[0].result.tier, MatchTier::Cuit);
        assert_eq!(analysis.exact[0].result.member_id, Some(fx.perez.id));
        assert_eq!(analysis.probable.len(), 1);
        assert_eq!(analysis.probable[0].result.member_id, Some(fx.gomez.id));
        assert_eq!(analysis.unmatched.len(), 1);
        assert_eq!(analysis.duplicates.len(), 1);
        assert_eq!(
            analysis.duplicates[0].duplicate_of,
            Some(DuplicateOf::Upload { first_line: 3 })
        );
        assert_eq!(analysis.malformed.len(), 1);
        assert_eq!(analysis.discarded, 1);
        assert_eq!(analysis.total_movements(), 4);
        assert_eq!(calls, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[tokio::test]
    async fn test_confirm_then_reject_reprocessing() {
        let fx = fixture();
        let analysis = fx.service.analyze(STATEMENT, |_, _, _| {}).await.unwrap();
        let request = ConfirmRequest::from_analyzed(&analysis.exact[0]).unwrap();

        let receipt = fx.service.confirm(request.clone()).await.unwrap();
        assert_eq!(receipt.member_id, fx.perez.id);
        assert_eq!(receipt.allocation.applied_to(fx.invoice.id), dec!(20000));
        assert_eq!(receipt.allocation.overflow, dec!(10000));
        assert_eq!(fx.store.credit(fx.perez.id).unwrap().amount, dec!(10000));
        assert_eq!(fx.store.invoice(fx.invoice.id).unwrap().status, InvoiceStatus::Paid);

        let movements = fx.store.movements();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].payment_id, Some(receipt.payment_id));
        assert_eq!(movements[0].status, MovementStatus::Confirmed);
        assert_eq!(movements[0].match_tier, Some(MatchTier::Cuit));
        let payments = fx.store.payments();
        assert_eq!(payments.len(), 1);
        assert!(payments[0].reconciled);
        assert_eq!(payments[0].bank_movement_id, Some(receipt.movement_id));

        let err = fx.service.confirm(request).await.unwrap_err();
        assert_eq!(
            err,
            ReconciliationError::AlreadyProcessed {
                fingerprint: analysis.exact[0].fingerprint.clone(),
                payment_id: receipt.payment_id,
            }
        );
        assert_eq!(fx.store.payments().len(), 1);

        let again = fx.service.analyze(STATEMENT, |_, _, _| {}).await.unwrap();
        assert!(again.exact.is_empty());
        assert!(again.duplicates.iter().any(|d| matches!(
            d.duplicate_of,
            Some(DuplicateOf::Stored { payment_id: Some(id), .. }) if id == receipt.payment_id
        )));
    }

    #[tokio::test]
    async fn test_claimed_movement_is_not_paid_twice() {
        let fx = fixture();
        let day = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let movement = Movement::new(day, "TRANSF PEREZ JUAN", dec!(15000), Some("R9".into()));
        let fingerprint = Fingerprint::of(&movement);

        // Another confirmation stored and claimed the movement but has not paid yet.
        let stored = fx
            .store
            .insert_movement(NewBankMovement {
                fingerprint: fingerprint.clone(),
                date: day,
                description: movement.description.clone(),
                amount: movement.amount,
                reference: movement.reference.clone(),
                member_id: Some(fx.perez.id),
                match_tier: None,
                confidence: 0,
                status: MovementStatus::Pending,
            })
            .await
            .unwrap();
        assert!(fx.store.claim_movement(stored.id, fx.perez.id).await.unwrap());

        let err = fx
            .service
            .confirm(ConfirmRequest::manual(movement.clone(), fx.gomez.id))
            .await
            .unwrap_err();
        assert_eq!(err, ReconciliationError::ConfirmationInProgress(fingerprint.clone()));
        assert_eq!(err.error_code(), "CONFIRMATION_IN_PROGRESS");
        assert!(fx.store.payments().is_empty());
        assert_eq!(fx.store.movements()[0].member_id, Some(fx.perez.id));

        let payment_id = amarra_shared::types::PaymentId::new();
        fx.store
            .link_movement(
                stored.id,
                MovementLink {
                    member_id: fx.perez.id,
                    payment_id,
                },
            )
            .await
            .unwrap();
        let err = fx
            .service
            .confirm(ConfirmRequest::manual(movement, fx.gomez.id))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ReconciliationError::AlreadyProcessed {
                fingerprint,
                payment_id,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_payment_releases_claim() {
        let fx = fixture();
        let day = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let movement = Movement::new(day, "TRANSF GOMEZ MARIA", dec!(5000), None);
        fx.store
            .fail(FaultPoint::PaymentWrites, StoreError::Unavailable("down".into()));

        let err = fx
            .service
            .confirm(ConfirmRequest::manual(movement.clone(), fx.gomez.id))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "STORE_UNAVAILABLE");
        let stored = fx.store.movements();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, MovementStatus::Pending);
        assert_eq!(stored[0].payment_id, None);

        fx.store.clear_faults();
        let receipt = fx
            .service
            .confirm(ConfirmRequest::manual(movement, fx.gomez.id))
            .await
            .unwrap();
        assert_eq!(fx.store.payments().len(), 1);
        assert_eq!(fx.store.movements()[0].payment_id, Some(receipt.payment_id));
    }

    #[tokio::test]
    async fn test_manual_assignment_of_unmatched() {
        let fx = fixture();
        let analysis = fx.service.analyze(STATEMENT, |_, _, _| {}).await.unwrap();
        assert!(ConfirmRequest::from_analyzed(&analysis.unmatched[0]).is_none());

        let request = ConfirmRequest::manual(analysis.unmatched[0].movement.clone(), fx.gomez.id);
        let receipt = fx.service.confirm(request).await.unwrap();

        assert_eq!(receipt.allocation.overflow, dec!(1000));
        assert_eq!(fx.store.movements()[0].match_tier, None);
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let fx = fixture();
        let analysis = fx.service.analyze(STATEMENT, |_, _, _| {}).await.unwrap();
        let mut requests = analysis.confirmable(true);
        requests.insert(
            0,
            ConfirmRequest::manual(analysis.unmatched[0].movement.clone(), MemberId::new()),
        );
        let mut seen = Vec::new();

        let report = fx
            .service
            .confirm_batch(
                requests,
                |current, total, message| seen.push((current, total, message.to_string())),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].index, 0);
        assert_eq!(report.failures[0].error.error_code(), "MEMBER_NOT_FOUND");
        assert!(!report.cancelled);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].0, 3);
    }

    #[tokio::test]
    async fn test_cancelled_batch_stops_before_next_item() {
        let fx = fixture();
        let analysis = fx.service.analyze(STATEMENT, |_, _, _| {}).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = fx
            .service
            .confirm_batch(analysis.confirmable(true), |_, _, _| {}, &cancel)
            .await;

        assert!(report.cancelled);
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.skipped(), 2);
        assert!(fx.store.payments().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_fails_when_every_lookup_fails() {
        let fx = fixture();
        let down = StoreError::Unavailable("connection refused".into());
        for point in [
            FaultPoint::CuitLookup,
            FaultPoint::DniLookup,
            FaultPoint::ActiveMembers,
            FaultPoint::KeywordLookup,
        ] {
            fx.store.fail(point, down.clone());
        }

        let err = fx.service.analyze(STATEMENT, |_, _, _| {}).await.unwrap_err();
        assert_eq!(err.error_code(), "STORE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_analyze_fails_when_dedupe_query_fails() {
        let fx = fixture();
        fx.store.fail(FaultPoint::MovementReads, StoreError::Unavailable("down".into()));

        let err = fx.service.analyze(STATEMENT, |_, _, _| {}).await.unwrap_err();
        assert!(matches!(err, ReconciliationError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_record_payment() {
        let fx = fixture();
        let date = NaiveDate::from_ymd_opt(2025, 10, 12).unwrap();
        let payment = |amount: Decimal, method: PaymentMethod| ManualPayment {
            member_id: fx.perez.id,
            amount,
            date,
            method,
            notes: Some("office".into()),
        };

        let err = fx
            .service
            .record_payment(payment(dec!(100), PaymentMethod::CreditApplied))
            .await
            .unwrap_err();
        assert_eq!(err, ReconciliationError::UnsupportedMethod(PaymentMethod::CreditApplied));
        let err = fx
            .service
            .record_payment(payment(Decimal::ZERO, PaymentMethod::Cash))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AMOUNT");

        let receipt = fx
            .service
            .record_payment(payment(dec!(5000), PaymentMethod::Cash))
            .await
            .unwrap();
        assert_eq!(receipt.payment.method, PaymentMethod::Cash);
        assert!(!receipt.payment.reconciled);
        assert_eq!(receipt.allocation.applied_to(fx.invoice.id), dec!(5000));
        assert_eq!(fx.store.invoice(fx.invoice.id).unwrap().status, InvoiceStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_confirmations_never_overapply() {
        let fx = fixture();
        let day = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let first = Movement::new(day, "TRANSF PEREZ JUAN", dec!(15000), Some("R1".into()));
        let second = Movement::new(day, "TRANSF PEREZ JUAN", dec!(15000), Some("R2".into()));

        let (a, b) = tokio::join!(
            fx.service.confirm(ConfirmRequest::manual(first, fx.perez.id)),
            fx.service.confirm(ConfirmRequest::manual(second, fx.perez.id)),
        );
        a.unwrap();
        b.unwrap();

        let applied: Decimal = fx
            .store
            .allocations()
            .iter()
            .filter(|a| a.invoice_id == fx.invoice.id)
            .map(|a| a.amount)
            .sum();
        assert_eq!(applied, dec!(20000));
        assert_eq!(fx.store.credit(fx.perez.id).unwrap().amount, dec!(10000));
    }
}

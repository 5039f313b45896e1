//! In-process store used by tests and dry runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use amarra_shared::types::{
    AllocationId, BankMovementId, InvoiceId, MemberId, PaymentId,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::{
    Allocation, AllocationRepository, BankMovementRecord, CreditRepository, Invoice,
    InvoiceRepository, InvoiceStatus, Member, MemberCredit, MemberKeyword, MemberRepository,
    MovementLink, MovementRepository, MovementStatus, NewAllocation, NewBankMovement, NewPayment,
    Payment, PaymentRepository, StoreError, StoreResult,
};
use crate::fingerprint::Fingerprint;
use crate::text::normalize_id;

/// Operation groups that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `find_members_by_cuit`.
    CuitLookup,
    /// `find_members_by_dni`.
    DniLookup,
    /// `list_active_members`.
    ActiveMembers,
    /// `find_keyword_by_cuit`.
    KeywordLookup,
    /// Invoice reads.
    InvoiceReads,
    /// `mark_invoice_paid`.
    InvoiceWrites,
    /// `insert_payment`.
    PaymentWrites,
    /// `insert_allocation`.
    AllocationWrites,
    /// `find_credit`.
    CreditReads,
    /// Credit inserts, updates and deletes.
    CreditWrites,
    /// `find_movements_by_fingerprints`.
    MovementReads,
    /// Movement inserts, claims and links.
    MovementWrites,
}

#[derive(Debug, Clone)]
struct Fault {
    passes: usize,
    error: StoreError,
}

#[derive(Debug, Default)]
struct MemoryState {
    members: Vec<Member>,
    keywords: Vec<MemberKeyword>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
    allocations: Vec<Allocation>,
    credits: HashMap<MemberId, MemberCredit>,
    movements: Vec<BankMovementRecord>,
}

/// A [`ReconciliationStore`](super::ReconciliationStore) held entirely in memory.
///
/// Faults can be armed per [`FaultPoint`] to exercise error paths.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    faults: Mutex<HashMap<FaultPoint, Fault>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, point: FaultPoint) -> StoreResult<()> {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        match faults.get_mut(&point) {
            None => Ok(()),
            Some(fault) if fault.passes > 0 => {
                fault.passes -= 1;
                Ok(())
            }
            Some(fault) => Err(fault.error.clone()),
        }
    }

    /// Makes every call at `point` fail with `error`.
    pub fn fail(&self, point: FaultPoint, error: StoreError) {
        self.fail_after(point, 0, error);
    }

    /// Lets `passes` calls at `point` succeed, then fails the rest with `error`.
    pub fn fail_after(&self, point: FaultPoint, passes: usize, error: StoreError) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(point, Fault { passes, error });
    }

    /// Disarms every fault.
    pub fn clear_faults(&self) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Adds a member.
    pub fn add_member(&self, member: Member) {
        self.state().members.push(member);
    }

    /// Adds a keyword alias.
    pub fn add_keyword(&self, keyword: MemberKeyword) {
        self.state().keywords.push(keyword);
    }

    /// Adds an invoice.
    pub fn add_invoice(&self, invoice: Invoice) {
        self.state().invoices.push(invoice);
    }

    /// Adds an already-recorded payment.
    pub fn add_payment(&self, payment: Payment) {
        self.state().payments.push(payment);
    }

    /// Adds an already-recorded allocation.
    pub fn add_allocation(&self, allocation: Allocation) {
        self.state().allocations.push(allocation);
    }

    /// Adds an already-stored movement.
    pub fn add_movement(&self, movement: BankMovementRecord) {
        self.state().movements.push(movement);
    }

    /// Current state of an invoice.
    pub fn invoice(&self, id: InvoiceId) -> Option<Invoice> {
        self.state().invoices.iter().find(|i| i.id == id).cloned()
    }

    /// Every recorded payment, in insertion order.
    pub fn payments(&self) -> Vec<Payment> {
        self.state().payments.clone()
    }

    /// Every recorded allocation, in insertion order.
    pub fn allocations(&self) -> Vec<Allocation> {
        self.state().allocations.clone()
    }

    /// Every stored movement, in insertion order.
    pub fn movements(&self) -> Vec<BankMovementRecord> {
        self.state().movements.clone()
    }

    /// Credit record of a member.
    pub fn credit(&self, member_id: MemberId) -> Option<MemberCredit> {
        self.state().credits.get(&member_id).cloned()
    }
}

fn id_matches(stored: Option<&str>, wanted: &str) -> bool {
    !wanted.is_empty() && stored.is_some_and(|s| normalize_id(s) == wanted)
}

impl MemberRepository for InMemoryStore {
    async fn find_members_by_cuit(&self, cuit: &str) -> StoreResult<Vec<Member>> {
        self.check(FaultPoint::CuitLookup)?;
        Ok(self
            .state()
            .members
            .iter()
            .filter(|m| id_matches(m.cuit.as_deref(), cuit))
            .cloned()
            .collect())
    }

    async fn find_members_by_dni(&self, dni: &str) -> StoreResult<Vec<Member>> {
        self.check(FaultPoint::DniLookup)?;
        Ok(self
            .state()
            .members
            .iter()
            .filter(|m| id_matches(m.dni.as_deref(), dni))
            .cloned()
            .collect())
    }

    async fn list_active_members(&self) -> StoreResult<Vec<Member>> {
        self.check(FaultPoint::ActiveMembers)?;
        Ok(self
            .state()
            .members
            .iter()
            .filter(|m| m.active)
            .cloned()
            .collect())
    }

    async fn get_member(&self, id: MemberId) -> StoreResult<Option<Member>> {
        Ok(self.state().members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_keyword_by_cuit(&self, cuit: &str) -> StoreResult<Option<MemberKeyword>> {
        self.check(FaultPoint::KeywordLookup)?;
        Ok(self
            .state()
            .keywords
            .iter()
            .find(|k| id_matches(k.cuit.as_deref(), cuit))
            .cloned())
    }
}

impl InvoiceRepository for InMemoryStore {
    async fn list_open_invoices(&self, member_id: MemberId) -> StoreResult<Vec<Invoice>> {
        self.check(FaultPoint::InvoiceReads)?;
        let mut open: Vec<Invoice> = self
            .state()
            .invoices
            .iter()
            .filter(|i| i.member_id == member_id && i.status.is_open())
            .cloned()
            .collect();
        open.sort_by_key(|i| i.due_date);
        Ok(open)
    }

    async fn list_member_invoices(&self, member_id: MemberId) -> StoreResult<Vec<Invoice>> {
        self.check(FaultPoint::InvoiceReads)?;
        Ok(self
            .state()
            .invoices
            .iter()
            .filter(|i| i.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        self.check(FaultPoint::InvoiceReads)?;
        Ok(self.state().invoices.iter().find(|i| i.id == id).cloned())
    }

    async fn mark_invoice_paid(&self, id: InvoiceId, paid_date: NaiveDate) -> StoreResult<()> {
        self.check(FaultPoint::InvoiceWrites)?;
        let mut state = self.state();
        let invoice = state
            .invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })?;
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_date = Some(paid_date);
        Ok(())
    }
}

impl PaymentRepository for InMemoryStore {
    async fn insert_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        self.check(FaultPoint::PaymentWrites)?;
        let record = Payment {
            id: PaymentId::new(),
            member_id: payment.member_id,
            amount: payment.amount,
            date: payment.date,
            method: payment.method,
            bank_movement_id: payment.bank_movement_id,
            reconciled: payment.reconciled,
            notes: payment.notes,
            created_at: Utc::now(),
        };
        self.state().payments.push(record.clone());
        Ok(record)
    }

    async fn list_member_payments(&self, member_id: MemberId) -> StoreResult<Vec<Payment>> {
        Ok(self
            .state()
            .payments
            .iter()
            .filter(|p| p.member_id == member_id)
            .cloned()
            .collect())
    }
}

impl AllocationRepository for InMemoryStore {
    async fn insert_allocation(&self, allocation: NewAllocation) -> StoreResult<Allocation> {
        self.check(FaultPoint::AllocationWrites)?;
        let record = Allocation {
            id: AllocationId::new(),
            payment_id: allocation.payment_id,
            invoice_id: allocation.invoice_id,
            amount: allocation.amount,
            created_at: Utc::now(),
        };
        self.state().allocations.push(record.clone());
        Ok(record)
    }

    async fn list_allocations_for_invoices(
        &self,
        invoice_ids: &[InvoiceId],
    ) -> StoreResult<Vec<Allocation>> {
        Ok(self
            .state()
            .allocations
            .iter()
            .filter(|a| invoice_ids.contains(&a.invoice_id))
            .cloned()
            .collect())
    }

    async fn list_allocations_for_payments(
        &self,
        payment_ids: &[PaymentId],
    ) -> StoreResult<Vec<Allocation>> {
        Ok(self
            .state()
            .allocations
            .iter()
            .filter(|a| payment_ids.contains(&a.payment_id))
            .cloned()
            .collect())
    }
}

impl CreditRepository for InMemoryStore {
    async fn find_credit(&self, member_id: MemberId) -> StoreResult<Option<MemberCredit>> {
        self.check(FaultPoint::CreditReads)?;
        Ok(self.state().credits.get(&member_id).cloned())
    }

    async fn insert_credit(&self, credit: MemberCredit) -> StoreResult<()> {
        self.check(FaultPoint::CreditWrites)?;
        let mut state = self.state();
        if state.credits.contains_key(&credit.member_id) {
            return Err(StoreError::Constraint(format!(
                "credit already exists for member {}",
                credit.member_id
            )));
        }
        state.credits.insert(credit.member_id, credit);
        Ok(())
    }

    async fn update_credit(
        &self,
        member_id: MemberId,
        amount: Decimal,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.check(FaultPoint::CreditWrites)?;
        let mut state = self.state();
        let credit = state
            .credits
            .get_mut(&member_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "member_credit",
                id: member_id.to_string(),
            })?;
        credit.amount = amount;
        credit.updated_at = updated_at;
        Ok(())
    }

    async fn delete_credit(&self, member_id: MemberId) -> StoreResult<()> {
        self.check(FaultPoint::CreditWrites)?;
        self.state().credits.remove(&member_id);
        Ok(())
    }
}

impl MovementRepository for InMemoryStore {
    async fn find_movements_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
    ) -> StoreResult<Vec<BankMovementRecord>> {
        self.check(FaultPoint::MovementReads)?;
        Ok(self
            .state()
            .movements
            .iter()
            .filter(|m| fingerprints.contains(&m.fingerprint))
            .cloned()
            .collect())
    }

    async fn insert_movement(&self, movement: NewBankMovement) -> StoreResult<BankMovementRecord> {
        self.check(FaultPoint::MovementWrites)?;
        let mut state = self.state();
        if state
            .movements
            .iter()
            .any(|m| m.fingerprint == movement.fingerprint)
        {
            return Err(StoreError::Constraint(format!(
                "duplicate movement fingerprint {}",
                movement.fingerprint
            )));
        }
        let record = BankMovementRecord {
            id: BankMovementId::new(),
            fingerprint: movement.fingerprint,
            date: movement.date,
            description: movement.description,
            amount: movement.amount,
            reference: movement.reference,
            member_id: movement.member_id,
            payment_id: None,
            match_tier: movement.match_tier,
            confidence: movement.confidence,
            status: movement.status,
            created_at: Utc::now(),
        };
        state.movements.push(record.clone());
        Ok(record)
    }

    async fn claim_movement(&self, id: BankMovementId, member_id: MemberId) -> StoreResult<bool> {
        self.check(FaultPoint::MovementWrites)?;
        let mut state = self.state();
        let Some(movement) = state.movements.iter_mut().find(|m| {
            m.id == id && m.status == MovementStatus::Pending && m.payment_id.is_none()
        }) else {
            return Ok(false);
        };
        movement.member_id = Some(member_id);
        movement.status = MovementStatus::Confirmed;
        Ok(true)
    }

    async fn release_movement(&self, id: BankMovementId) -> StoreResult<()> {
        self.check(FaultPoint::MovementWrites)?;
        let mut state = self.state();
        if let Some(movement) = state
            .movements
            .iter_mut()
            .find(|m| m.id == id && m.payment_id.is_none())
        {
            movement.status = MovementStatus::Pending;
        }
        Ok(())
    }

    async fn link_movement(&self, id: BankMovementId, link: MovementLink) -> StoreResult<()> {
        self.check(FaultPoint::MovementWrites)?;
        let mut state = self.state();
        let movement = state
            .movements
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "bank_movement",
                id: id.to_string(),
            })?;
        movement.member_id = Some(link.member_id);
        movement.payment_id = Some(link.payment_id);
        movement.status = MovementStatus::Confirmed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(cuit: Option<&str>, dni: Option<&str>) -> Member {
        Member {
            id: MemberId::new(),
            surname: "PEREZ".into(),
            given_name: "JUAN".into(),
            cuit: cuit.map(String::from),
            dni: dni.map(String::from),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_lookups_compare_normalized_ids() {
        let store = InMemoryStore::new();
        store.add_member(member(Some("20-12345678-9"), Some("12.345.678")));

        assert_eq!(store.find_members_by_cuit("20123456789").await.unwrap().len(), 1);
        assert_eq!(store.find_members_by_dni("12345678").await.unwrap().len(), 1);
        assert!(store.find_members_by_dni("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fault_after_passes() {
        let store = InMemoryStore::new();
        store.fail_after(
            FaultPoint::CuitLookup,
            1,
            StoreError::Unavailable("down".into()),
        );

        assert!(store.find_members_by_cuit("1").await.is_ok());
        let err = store.find_members_by_cuit("1").await.unwrap_err();
        assert!(err.is_unavailable());

        store.clear_faults();
        assert!(store.find_members_by_cuit("1").await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_fingerprint_rejected() {
        let store = InMemoryStore::new();
        let fingerprint = Fingerprint::from_hex(&"a".repeat(64)).unwrap();
        let movement = NewBankMovement {
            fingerprint,
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            description: "X".into(),
            amount: Decimal::ONE_HUNDRED,
            reference: None,
            member_id: None,
            match_tier: None,
            confidence: 0,
            status: MovementStatus::Pending,
        };
        store.insert_movement(movement.clone()).await.unwrap();
        let err = store.insert_movement(movement).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_until_released() {
        let store = InMemoryStore::new();
        let record = store
            .insert_movement(NewBankMovement {
                fingerprint: Fingerprint::from_hex(&"c".repeat(64)).unwrap(),
                date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
                description: "X".into(),
                amount: Decimal::ONE_HUNDRED,
                reference: None,
                member_id: None,
                match_tier: None,
                confidence: 0,
                status: MovementStatus::Pending,
            })
            .await
            .unwrap();
        let (first, second) = (MemberId::new(), MemberId::new());

        assert!(store.claim_movement(record.id, first).await.unwrap());
        assert!(!store.claim_movement(record.id, second).await.unwrap());
        assert_eq!(store.movements()[0].member_id, Some(first));

        store.release_movement(record.id).await.unwrap();
        assert_eq!(store.movements()[0].status, MovementStatus::Pending);
        assert!(store.claim_movement(record.id, second).await.unwrap());
    }
}

//! Persistence boundary of the reconciliation engine.
//!
//! Each concern gets its own repository trait, implemented by the db crate
//! against PostgreSQL and by [`InMemoryStore`] for tests and dry runs.
//! [`ReconciliationStore`] is the union every service is generic over.

mod error;
mod memory;
mod records;

pub use error::{StoreError, StoreResult};
pub use memory::{FaultPoint, InMemoryStore};
pub use records::*;

use std::future::Future;

use amarra_shared::types::{BankMovementId, InvoiceId, MemberId, PaymentId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::fingerprint::Fingerprint;

/// Member and keyword lookups.
pub trait MemberRepository: Send + Sync {
    /// Members whose normalized CUIT equals `cuit` (digits only).
    fn find_members_by_cuit(
        &self,
        cuit: &str,
    ) -> impl Future<Output = StoreResult<Vec<Member>>> + Send;

    /// Members whose normalized DNI equals `dni` (digits only).
    fn find_members_by_dni(
        &self,
        dni: &str,
    ) -> impl Future<Output = StoreResult<Vec<Member>>> + Send;

    /// All active members.
    fn list_active_members(&self) -> impl Future<Output = StoreResult<Vec<Member>>> + Send;

    /// Get a member by ID.
    fn get_member(
        &self,
        id: MemberId,
    ) -> impl Future<Output = StoreResult<Option<Member>>> + Send;

    /// Keyword alias bound to the normalized payer CUIT.
    fn find_keyword_by_cuit(
        &self,
        cuit: &str,
    ) -> impl Future<Output = StoreResult<Option<MemberKeyword>>> + Send;
}

/// Invoice reads and status updates.
pub trait InvoiceRepository: Send + Sync {
    /// Pending or overdue invoices of a member, ordered by due date.
    fn list_open_invoices(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = StoreResult<Vec<Invoice>>> + Send;

    /// Every invoice of a member, any status.
    fn list_member_invoices(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = StoreResult<Vec<Invoice>>> + Send;

    /// Get an invoice by ID.
    fn get_invoice(
        &self,
        id: InvoiceId,
    ) -> impl Future<Output = StoreResult<Option<Invoice>>> + Send;

    /// Set the invoice to paid with the given settlement date.
    fn mark_invoice_paid(
        &self,
        id: InvoiceId,
        paid_date: NaiveDate,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Payment writes and reads.
pub trait PaymentRepository: Send + Sync {
    /// Insert a payment.
    fn insert_payment(
        &self,
        payment: NewPayment,
    ) -> impl Future<Output = StoreResult<Payment>> + Send;

    /// Every payment of a member.
    fn list_member_payments(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = StoreResult<Vec<Payment>>> + Send;
}

/// Allocation writes and reads.
pub trait AllocationRepository: Send + Sync {
    /// Insert an allocation.
    fn insert_allocation(
        &self,
        allocation: NewAllocation,
    ) -> impl Future<Output = StoreResult<Allocation>> + Send;

    /// Allocations that target any of the given invoices.
    fn list_allocations_for_invoices(
        &self,
        invoice_ids: &[InvoiceId],
    ) -> impl Future<Output = StoreResult<Vec<Allocation>>> + Send;

    /// Allocations funded by any of the given payments.
    fn list_allocations_for_payments(
        &self,
        payment_ids: &[PaymentId],
    ) -> impl Future<Output = StoreResult<Vec<Allocation>>> + Send;
}

/// Member credit records, at most one per member.
pub trait CreditRepository: Send + Sync {
    /// Get the credit record of a member.
    fn find_credit(
        &self,
        member_id: MemberId,
    ) -> impl Future<Output = StoreResult<Option<MemberCredit>>> + Send;

    /// Insert a new credit record.
    fn insert_credit(
        &self,
        credit: MemberCredit,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrite the amount of an existing record.
    fn update_credit(
        &self,
        member_id: MemberId,
        amount: Decimal,
        updated_at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Delete the record of a member.
    fn delete_credit(&self, member_id: MemberId)
    -> impl Future<Output = StoreResult<()>> + Send;
}

/// Stored bank movements.
pub trait MovementRepository: Send + Sync {
    /// Stored movements whose fingerprint is in `fingerprints`.
    fn find_movements_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
    ) -> impl Future<Output = StoreResult<Vec<BankMovementRecord>>> + Send;

    /// Insert a movement. Fails with [`StoreError::Constraint`] on a duplicate fingerprint.
    fn insert_movement(
        &self,
        movement: NewBankMovement,
    ) -> impl Future<Output = StoreResult<BankMovementRecord>> + Send;

    /// Atomically claim a pending, unpaid movement for `member_id`.
    ///
    /// Returns `false` when another confirmation already holds it.
    fn claim_movement(
        &self,
        id: BankMovementId,
        member_id: MemberId,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Return a claimed movement that never got its payment to pending.
    fn release_movement(&self, id: BankMovementId)
    -> impl Future<Output = StoreResult<()>> + Send;

    /// Link a stored movement to its member and payment and mark it confirmed.
    fn link_movement(
        &self,
        id: BankMovementId,
        link: MovementLink,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Everything the reconciliation services need from persistence.
pub trait ReconciliationStore:
    MemberRepository
    + InvoiceRepository
    + PaymentRepository
    + AllocationRepository
    + CreditRepository
    + MovementRepository
{
}

impl<T> ReconciliationStore for T where
    T: MemberRepository
        + InvoiceRepository
        + PaymentRepository
        + AllocationRepository
        + CreditRepository
        + MovementRepository
{
}

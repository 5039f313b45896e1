//! Records persisted by the reconciliation engine.

use std::fmt;
use std::str::FromStr;

use amarra_shared::types::{
    AllocationId, BankMovementId, InvoiceId, KeywordId, MemberId, PaymentId,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;
use crate::matching::MatchTier;

/// A club member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member ID.
    pub id: MemberId,
    /// Surname (apellido).
    pub surname: String,
    /// Given name(s) (nombre).
    pub given_name: String,
    /// CUIT/CUIL, as stored (may carry hyphens).
    pub cuit: Option<String>,
    /// DNI, as stored (may carry dots).
    pub dni: Option<String>,
    /// Whether the member is active.
    pub active: bool,
}

impl Member {
    /// "Surname Given" for display.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.surname, self.given_name)
            .trim()
            .to_string()
    }
}

/// A manually curated alias for a member, bound to a payer CUIT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberKeyword {
    /// Keyword ID.
    pub id: KeywordId,
    /// Member the alias resolves to.
    pub member_id: MemberId,
    /// Free-form alias text.
    pub keyword: String,
    /// Payer CUIT the alias is looked up by.
    pub cuit: Option<String>,
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Stable storage representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("Unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

string_enum! {
    /// Lifecycle of an invoice.
    InvoiceStatus {
        /// Issued, not yet due.
        Pending => "pending",
        /// Past due and unpaid.
        Overdue => "overdue",
        /// Fully settled.
        Paid => "paid",
        /// Voided.
        Cancelled => "cancelled",
    }
}

impl InvoiceStatus {
    /// Returns true if the invoice can still receive allocations.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Overdue)
    }
}

string_enum! {
    /// How a payment was made.
    PaymentMethod {
        /// Bank transfer, usually confirmed from a statement.
        BankTransfer => "bank_transfer",
        /// Cash at the office.
        Cash => "cash",
        /// Cheque.
        Check => "check",
        /// Debit card.
        DebitCard => "debit_card",
        /// Credit card.
        CreditCard => "credit_card",
        /// Virtual payment created when stored credit is consumed.
        CreditApplied => "credit_applied",
    }
}

string_enum! {
    /// Processing state of a stored bank movement.
    MovementStatus {
        /// Stored but not yet linked to a payment.
        Pending => "pending",
        /// Claimed by a confirmation, then linked to its payment.
        Confirmed => "confirmed",
        /// Deliberately skipped by an operator.
        Ignored => "ignored",
    }
}

/// A monthly (or other periodic) invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Owning member.
    pub member_id: MemberId,
    /// Human-facing invoice number.
    pub number: String,
    /// Billing period year.
    pub period_year: i32,
    /// Billing period month (1-12).
    pub period_month: u32,
    /// Total amount billed.
    pub total: Decimal,
    /// Due date.
    pub due_date: NaiveDate,
    /// Current status.
    pub status: InvoiceStatus,
    /// Date the invoice became fully settled.
    pub paid_date: Option<NaiveDate>,
}

impl Invoice {
    /// First day of the billing period.
    #[must_use]
    pub fn period_start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.period_year, self.period_month, 1)
    }

    /// "MM/YYYY" label of the billing period.
    #[must_use]
    pub fn period_label(&self) -> String {
        format!("{:02}/{}", self.period_month, self.period_year)
    }
}

/// A payment to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Paying member.
    pub member_id: MemberId,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date.
    pub date: NaiveDate,
    /// Payment method.
    pub method: PaymentMethod,
    /// Bank movement the payment came from, if any.
    pub bank_movement_id: Option<BankMovementId>,
    /// Whether the payment is already reconciled against a bank movement.
    pub reconciled: bool,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Paying member.
    pub member_id: MemberId,
    /// Amount paid.
    pub amount: Decimal,
    /// Payment date.
    pub date: NaiveDate,
    /// Payment method.
    pub method: PaymentMethod,
    /// Source bank movement.
    pub bank_movement_id: Option<BankMovementId>,
    /// Reconciled flag.
    pub reconciled: bool,
    /// Notes.
    pub notes: Option<String>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// An allocation to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAllocation {
    /// Funding payment.
    pub payment_id: PaymentId,
    /// Receiving invoice.
    pub invoice_id: InvoiceId,
    /// Amount applied.
    pub amount: Decimal,
}

/// Part of a payment applied to one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Allocation ID.
    pub id: AllocationId,
    /// Funding payment.
    pub payment_id: PaymentId,
    /// Receiving invoice.
    pub invoice_id: InvoiceId,
    /// Amount applied.
    pub amount: Decimal,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// Stored overpayment balance for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCredit {
    /// Owning member (one record per member).
    pub member_id: MemberId,
    /// Credit amount, always positive while the record exists.
    pub amount: Decimal,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// A bank movement to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBankMovement {
    /// Content fingerprint, unique across stored movements.
    pub fingerprint: Fingerprint,
    /// Movement date.
    pub date: NaiveDate,
    /// Raw description.
    pub description: String,
    /// Amount received.
    pub amount: Decimal,
    /// Bank reference.
    pub reference: Option<String>,
    /// Matched member.
    pub member_id: Option<MemberId>,
    /// Tier that produced the match.
    pub match_tier: Option<MatchTier>,
    /// Match confidence.
    pub confidence: u8,
    /// Initial status.
    pub status: MovementStatus,
}

/// A stored bank movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankMovementRecord {
    /// Movement ID.
    pub id: BankMovementId,
    /// Content fingerprint.
    pub fingerprint: Fingerprint,
    /// Movement date.
    pub date: NaiveDate,
    /// Raw description.
    pub description: String,
    /// Amount received.
    pub amount: Decimal,
    /// Bank reference.
    pub reference: Option<String>,
    /// Matched member.
    pub member_id: Option<MemberId>,
    /// Payment created from this movement.
    pub payment_id: Option<PaymentId>,
    /// Match tier.
    pub match_tier: Option<MatchTier>,
    /// Match confidence.
    pub confidence: u8,
    /// Status.
    pub status: MovementStatus,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// Link between a stored movement and the payment it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementLink {
    /// Matched member.
    pub member_id: MemberId,
    /// Created payment.
    pub payment_id: PaymentId,
}

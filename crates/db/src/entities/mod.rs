//! `SeaORM` entity definitions.

pub mod bank_movements;
pub mod invoices;
pub mod member_credits;
pub mod member_keywords;
pub mod members;
pub mod payment_allocations;
pub mod payments;

pub mod prelude {
    //! Entity aliases.

    pub use super::bank_movements::Entity as BankMovements;
    pub use super::invoices::Entity as Invoices;
    pub use super::member_credits::Entity as MemberCredits;
    pub use super::member_keywords::Entity as MemberKeywords;
    pub use super::members::Entity as Members;
    pub use super::payment_allocations::Entity as PaymentAllocations;
    pub use super::payments::Entity as Payments;
}

//! `SeaORM` Entity for members table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub surname: String,
    pub given_name: String,
    pub cuit: Option<String>,
    pub dni: Option<String>,
    /// Generated column: `cuit` with every non-digit removed.
    pub cuit_digits: Option<String>,
    /// Generated column: `dni` with every non-digit removed.
    pub dni_digits: Option<String>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::member_keywords::Entity")]
    MemberKeywords,
    #[sea_orm(has_one = "super::member_credits::Entity")]
    MemberCredits,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::member_keywords::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberKeywords.def()
    }
}

impl Related<super::member_credits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MemberCredits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! The single credit row per member.

use amarra_core::store::{CreditRepository, MemberCredit, StoreResult};
use amarra_shared::types::MemberId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use super::{PgStore, ensure_updated, store_err};
use crate::entities::member_credits;

fn to_credit(model: member_credits::Model) -> MemberCredit {
    MemberCredit {
        member_id: MemberId::from_uuid(model.member_id),
        amount: model.amount,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

impl CreditRepository for PgStore {
    async fn find_credit(&self, member_id: MemberId) -> StoreResult<Option<MemberCredit>> {
        let row = member_credits::Entity::find_by_id(member_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(row.map(to_credit))
    }

    async fn insert_credit(&self, credit: MemberCredit) -> StoreResult<()> {
        let model = member_credits::ActiveModel {
            member_id: Set(credit.member_id.into_inner()),
            amount: Set(credit.amount),
            updated_at: Set(credit.updated_at.fixed_offset()),
        };
        member_credits::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn update_credit(
        &self,
        member_id: MemberId,
        amount: Decimal,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = member_credits::Entity::update_many()
            .col_expr(member_credits::Column::Amount, Expr::value(amount))
            .col_expr(
                member_credits::Column::UpdatedAt,
                Expr::value(updated_at.fixed_offset()),
            )
            .filter(member_credits::Column::MemberId.eq(member_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        ensure_updated(result.rows_affected, "member_credit", member_id)
    }

    async fn delete_credit(&self, member_id: MemberId) -> StoreResult<()> {
        member_credits::Entity::delete_many()
            .filter(member_credits::Column::MemberId.eq(member_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_credit_maps_row() {
        let member_id = MemberId::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![member_credits::Model {
                member_id: member_id.into_inner(),
                amount: dec!(5000.00),
                updated_at: Utc::now().fixed_offset(),
            }]])
            .into_connection();
        let store = PgStore::new(db);

        let credit = store.find_credit(member_id).await.unwrap().unwrap();
        assert_eq!(credit.member_id, member_id);
        assert_eq!(credit.amount, dec!(5000.00));
    }

    #[tokio::test]
    async fn test_update_missing_credit_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();
        let store = PgStore::new(db);

        let err = store
            .update_credit(MemberId::new(), dec!(100), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "STORE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_absent_credit_is_ok() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();
        let store = PgStore::new(db);

        assert!(store.delete_credit(MemberId::new()).await.is_ok());
    }
}

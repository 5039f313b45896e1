//! Payment-to-invoice allocation rows.

use amarra_core::store::{Allocation, AllocationRepository, NewAllocation, StoreResult};
use amarra_shared::types::{AllocationId, InvoiceId, PaymentId};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use super::{PgStore, store_err};
use crate::entities::payment_allocations;

fn to_allocation(model: payment_allocations::Model) -> Allocation {
    Allocation {
        id: AllocationId::from_uuid(model.id),
        payment_id: PaymentId::from_uuid(model.payment_id),
        invoice_id: InvoiceId::from_uuid(model.invoice_id),
        amount: model.amount,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

impl AllocationRepository for PgStore {
    async fn insert_allocation(&self, allocation: NewAllocation) -> StoreResult<Allocation> {
        let model = payment_allocations::ActiveModel {
            id: Set(AllocationId::new().into_inner()),
            payment_id: Set(allocation.payment_id.into_inner()),
            invoice_id: Set(allocation.invoice_id.into_inner()),
            amount: Set(allocation.amount),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(store_err)?;

        Ok(to_allocation(model))
    }

    async fn list_allocations_for_invoices(
        &self,
        invoice_ids: &[InvoiceId],
    ) -> StoreResult<Vec<Allocation>> {
        if invoice_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = payment_allocations::Entity::find()
            .filter(
                payment_allocations::Column::InvoiceId
                    .is_in(invoice_ids.iter().map(|id| id.into_inner())),
            )
            .order_by_asc(payment_allocations::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(to_allocation).collect())
    }

    async fn list_allocations_for_payments(
        &self,
        payment_ids: &[PaymentId],
    ) -> StoreResult<Vec<Allocation>> {
        if payment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = payment_allocations::Entity::find()
            .filter(
                payment_allocations::Column::PaymentId
                    .is_in(payment_ids.iter().map(|id| id.into_inner())),
            )
            .order_by_asc(payment_allocations::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(to_allocation).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_empty_id_set_skips_query() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let store = PgStore::new(db);

        assert!(store.list_allocations_for_invoices(&[]).await.unwrap().is_empty());
        assert!(store.list_allocations_for_payments(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_allocations_for_invoices_maps_rows() {
        let invoice_id = Uuid::now_v7();
        let stored = payment_allocations::Model {
            id: Uuid::now_v7(),
            payment_id: Uuid::now_v7(),
            invoice_id,
            amount: dec!(30000.00),
            created_at: Utc::now().fixed_offset(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored.clone()]])
            .into_connection();
        let store = PgStore::new(db);

        let rows = store
            .list_allocations_for_invoices(&[InvoiceId::from_uuid(invoice_id)])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].invoice_id.into_inner(), invoice_id);
        assert_eq!(rows[0].amount, dec!(30000.00));
    }
}

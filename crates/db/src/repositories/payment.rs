//! Payment writes and reads.

use amarra_core::store::{NewPayment, Payment, PaymentMethod, PaymentRepository, StoreResult};
use amarra_shared::types::{BankMovementId, MemberId, PaymentId};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use super::{PgStore, decode_err, store_err};
use crate::entities::payments;

fn to_payment(model: payments::Model) -> StoreResult<Payment> {
    let method = model
        .method
        .parse::<PaymentMethod>()
        .map_err(|e| decode_err("payments.method", e))?;
    Ok(Payment {
        id: PaymentId::from_uuid(model.id),
        member_id: MemberId::from_uuid(model.member_id),
        amount: model.amount,
        date: model.payment_date,
        method,
        bank_movement_id: model.bank_movement_id.map(BankMovementId::from_uuid),
        reconciled: model.reconciled,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

impl PaymentRepository for PgStore {
    async fn insert_payment(&self, payment: NewPayment) -> StoreResult<Payment> {
        let model = payments::ActiveModel {
            id: Set(PaymentId::new().into_inner()),
            member_id: Set(payment.member_id.into_inner()),
            amount: Set(payment.amount),
            payment_date: Set(payment.date),
            method: Set(payment.method.as_str().to_string()),
            bank_movement_id: Set(payment.bank_movement_id.map(BankMovementId::into_inner)),
            reconciled: Set(payment.reconciled),
            notes: Set(payment.notes),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(store_err)?;

        to_payment(model)
    }

    async fn list_member_payments(&self, member_id: MemberId) -> StoreResult<Vec<Payment>> {
        payments::Entity::find()
            .filter(payments::Column::MemberId.eq(member_id.into_inner()))
            .order_by_asc(payments::Column::PaymentDate)
            .order_by_asc(payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(to_payment)
            .collect()
    }
}

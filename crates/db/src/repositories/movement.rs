//! Stored bank movements, keyed by content fingerprint.
//!
//! The unique index on `fingerprint` turns a concurrent second insert of the
//! same movement into `StoreError::Constraint`. Claiming is a conditional
//! update, so only one confirmation can move a row out of `pending`.

use amarra_core::fingerprint::Fingerprint;
use amarra_core::matching::MatchTier;
use amarra_core::store::{
    BankMovementRecord, MovementLink, MovementRepository, MovementStatus, NewBankMovement,
    StoreResult,
};
use amarra_shared::types::{BankMovementId, MemberId, PaymentId};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use super::{PgStore, decode_err, ensure_updated, store_err};
use crate::entities::bank_movements;

fn to_record(model: bank_movements::Model) -> StoreResult<BankMovementRecord> {
    let fingerprint = Fingerprint::from_hex(&model.fingerprint)
        .ok_or_else(|| decode_err("bank_movements.fingerprint", &model.fingerprint))?;
    let match_tier = model
        .match_tier
        .as_deref()
        .map(str::parse::<MatchTier>)
        .transpose()
        .map_err(|e| decode_err("bank_movements.match_tier", e))?;
    let status = model
        .status
        .parse::<MovementStatus>()
        .map_err(|e| decode_err("bank_movements.status", e))?;
    let confidence =
        u8::try_from(model.confidence).map_err(|e| decode_err("bank_movements.confidence", e))?;

    Ok(BankMovementRecord {
        id: BankMovementId::from_uuid(model.id),
        fingerprint,
        date: model.movement_date,
        description: model.description,
        amount: model.amount,
        reference: model.reference,
        member_id: model.member_id.map(MemberId::from_uuid),
        payment_id: model.payment_id.map(PaymentId::from_uuid),
        match_tier,
        confidence,
        status,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

impl MovementRepository for PgStore {
    async fn find_movements_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
    ) -> StoreResult<Vec<BankMovementRecord>> {
        if fingerprints.is_empty() {
            return Ok(Vec::new());
        }
        bank_movements::Entity::find()
            .filter(
                bank_movements::Column::Fingerprint
                    .is_in(fingerprints.iter().map(|f| f.as_str().to_owned())),
            )
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(to_record)
            .collect()
    }

    async fn insert_movement(&self, movement: NewBankMovement) -> StoreResult<BankMovementRecord> {
        let model = bank_movements::ActiveModel {
            id: Set(BankMovementId::new().into_inner()),
            fingerprint: Set(movement.fingerprint.as_str().to_owned()),
            movement_date: Set(movement.date),
            description: Set(movement.description),
            amount: Set(movement.amount),
            reference: Set(movement.reference),
            member_id: Set(movement.member_id.map(MemberId::into_inner)),
            payment_id: Set(None),
            match_tier: Set(movement.match_tier.map(|t| t.as_str().to_owned())),
            confidence: Set(i16::from(movement.confidence)),
            status: Set(movement.status.as_str().to_owned()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(store_err)?;

        to_record(model)
    }

    async fn claim_movement(&self, id: BankMovementId, member_id: MemberId) -> StoreResult<bool> {
        let result = bank_movements::Entity::update_many()
            .col_expr(
                bank_movements::Column::MemberId,
                Expr::value(member_id.into_inner()),
            )
            .col_expr(
                bank_movements::Column::Status,
                Expr::value(MovementStatus::Confirmed.as_str()),
            )
            .filter(bank_movements::Column::Id.eq(id.into_inner()))
            .filter(bank_movements::Column::Status.eq(MovementStatus::Pending.as_str()))
            .filter(bank_movements::Column::PaymentId.is_null())
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn release_movement(&self, id: BankMovementId) -> StoreResult<()> {
        bank_movements::Entity::update_many()
            .col_expr(
                bank_movements::Column::Status,
                Expr::value(MovementStatus::Pending.as_str()),
            )
            .filter(bank_movements::Column::Id.eq(id.into_inner()))
            .filter(bank_movements::Column::PaymentId.is_null())
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn link_movement(&self, id: BankMovementId, link: MovementLink) -> StoreResult<()> {
        let result = bank_movements::Entity::update_many()
            .col_expr(
                bank_movements::Column::MemberId,
                Expr::value(link.member_id.into_inner()),
            )
            .col_expr(
                bank_movements::Column::PaymentId,
                Expr::value(link.payment_id.into_inner()),
            )
            .col_expr(
                bank_movements::Column::Status,
                Expr::value(MovementStatus::Confirmed.as_str()),
            )
            .filter(bank_movements::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        ensure_updated(result.rows_affected, "bank_movement", id)
    }
}

//! Invoice reads and settlement updates.

use amarra_core::store::{Invoice, InvoiceRepository, InvoiceStatus, StoreResult};
use amarra_shared::types::{InvoiceId, MemberId};
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use super::{PgStore, decode_err, ensure_updated, store_err};
use crate::entities::invoices;

const OPEN_STATUSES: [InvoiceStatus; 2] = [InvoiceStatus::Pending, InvoiceStatus::Overdue];

fn to_invoice(model: invoices::Model) -> StoreResult<Invoice> {
    let status = model
        .status
        .parse::<InvoiceStatus>()
        .map_err(|e| decode_err("invoices.status", e))?;
    let period_month =
        u32::try_from(model.period_month).map_err(|e| decode_err("invoices.period_month", e))?;
    Ok(Invoice {
        id: InvoiceId::from_uuid(model.id),
        member_id: MemberId::from_uuid(model.member_id),
        number: model.number,
        period_year: model.period_year,
        period_month,
        total: model.total,
        due_date: model.due_date,
        status,
        paid_date: model.paid_date,
    })
}

fn to_invoices(rows: Vec<invoices::Model>) -> StoreResult<Vec<Invoice>> {
    rows.into_iter().map(to_invoice).collect()
}

impl InvoiceRepository for PgStore {
    async fn list_open_invoices(&self, member_id: MemberId) -> StoreResult<Vec<Invoice>> {
        let rows = invoices::Entity::find()
            .filter(invoices::Column::MemberId.eq(member_id.into_inner()))
            .filter(invoices::Column::Status.is_in(OPEN_STATUSES.map(InvoiceStatus::as_str)))
            .order_by_asc(invoices::Column::DueDate)
            .order_by_asc(invoices::Column::Number)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        to_invoices(rows)
    }

    async fn list_member_invoices(&self, member_id: MemberId) -> StoreResult<Vec<Invoice>> {
        let rows = invoices::Entity::find()
            .filter(invoices::Column::MemberId.eq(member_id.into_inner()))
            .order_by_asc(invoices::Column::DueDate)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        to_invoices(rows)
    }

    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        invoices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(to_invoice)
            .transpose()
    }

    async fn mark_invoice_paid(&self, id: InvoiceId, paid_date: NaiveDate) -> StoreResult<()> {
        let result = invoices::Entity::update_many()
            .col_expr(
                invoices::Column::Status,
                Expr::value(InvoiceStatus::Paid.as_str()),
            )
            .col_expr(invoices::Column::PaidDate, Expr::value(paid_date))
            .filter(invoices::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        ensure_updated(result.rows_affected, "invoice", id)
    }
}

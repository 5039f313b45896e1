//! Command handlers.

use std::path::Path;
use std::sync::Arc;

use amarra_core::reconciliation::{ManualPayment, ReconciliationService};
use amarra_core::store::PaymentMethod;
use amarra_core::telemetry::TracingSink;
use amarra_core::timeline::TimelineService;
use amarra_db::PgStore;
use amarra_shared::types::{InvoiceId, MemberId};
use amarra_shared::{AppConfig, AppError};
use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::render;

/// Services wired against the configured database.
pub struct Context {
    service: ReconciliationService<PgStore>,
    timelines: TimelineService<PgStore>,
    json: bool,
}

impl Context {
    pub async fn connect(config: &AppConfig, json: bool) -> anyhow::Result<Self> {
        let db = amarra_db::connect(&config.database)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
            .context("connecting to database")?;
        info!("Connected to database");

        let store = Arc::new(PgStore::new(db));
        Ok(Self {
            service: ReconciliationService::new(Arc::clone(&store), Arc::new(TracingSink)),
            timelines: TimelineService::new(store),
            json,
        })
    }

    fn print(&self, text: String, json: impl FnOnce() -> anyhow::Result<String>) -> anyhow::Result<()> {
        let out = if self.json { json()? } else { text };
        println!("{out}");
        Ok(())
    }
}

async fn read_statement(path: &Path) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    // Bank exports are not always valid UTF-8.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn log_progress(current: usize, total: usize, message: &str) {
    tracing::debug!(current, total, message, "progress");
}

pub async fn analyze(ctx: &Context, path: &Path) -> anyhow::Result<()> {
    let raw = read_statement(path).await?;
    let analysis = ctx
        .service
        .analyze(&raw, log_progress)
        .await
        .map_err(AppError::from)?;

    ctx.print(render::analysis(&analysis), || render::json(&analysis))
}

pub async fn confirm(ctx: &Context, path: &Path, include_probable: bool) -> anyhow::Result<()> {
    let raw = read_statement(path).await?;
    let analysis = ctx
        .service
        .analyze(&raw, log_progress)
        .await
        .map_err(AppError::from)?;
    eprintln!("{}", render::analysis(&analysis));

    let requests = analysis.confirmable(include_probable);
    if requests.is_empty() {
        println!("Nothing to confirm.");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling after the current movement...");
            on_signal.cancel();
        }
    });

    let report = ctx
        .service
        .confirm_batch(
            requests,
            |current, total, description| eprintln!("[{current}/{total}] {description}"),
            &cancel,
        )
        .await;
    watcher.abort();

    println!("{}", render::batch(&report));
    Ok(())
}

pub async fn timeline(ctx: &Context, member_id: MemberId) -> anyhow::Result<()> {
    let timeline = ctx
        .timelines
        .member_timeline(member_id)
        .await
        .map_err(AppError::from)?;

    ctx.print(render::timeline(&timeline), || render::json(&timeline))
}

pub async fn credit(ctx: &Context, member_id: MemberId) -> anyhow::Result<()> {
    let balance = ctx
        .service
        .allocator()
        .credit_ledger()
        .get_credit(member_id)
        .await;

    ctx.print(render::credit_balance(member_id, balance), || {
        render::json(&serde_json::json!({
            "member_id": member_id,
            "credit": balance,
        }))
    })
}

pub async fn apply_credit(
    ctx: &Context,
    member_id: MemberId,
    invoice_id: Option<InvoiceId>,
) -> anyhow::Result<()> {
    match invoice_id {
        Some(invoice_id) => {
            let application = ctx
                .service
                .apply_invoice_credit(invoice_id, member_id)
                .await
                .map_err(AppError::from)?;
            ctx.print(render::credit_application(&application), || {
                render::json(&application)
            })
        }
        None => {
            let sweep = ctx
                .service
                .apply_member_credit(member_id)
                .await
                .map_err(AppError::from)?;
            ctx.print(render::credit_sweep(&sweep), || render::json(&sweep))
        }
    }
}

pub async fn pay(
    ctx: &Context,
    member_id: MemberId,
    amount: Decimal,
    method: PaymentMethod,
    date: Option<NaiveDate>,
    notes: Option<String>,
) -> anyhow::Result<()> {
    let receipt = ctx
        .service
        .record_payment(ManualPayment {
            member_id,
            amount,
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            method,
            notes,
        })
        .await
        .map_err(AppError::from)?;

    ctx.print(render::payment_receipt(&receipt), || render::json(&receipt))
}

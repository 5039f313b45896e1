//! Initial database migration.
//!
//! Creates the member roster, invoices, payments, allocations, credits and
//! stored bank movements used by the reconciliation engine.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: MEMBERS
        // ============================================================
        db.execute_unprepared(MEMBERS_SQL).await?;
        db.execute_unprepared(MEMBER_KEYWORDS_SQL).await?;

        // ============================================================
        // PART 2: BILLING
        // ============================================================
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(BANK_MOVEMENTS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(PAYMENT_ALLOCATIONS_SQL).await?;
        db.execute_unprepared(MEMBER_CREDITS_SQL).await?;

        // ============================================================
        // PART 3: CROSS REFERENCES & TRIGGERS
        // ============================================================
        db.execute_unprepared(MOVEMENT_PAYMENT_FK_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const MEMBERS_SQL: &str = r"
CREATE TABLE members (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    surname VARCHAR(120) NOT NULL,
    given_name VARCHAR(120) NOT NULL DEFAULT '',
    cuit VARCHAR(20),
    dni VARCHAR(12),
    cuit_digits VARCHAR(20) GENERATED ALWAYS AS (regexp_replace(cuit, '\D', '', 'g')) STORED,
    dni_digits VARCHAR(12) GENERATED ALWAYS AS (regexp_replace(dni, '\D', '', 'g')) STORED,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_members_cuit_digits ON members(cuit_digits) WHERE cuit_digits IS NOT NULL;
CREATE INDEX idx_members_dni_digits ON members(dni_digits) WHERE dni_digits IS NOT NULL;
CREATE INDEX idx_members_active ON members(active) WHERE active;
";

const MEMBER_KEYWORDS_SQL: &str = r"
-- Curated payer aliases, looked up by CUIT only
CREATE TABLE member_keywords (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    member_id UUID NOT NULL REFERENCES members(id) ON DELETE CASCADE,
    keyword VARCHAR(200) NOT NULL,
    cuit VARCHAR(20),
    cuit_digits VARCHAR(20) GENERATED ALWAYS AS (regexp_replace(cuit, '\D', '', 'g')) STORED,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_member_keywords_cuit_digits ON member_keywords(cuit_digits)
    WHERE cuit_digits IS NOT NULL;
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    member_id UUID NOT NULL REFERENCES members(id) ON DELETE RESTRICT,
    number VARCHAR(40) NOT NULL,
    period_year INTEGER NOT NULL,
    period_month SMALLINT NOT NULL CHECK (period_month BETWEEN 1 AND 12),
    total NUMERIC(14, 2) NOT NULL CHECK (total >= 0),
    due_date DATE NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'overdue', 'paid', 'cancelled')),
    paid_date DATE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_invoices_number UNIQUE (number),
    CONSTRAINT chk_invoices_paid_date CHECK (status <> 'paid' OR paid_date IS NOT NULL)
);

CREATE INDEX idx_invoices_member_due ON invoices(member_id, due_date);
CREATE INDEX idx_invoices_open ON invoices(member_id, due_date)
    WHERE status IN ('pending', 'overdue');
";

const BANK_MOVEMENTS_SQL: &str = r"
CREATE TABLE bank_movements (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    fingerprint CHAR(64) NOT NULL,
    movement_date DATE NOT NULL,
    description TEXT NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    reference VARCHAR(60),
    member_id UUID REFERENCES members(id) ON DELETE SET NULL,
    payment_id UUID,
    match_tier VARCHAR(16)
        CHECK (match_tier IN ('cuit', 'dni', 'cross_check', 'full_name', 'surname', 'keyword', 'unmatched')),
    confidence SMALLINT NOT NULL DEFAULT 0 CHECK (confidence BETWEEN 0 AND 100),
    status VARCHAR(16) NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'confirmed', 'ignored')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_bank_movements_fingerprint UNIQUE (fingerprint)
);

CREATE INDEX idx_bank_movements_member ON bank_movements(member_id) WHERE member_id IS NOT NULL;
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    member_id UUID NOT NULL REFERENCES members(id) ON DELETE RESTRICT,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    payment_date DATE NOT NULL,
    method VARCHAR(20) NOT NULL
        CHECK (method IN ('bank_transfer', 'cash', 'check', 'debit_card', 'credit_card', 'credit_applied')),
    bank_movement_id UUID REFERENCES bank_movements(id) ON DELETE SET NULL,
    reconciled BOOLEAN NOT NULL DEFAULT FALSE,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_payments_member_date ON payments(member_id, payment_date);
";

const PAYMENT_ALLOCATIONS_SQL: &str = r"
CREATE TABLE payment_allocations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payment_id UUID NOT NULL REFERENCES payments(id) ON DELETE CASCADE,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE RESTRICT,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_payment_allocations_invoice ON payment_allocations(invoice_id);
CREATE INDEX idx_payment_allocations_payment ON payment_allocations(payment_id);
";

const MEMBER_CREDITS_SQL: &str = r"
CREATE TABLE member_credits (
    member_id UUID PRIMARY KEY REFERENCES members(id) ON DELETE CASCADE,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const MOVEMENT_PAYMENT_FK_SQL: &str = r"
ALTER TABLE bank_movements
    ADD CONSTRAINT fk_bank_movements_payment
    FOREIGN KEY (payment_id) REFERENCES payments(id) ON DELETE SET NULL;
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_members_updated_at
    BEFORE UPDATE ON members
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_invoices_updated_at
    BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS member_credits CASCADE;
DROP TABLE IF EXISTS payment_allocations CASCADE;
DROP TABLE IF EXISTS bank_movements CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS member_keywords CASCADE;
DROP TABLE IF EXISTS members CASCADE;
DROP FUNCTION IF EXISTS touch_updated_at();
";

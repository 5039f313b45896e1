//! Statement movement types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::text::{DescriptionTokens, extract_tokens};

/// Classification of a surviving statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Incoming transfer credited to the club account.
    ReceivedTransfer,
}

/// One incoming transfer parsed from a statement.
///
/// Movements are never mutated after parsing; they live in memory until
/// confirmed (persisted as a bank movement record) or discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// 1-based line number in the source file (0 if built by hand).
    pub line: usize,
    /// Value date of the movement.
    pub date: NaiveDate,
    /// Free-text bank description.
    pub description: String,
    /// Credited amount, strictly positive.
    pub amount: Decimal,
    /// Bank reference, if the export carried one.
    pub reference: Option<String>,
    /// Movement classification.
    pub kind: MovementKind,
    /// Identity hints extracted from the description.
    pub tokens: DescriptionTokens,
}

impl Movement {
    /// Builds a received-transfer movement, extracting identity hints.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        amount: Decimal,
        reference: Option<String>,
    ) -> Self {
        let description = description.into();
        let tokens = extract_tokens(&description);
        Self {
            line: 0,
            date,
            description,
            amount,
            reference,
            kind: MovementKind::ReceivedTransfer,
            tokens,
        }
    }

    /// Sets the source line number.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Extracted CUIT/CUIL, digits only.
    #[must_use]
    pub fn cuit(&self) -> Option<&str> {
        self.tokens.cuit.as_deref()
    }

    /// Extracted DNI, digits only.
    #[must_use]
    pub fn dni(&self) -> Option<&str> {
        self.tokens.dni.as_deref()
    }

    /// Extracted surname.
    #[must_use]
    pub fn surname(&self) -> Option<&str> {
        self.tokens.surname.as_deref()
    }

    /// Extracted given names.
    #[must_use]
    pub fn given_name(&self) -> Option<&str> {
        self.tokens.given_name.as_deref()
    }
}

/// A data line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    /// Why the line was skipped.
    pub reason: String,
    /// The raw line content.
    pub content: String,
}

/// Result of parsing one statement file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStatement {
    /// Incoming transfers, in file order.
    pub movements: Vec<Movement>,
    /// Data lines that were malformed.
    pub malformed: Vec<SkippedLine>,
    /// Debit, fee and tax lines that were filtered out.
    pub discarded: usize,
    /// Blank, header, footer and timestamp lines.
    pub ignored: usize,
}

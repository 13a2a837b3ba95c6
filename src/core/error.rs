use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{CompanyId, InvoiceId, InvoiceStatus};

/// Errors that can occur while operating the ledger.
///
/// Integrity errors (sequence, chain race exhaustion, rounding, balance)
/// always fail closed: the operation produces no partial output and leaves
/// stored data untouched. Chain *tampering* is not an error: it is
/// reported through [`crate::chain::ChainVerification`] so auditors can
/// act on it without the system auto-repairing history.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// One or more validation rules failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Invoice not found in the store.
    #[error("invoice {0} not found")]
    NotFound(InvoiceId),

    /// Company not registered with the ledger.
    #[error("company {0} not registered")]
    CompanyNotFound(CompanyId),

    /// An id was inserted twice.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Operation attempted in the wrong lifecycle state, including
    /// re-finalizing a finalized invoice and mutating a sealed one.
    #[error("invoice {id} is {actual:?}, operation requires {required:?}")]
    Status {
        id: InvoiceId,
        actual: InvoiceStatus,
        required: InvoiceStatus,
    },

    /// The sequence counter disagrees with the state derived from the
    /// finalized invoices themselves. Fatal: implies a bug or external
    /// tampering with the counter, so allocation fails closed rather than
    /// skipping or reusing a number.
    #[error("sequence integrity violation: {0}")]
    SequenceIntegrity(String),

    /// The chain tip moved under a finalization more times than the retry
    /// budget allows.
    #[error("chain tip moved {attempts} times during finalization, giving up")]
    ChainRace { attempts: u32 },

    /// Stored totals disagree with a zero-tolerance recomputation from the
    /// lines at finalize time. Indicates a computation bug, not user error.
    #[error("rounding mismatch on {field}: stored {stored}, recomputed {computed}")]
    RoundingMismatch {
        field: &'static str,
        stored: Decimal,
        computed: Decimal,
    },

    /// The year's journal does not balance; no export file is produced.
    #[error("journal for fiscal year {fiscal_year} is unbalanced by {imbalance}")]
    Unbalanced {
        fiscal_year: i32,
        imbalance: Decimal,
    },

    /// The export deadline elapsed before the file was fully rendered;
    /// nothing is emitted rather than a partial file.
    #[error("export deadline exceeded after {rows} rows")]
    DeadlineExceeded { rows: usize },
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "lines[2].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// French legal reference if applicable (e.g. "289 CGI").
    pub article: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(article) = &self.article {
            write!(f, "[art. {}] {}: {}", article, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a legal reference.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            article: None,
        }
    }

    /// Create a validation error citing a legal article.
    pub fn with_article(
        field: impl Into<String>,
        message: impl Into<String>,
        article: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            article: Some(article.into()),
        }
    }
}

/// Collapse a non-empty validation error list into a [`LedgerError`].
pub(crate) fn validation_failure(errors: &[ValidationError]) -> LedgerError {
    let msg = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    LedgerError::Validation(msg)
}

//! Storage interface for the ledger.
//!
//! The core never holds ambient connection state: every component works
//! against this trait, injected into [`crate::ledger::Ledger`]. The single
//! write that must be atomic — allocating the next sequence number and
//! appending the chained invoice — is expressed as a compare-and-swap
//! commit against an explicitly read chain tip, so a transactional backend
//! can map it to one transaction and the in-memory backend to one critical
//! section.

use chrono::NaiveDate;
use thiserror::Error;

use crate::core::{
    Company, CompanyId, DunningStatus, Expense, Invoice, InvoiceId, InvoiceStatus, LedgerError,
};

/// Snapshot of a company/fiscal-year chain head, read before a finalize
/// attempt and re-checked by the store at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    /// Persisted sequence counter (last allocated value; 0 when empty).
    pub counter: u64,
    /// Count of finalized invoices derived from the invoices themselves.
    /// Must equal `counter`: a disagreement means the counter was
    /// tampered with or a write was lost, and allocation fails closed.
    pub finalized: u64,
    /// Digest of the last finalized invoice, or the genesis constant.
    pub tip_hash: String,
}

impl ChainTip {
    /// Sequence number the next finalized invoice will take.
    pub fn next_sequence(&self) -> u64 {
        self.counter + 1
    }
}

/// Why an atomic finalize commit was refused.
#[derive(Debug, Error)]
pub enum CommitError {
    /// Another writer advanced the tip between read and commit. The caller
    /// re-reads the tip and retries with the updated prior hash.
    #[error("chain tip moved since it was read")]
    TipMoved,

    /// The store's counter and its derived state disagree; nothing was
    /// written.
    #[error("sequence integrity violation: {0}")]
    Integrity(String),

    /// Commit-time storage failure unrelated to the CAS.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Repository abstraction over invoices, companies, counters and expenses.
///
/// Reads return point-in-time snapshots (owned values); they may run fully
/// in parallel with each other and with finalizations of other companies.
pub trait LedgerStore: Send + Sync {
    fn upsert_company(&self, company: Company);
    fn company(&self, id: &CompanyId) -> Option<Company>;

    /// Insert a draft. Fails on duplicate id.
    fn insert_draft(&self, invoice: Invoice) -> Result<(), LedgerError>;

    /// Replace a draft's row. Fails unless the stored row is still a draft.
    fn replace_draft(&self, invoice: Invoice) -> Result<(), LedgerError>;

    /// Delete a draft. Finalized invoices are never deleted.
    fn delete_draft(&self, id: &InvoiceId) -> Result<(), LedgerError>;

    fn invoice(&self, id: &InvoiceId) -> Option<Invoice>;

    /// All invoices of a company, in unspecified order.
    fn invoices(&self, company: &CompanyId) -> Vec<Invoice>;

    /// Finalized (sealed) invoices of one company/fiscal year, ordered by
    /// sequence number.
    fn finalized(&self, company: &CompanyId, fiscal_year: i32) -> Vec<Invoice>;

    /// Read the chain head for a company/fiscal year.
    fn chain_tip(&self, company: &CompanyId, fiscal_year: i32) -> Result<ChainTip, LedgerError>;

    /// Atomically: verify `expected` still matches the stored head,
    /// increment the sequence counter, and append the sealed invoice.
    /// This is the only mutation of the counter, and the only path that
    /// turns a draft into a chained record.
    fn commit_finalized(
        &self,
        company: &CompanyId,
        fiscal_year: i32,
        expected: &ChainTip,
        invoice: Invoice,
    ) -> Result<(), CommitError>;

    /// Update status and payment date of a sealed invoice. A transition to
    /// [`InvoiceStatus::Paid`] also resets the dunning fields, atomically
    /// with the status flip.
    fn set_status(
        &self,
        id: &InvoiceId,
        status: InvoiceStatus,
        paid_on: Option<NaiveDate>,
    ) -> Result<(), LedgerError>;

    /// Compare-and-set the dunning fields of a sealed invoice. Returns
    /// `false` without writing when the stored state no longer matches
    /// `expected`: a concurrent sweep updated the invoice first, and the
    /// caller must not act on it as well.
    fn set_dunning(
        &self,
        id: &InvoiceId,
        expected: &DunningStatus,
        new: DunningStatus,
    ) -> Result<bool, LedgerError>;

    /// Record an expense. Fails on duplicate id.
    fn record_expense(&self, expense: Expense) -> Result<(), LedgerError>;

    /// All expenses of a company, in unspecified order.
    fn expenses(&self, company: &CompanyId) -> Vec<Expense>;
}

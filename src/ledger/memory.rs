//! In-memory reference implementation of [`LedgerStore`].
//!
//! A single `RwLock` serializes writes; `commit_finalized` performs the
//! whole check-allocate-append sequence inside one write guard, which is
//! what makes two concurrent finalize calls for the same company serialize
//! instead of interleave. A SQL-backed store would supply the same
//! contract with one transaction per commit.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::chain;
use crate::core::{
    Company, CompanyId, DunningStatus, Expense, ExpenseId, Invoice, InvoiceId, InvoiceStatus,
    LedgerError,
};

use super::store::{ChainTip, CommitError, LedgerStore};

#[derive(Default)]
struct State {
    companies: HashMap<CompanyId, Company>,
    invoices: HashMap<InvoiceId, Invoice>,
    /// The only mutable counter: last allocated sequence per
    /// (company, fiscal year).
    counters: HashMap<(CompanyId, i32), u64>,
    expenses: HashMap<ExpenseId, Expense>,
}

impl State {
    /// Sealed invoices of one company/fiscal year, ordered by sequence.
    fn finalized(&self, company: &CompanyId, fiscal_year: i32) -> Vec<Invoice> {
        let Some(cfg) = self.companies.get(company) else {
            return Vec::new();
        };
        let mut rows: Vec<Invoice> = self
            .invoices
            .values()
            .filter(|inv| {
                inv.company_id == *company
                    && inv.status.is_sealed()
                    && cfg.fiscal_year_of(inv.issue_date) == fiscal_year
            })
            .cloned()
            .collect();
        rows.sort_by_key(|inv| inv.sequence);
        rows
    }

    fn tip(&self, company: &CompanyId, fiscal_year: i32) -> Result<ChainTip, LedgerError> {
        if !self.companies.contains_key(company) {
            return Err(LedgerError::CompanyNotFound(company.clone()));
        }
        let counter = self
            .counters
            .get(&(company.clone(), fiscal_year))
            .copied()
            .unwrap_or(0);
        let finalized = self.finalized(company, fiscal_year);
        let tip_hash = finalized
            .last()
            .and_then(|inv| inv.self_hash.clone())
            .unwrap_or_else(|| chain::genesis_hash(company, fiscal_year));
        Ok(ChainTip {
            counter,
            finalized: finalized.len() as u64,
            tip_hash,
        })
    }
}

/// In-memory store. Cloneable handles are obtained by wrapping it in an
/// `Arc`; all methods take `&self`.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn upsert_company(&self, company: Company) {
        let mut state = self.state.write().expect("store lock poisoned");
        state.companies.insert(company.id.clone(), company);
    }

    fn company(&self, id: &CompanyId) -> Option<Company> {
        let state = self.state.read().expect("store lock poisoned");
        state.companies.get(id).cloned()
    }

    fn insert_draft(&self, invoice: Invoice) -> Result<(), LedgerError> {
        let mut state = self.state.write().expect("store lock poisoned");
        if state.invoices.contains_key(&invoice.id) {
            return Err(LedgerError::DuplicateId(invoice.id.to_string()));
        }
        state.invoices.insert(invoice.id.clone(), invoice);
        Ok(())
    }

    fn replace_draft(&self, invoice: Invoice) -> Result<(), LedgerError> {
        let mut state = self.state.write().expect("store lock poisoned");
        let stored = state
            .invoices
            .get(&invoice.id)
            .ok_or_else(|| LedgerError::NotFound(invoice.id.clone()))?;
        if stored.status != InvoiceStatus::Draft {
            return Err(LedgerError::Status {
                id: invoice.id.clone(),
                actual: stored.status,
                required: InvoiceStatus::Draft,
            });
        }
        state.invoices.insert(invoice.id.clone(), invoice);
        Ok(())
    }

    fn delete_draft(&self, id: &InvoiceId) -> Result<(), LedgerError> {
        let mut state = self.state.write().expect("store lock poisoned");
        let stored = state
            .invoices
            .get(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        if stored.status != InvoiceStatus::Draft {
            return Err(LedgerError::Status {
                id: id.clone(),
                actual: stored.status,
                required: InvoiceStatus::Draft,
            });
        }
        state.invoices.remove(id);
        Ok(())
    }

    fn invoice(&self, id: &InvoiceId) -> Option<Invoice> {
        let state = self.state.read().expect("store lock poisoned");
        state.invoices.get(id).cloned()
    }

    fn invoices(&self, company: &CompanyId) -> Vec<Invoice> {
        let state = self.state.read().expect("store lock poisoned");
        state
            .invoices
            .values()
            .filter(|inv| inv.company_id == *company)
            .cloned()
            .collect()
    }

    fn finalized(&self, company: &CompanyId, fiscal_year: i32) -> Vec<Invoice> {
        let state = self.state.read().expect("store lock poisoned");
        state.finalized(company, fiscal_year)
    }

    fn chain_tip(&self, company: &CompanyId, fiscal_year: i32) -> Result<ChainTip, LedgerError> {
        let state = self.state.read().expect("store lock poisoned");
        state.tip(company, fiscal_year)
    }

    fn commit_finalized(
        &self,
        company: &CompanyId,
        fiscal_year: i32,
        expected: &ChainTip,
        invoice: Invoice,
    ) -> Result<(), CommitError> {
        let mut state = self.state.write().expect("store lock poisoned");

        let current = state.tip(company, fiscal_year)?;
        if current.counter != current.finalized {
            return Err(CommitError::Integrity(format!(
                "counter {} disagrees with {} finalized invoices for {} fiscal year {}",
                current.counter, current.finalized, company, fiscal_year
            )));
        }
        if current != *expected {
            return Err(CommitError::TipMoved);
        }
        if invoice.sequence != Some(current.next_sequence()) {
            return Err(CommitError::Integrity(format!(
                "invoice carries sequence {:?}, counter expects {}",
                invoice.sequence,
                current.next_sequence()
            )));
        }

        state
            .counters
            .insert((company.clone(), fiscal_year), current.next_sequence());
        state.invoices.insert(invoice.id.clone(), invoice);
        Ok(())
    }

    fn set_status(
        &self,
        id: &InvoiceId,
        status: InvoiceStatus,
        paid_on: Option<NaiveDate>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().expect("store lock poisoned");
        let stored = state
            .invoices
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        stored.status = status;
        if paid_on.is_some() {
            stored.paid_on = paid_on;
        }
        if status == InvoiceStatus::Paid {
            stored.dunning = DunningStatus::default();
        }
        Ok(())
    }

    fn set_dunning(
        &self,
        id: &InvoiceId,
        expected: &DunningStatus,
        new: DunningStatus,
    ) -> Result<bool, LedgerError> {
        let mut state = self.state.write().expect("store lock poisoned");
        let stored = state
            .invoices
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        if stored.dunning != *expected {
            return Ok(false);
        }
        stored.dunning = new;
        Ok(true)
    }

    fn record_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut state = self.state.write().expect("store lock poisoned");
        if state.expenses.contains_key(&expense.id) {
            return Err(LedgerError::DuplicateId(expense.id.to_string()));
        }
        state.expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    fn expenses(&self, company: &CompanyId) -> Vec<Expense> {
        let state = self.state.read().expect("store lock poisoned");
        state
            .expenses
            .values()
            .filter(|e| e.company_id == *company)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClientRef, DraftBuilder, InvoiceLine, VatRate};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(id: &str) -> Invoice {
        DraftBuilder::new(id, "acme", date(2024, 6, 15))
            .client(ClientRef::new("c-1", "Dupont SARL"))
            .due_date(date(2024, 7, 15))
            .add_line(InvoiceLine::new(
                "Conseil",
                dec!(1),
                dec!(100),
                VatRate::Standard,
            ))
            .build()
            .unwrap()
    }

    fn store_with_company() -> MemoryStore {
        let store = MemoryStore::new();
        store.upsert_company(Company::new("acme", "ACME SARL"));
        store
    }

    #[test]
    fn empty_tip_is_genesis() {
        let store = store_with_company();
        let tip = store.chain_tip(&"acme".into(), 2024).unwrap();
        assert_eq!(tip.counter, 0);
        assert_eq!(tip.finalized, 0);
        assert_eq!(tip.tip_hash, chain::genesis_hash(&"acme".into(), 2024));
    }

    #[test]
    fn duplicate_draft_id_rejected() {
        let store = store_with_company();
        store.insert_draft(draft("inv-1")).unwrap();
        assert!(matches!(
            store.insert_draft(draft("inv-1")),
            Err(LedgerError::DuplicateId(_))
        ));
    }

    #[test]
    fn commit_rejects_stale_tip() {
        let store = store_with_company();
        store.insert_draft(draft("inv-1")).unwrap();

        let tip = store.chain_tip(&"acme".into(), 2024).unwrap();
        let mut sealed = draft("inv-2");
        sealed.status = InvoiceStatus::Finalized;
        sealed.sequence = Some(1);
        sealed.prev_hash = Some(tip.tip_hash.clone());
        sealed.self_hash = Some("abc".into());

        store
            .commit_finalized(&"acme".into(), 2024, &tip, sealed.clone())
            .unwrap();

        // Same expected tip again: must be refused, not overwrite.
        let mut second = draft("inv-3");
        second.status = InvoiceStatus::Finalized;
        second.sequence = Some(1);
        second.prev_hash = Some(tip.tip_hash.clone());
        second.self_hash = Some("def".into());
        assert!(matches!(
            store.commit_finalized(&"acme".into(), 2024, &tip, second),
            Err(CommitError::TipMoved)
        ));
    }

    #[test]
    fn commit_rejects_wrong_sequence() {
        let store = store_with_company();
        let tip = store.chain_tip(&"acme".into(), 2024).unwrap();
        let mut sealed = draft("inv-1");
        sealed.status = InvoiceStatus::Finalized;
        sealed.sequence = Some(7);
        assert!(matches!(
            store.commit_finalized(&"acme".into(), 2024, &tip, sealed),
            Err(CommitError::Integrity(_))
        ));
    }

    #[test]
    fn sealed_rows_cannot_be_replaced_or_deleted() {
        let store = store_with_company();
        let tip = store.chain_tip(&"acme".into(), 2024).unwrap();
        let mut sealed = draft("inv-1");
        sealed.status = InvoiceStatus::Finalized;
        sealed.sequence = Some(1);
        sealed.prev_hash = Some(tip.tip_hash.clone());
        sealed.self_hash = Some("abc".into());
        store
            .commit_finalized(&"acme".into(), 2024, &tip, sealed)
            .unwrap();

        assert!(matches!(
            store.replace_draft(draft("inv-1")),
            Err(LedgerError::Status { .. })
        ));
        assert!(matches!(
            store.delete_draft(&"inv-1".into()),
            Err(LedgerError::Status { .. })
        ));
    }
}

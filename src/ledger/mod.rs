//! The ledger facade — the narrow interface the surrounding system talks to.
//!
//! Everything date-dependent takes the date explicitly; the core never
//! reads the clock, so every operation is deterministic and replayable.

mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{ChainTip, CommitError, LedgerStore};

use chrono::NaiveDate;
use tracing::{instrument, warn};

use crate::chain::{self, ChainVerification};
use crate::core::{
    Company, CompanyId, DraftUpdate, Expense, Invoice, InvoiceId, InvoiceStatus, LedgerError,
    NumberingScheme, Totals, amounts, validate_draft, validation_failure,
};

#[cfg(feature = "dunning")]
use crate::dunning::{self, DunningConfig, ReminderOutcome, SweepReport};
#[cfg(feature = "journal")]
use crate::journal::{self, ChartOfAccounts, JournalEntry, MonthlyAggregate};

/// Bounded retry budget for the finalize compare-and-swap loop. Contention
/// on one company's tip is short-lived; exhausting this budget indicates
/// something other than ordinary contention.
const MAX_FINALIZE_ATTEMPTS: u32 = 5;

/// What the caller gets back from a successful finalization.
#[derive(Debug, Clone)]
pub struct FinalizeReceipt {
    pub invoice_id: InvoiceId,
    /// Assigned external number, e.g. "INV-2024-000001".
    pub number: String,
    /// Assigned gapless sequence within the company/fiscal year.
    pub sequence: u64,
    /// Chain digest sealing the invoice.
    pub hash: String,
    pub totals: Totals,
}

/// The invoicing ledger over an injected store.
pub struct Ledger<S> {
    store: S,
    numbering: NumberingScheme,
    max_attempts: u32,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            numbering: NumberingScheme::default(),
            max_attempts: MAX_FINALIZE_ATTEMPTS,
        }
    }

    pub fn with_numbering(mut self, scheme: NumberingScheme) -> Self {
        self.numbering = scheme;
        self
    }

    /// Direct access to the store, for snapshot reads the facade does not
    /// wrap.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn register_company(&self, company: Company) {
        self.store.upsert_company(company);
    }

    /// Insert a validated draft. Drafts never touch the sequence counter
    /// and carry no identifier in the numbering domain.
    pub fn create_draft(&self, draft: Invoice) -> Result<InvoiceId, LedgerError> {
        if draft.status != InvoiceStatus::Draft {
            return Err(LedgerError::Status {
                id: draft.id.clone(),
                actual: draft.status,
                required: InvoiceStatus::Draft,
            });
        }
        if self.store.company(&draft.company_id).is_none() {
            return Err(LedgerError::CompanyNotFound(draft.company_id.clone()));
        }
        let id = draft.id.clone();
        self.store.insert_draft(draft)?;
        Ok(id)
    }

    /// Apply a mutation to a draft, recomputing its totals.
    pub fn update_draft(&self, id: &InvoiceId, update: DraftUpdate) -> Result<(), LedgerError> {
        let mut invoice = self
            .store
            .invoice(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(LedgerError::Status {
                id: id.clone(),
                actual: invoice.status,
                required: InvoiceStatus::Draft,
            });
        }
        update.apply(&mut invoice);
        self.store.replace_draft(invoice)
    }

    /// Delete a draft. Finalized invoices can never be deleted; a hole in
    /// the chain would itself read as tampering.
    pub fn delete_draft(&self, id: &InvoiceId) -> Result<(), LedgerError> {
        self.store.delete_draft(id)
    }

    pub fn invoice(&self, id: &InvoiceId) -> Result<Invoice, LedgerError> {
        self.store
            .invoice(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    /// Finalize a draft: atomically allocate the next gapless sequence
    /// number, seal the content with a chain digest against the current
    /// tip, and commit. Exactly-once: a second call on the same invoice
    /// fails with a status error instead of silently succeeding.
    ///
    /// Concurrent finalizations of the same company/fiscal year serialize
    /// through the store's compare-and-swap: the loser of a race re-reads
    /// the moved tip and retries with the updated prior hash, bounded by
    /// the retry budget.
    #[instrument(name = "facture.ledger.finalize", skip(self), err)]
    pub fn finalize(&self, id: &InvoiceId, on: NaiveDate) -> Result<FinalizeReceipt, LedgerError> {
        let mut attempts = 0;
        loop {
            let invoice = self
                .store
                .invoice(id)
                .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
            if invoice.status != InvoiceStatus::Draft {
                return Err(LedgerError::Status {
                    id: id.clone(),
                    actual: invoice.status,
                    required: InvoiceStatus::Draft,
                });
            }

            let company = self
                .store
                .company(&invoice.company_id)
                .ok_or_else(|| LedgerError::CompanyNotFound(invoice.company_id.clone()))?;

            let errors = validate_draft(&invoice);
            if !errors.is_empty() {
                return Err(validation_failure(&errors));
            }
            // Stored totals must re-derive exactly from the lines before
            // they are sealed into the chain.
            amounts::verify_totals(&invoice)?;

            let fiscal_year = company.fiscal_year_of(invoice.issue_date);
            let tip = self.store.chain_tip(&company.id, fiscal_year)?;
            if tip.counter != tip.finalized {
                return Err(LedgerError::SequenceIntegrity(format!(
                    "counter {} disagrees with {} finalized invoices for {} fiscal year {}",
                    tip.counter, tip.finalized, company.id, fiscal_year
                )));
            }

            let sequence = tip.next_sequence();
            let mut sealed = invoice;
            sealed.status = InvoiceStatus::Finalized;
            sealed.sequence = Some(sequence);
            sealed.number = Some(self.numbering.format(fiscal_year, sequence));
            sealed.prev_hash = Some(tip.tip_hash.clone());
            sealed.finalized_on = Some(on);
            let hash = chain::digest(&chain::canonical_bytes(&sealed), &tip.tip_hash);
            sealed.self_hash = Some(hash.clone());

            let totals = sealed
                .totals
                .clone()
                .ok_or_else(|| LedgerError::Validation("totals have not been computed".into()))?;
            let receipt = FinalizeReceipt {
                invoice_id: sealed.id.clone(),
                number: self.numbering.format(fiscal_year, sequence),
                sequence,
                hash,
                totals,
            };

            match self
                .store
                .commit_finalized(&company.id, fiscal_year, &tip, sealed)
            {
                Ok(()) => return Ok(receipt),
                Err(CommitError::TipMoved) => {
                    attempts += 1;
                    if attempts >= self.max_attempts {
                        return Err(LedgerError::ChainRace { attempts });
                    }
                    warn!(
                        invoice = %id,
                        attempts,
                        "chain tip moved during finalization, retrying against new tip"
                    );
                }
                Err(CommitError::Integrity(msg)) => {
                    return Err(LedgerError::SequenceIntegrity(msg));
                }
                Err(CommitError::Ledger(e)) => return Err(e),
            }
        }
    }

    /// Consume a payment event from banking reconciliation: status moves to
    /// Paid and the store resets dunning in the same write. Terminal for
    /// the dunning workflow.
    pub fn record_payment(&self, id: &InvoiceId, on: NaiveDate) -> Result<(), LedgerError> {
        let invoice = self.invoice(id)?;
        if invoice.status != InvoiceStatus::Finalized {
            return Err(LedgerError::Status {
                id: id.clone(),
                actual: invoice.status,
                required: InvoiceStatus::Finalized,
            });
        }
        self.store.set_status(id, InvoiceStatus::Paid, Some(on))
    }

    /// Cancel a finalized invoice. The record keeps its number and its
    /// place in the chain; only the status flag changes.
    pub fn cancel(&self, id: &InvoiceId) -> Result<(), LedgerError> {
        let invoice = self.invoice(id)?;
        if invoice.status != InvoiceStatus::Finalized {
            return Err(LedgerError::Status {
                id: id.clone(),
                actual: invoice.status,
                required: InvoiceStatus::Finalized,
            });
        }
        self.store.set_status(id, InvoiceStatus::Cancelled, None)
    }

    /// Verify one fiscal year's chain. Read-only; tampering is reported,
    /// never repaired.
    pub fn verify_chain(
        &self,
        company: &CompanyId,
        fiscal_year: i32,
    ) -> Result<ChainVerification, LedgerError> {
        if self.store.company(company).is_none() {
            return Err(LedgerError::CompanyNotFound(company.clone()));
        }
        let invoices = self.store.finalized(company, fiscal_year);
        Ok(chain::verify(company, fiscal_year, &invoices))
    }

    /// Verify every fiscal year the company has finalized invoices in.
    pub fn verify_company(
        &self,
        company: &CompanyId,
    ) -> Result<Vec<(i32, ChainVerification)>, LedgerError> {
        let cfg = self
            .store
            .company(company)
            .ok_or_else(|| LedgerError::CompanyNotFound(company.clone()))?;
        let mut years: Vec<i32> = self
            .store
            .invoices(company)
            .iter()
            .filter(|inv| inv.status.is_sealed())
            .map(|inv| cfg.fiscal_year_of(inv.issue_date))
            .collect();
        years.sort_unstable();
        years.dedup();
        Ok(years
            .into_iter()
            .map(|fy| {
                let invoices = self.store.finalized(company, fy);
                (fy, chain::verify(company, fy, &invoices))
            })
            .collect())
    }

    pub fn record_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        if self.store.company(&expense.company_id).is_none() {
            return Err(LedgerError::CompanyNotFound(expense.company_id.clone()));
        }
        self.store.record_expense(expense)
    }
}

#[cfg(feature = "journal")]
impl<S: LedgerStore> Ledger<S> {
    /// Journal rows for one fiscal year: finalized/paid invoices plus
    /// recorded expenses, re-derived from source records on every call.
    #[instrument(name = "facture.ledger.journal_for_year", skip(self, chart), err)]
    pub fn journal_for_year(
        &self,
        company: &CompanyId,
        fiscal_year: i32,
        chart: &ChartOfAccounts,
    ) -> Result<Vec<JournalEntry>, LedgerError> {
        let cfg = self
            .store
            .company(company)
            .ok_or_else(|| LedgerError::CompanyNotFound(company.clone()))?;
        let start = cfg.fiscal_year_start(fiscal_year);
        let end = cfg.fiscal_year_end_exclusive(fiscal_year);

        let mut entries = Vec::new();
        for invoice in self.store.finalized(company, fiscal_year) {
            if invoice.status == InvoiceStatus::Cancelled {
                continue;
            }
            entries.extend(journal::project_invoice(&invoice, chart)?);
        }

        // Expenses are numbered by (date, id) so the ordinal is stable
        // regardless of recording order.
        let mut expenses: Vec<Expense> = self
            .store
            .expenses(company)
            .into_iter()
            .filter(|e| e.date >= start && e.date < end)
            .collect();
        expenses.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));
        for (i, expense) in expenses.iter().enumerate() {
            entries.extend(journal::project_expense(expense, (i + 1) as u64, chart));
        }

        Ok(entries)
    }

    /// Monthly revenue/VAT aggregate, purely re-derived from finalized
    /// invoices issue-dated in that month. Recomputing from identical data
    /// yields identical results; there is no incrementally maintained
    /// counter to drift.
    pub fn monthly_aggregate(
        &self,
        company: &CompanyId,
        year: i32,
        month: u32,
    ) -> Result<MonthlyAggregate, LedgerError> {
        if self.store.company(company).is_none() {
            return Err(LedgerError::CompanyNotFound(company.clone()));
        }
        let invoices = self.store.invoices(company);
        Ok(journal::monthly_aggregate(&invoices, year, month))
    }
}

#[cfg(feature = "dunning")]
impl<S: LedgerStore> Ledger<S> {
    /// Run one escalation sweep over a company's unpaid finalized invoices.
    /// Idempotent: running it twice on the same day sends nothing the
    /// second time and advances no level twice.
    #[instrument(name = "facture.ledger.dunning_sweep", skip(self, config), err)]
    pub fn dunning_sweep(
        &self,
        company: &CompanyId,
        today: NaiveDate,
        config: &DunningConfig,
    ) -> Result<SweepReport, LedgerError> {
        if self.store.company(company).is_none() {
            return Err(LedgerError::CompanyNotFound(company.clone()));
        }
        let mut report = SweepReport::default();
        for invoice in self.store.invoices(company) {
            let Some(step) = dunning::plan_escalation(&invoice, today, config) else {
                continue;
            };
            let mut dstate = invoice.dunning.clone();
            dstate.level = step.to;
            let cooldown = dunning::check_cooldown(&invoice, today, config);
            if cooldown.is_ok() {
                dstate.last_reminder = Some(today);
            }
            // Per-invoice compare-and-set: a concurrent sweep that got
            // here first wins, and this one must not also report the
            // escalation or send a second reminder.
            if !self.store.set_dunning(&invoice.id, &invoice.dunning, dstate)? {
                tracing::debug!(
                    invoice = %invoice.id,
                    "dunning state changed under the sweep, skipping"
                );
                continue;
            }
            match cooldown {
                Ok(()) => report.reminders.push(dunning::ReminderNotice {
                    invoice_id: invoice.id.clone(),
                    level: step.to,
                    sent_on: today,
                }),
                Err(violation) => {
                    // Cooldown skips are control flow, not failures: the
                    // level still advances, only the reminder is withheld.
                    tracing::debug!(
                        invoice = %invoice.id,
                        last_reminder = ?violation.last_reminder,
                        "reminder suppressed by cooldown"
                    );
                    report.skipped.push(violation);
                }
            }
            report.escalations.push(step);
        }
        Ok(report)
    }

    /// Manually send one reminder. Inside the cooldown window the call is
    /// a logged skip, not an error.
    pub fn remind(
        &self,
        id: &InvoiceId,
        today: NaiveDate,
        config: &DunningConfig,
    ) -> Result<ReminderOutcome, LedgerError> {
        loop {
            let invoice = self.invoice(id)?;
            if invoice.status != InvoiceStatus::Finalized {
                return Err(LedgerError::Status {
                    id: id.clone(),
                    actual: invoice.status,
                    required: InvoiceStatus::Finalized,
                });
            }
            match dunning::check_cooldown(&invoice, today, config) {
                Ok(()) => {
                    let mut dstate = invoice.dunning.clone();
                    dstate.last_reminder = Some(today);
                    // Lost a race against a concurrent sweep: re-read, the
                    // fresh state usually lands in the cooldown branch.
                    if !self.store.set_dunning(id, &invoice.dunning, dstate)? {
                        continue;
                    }
                    return Ok(ReminderOutcome::Sent(dunning::ReminderNotice {
                        invoice_id: id.clone(),
                        level: invoice.dunning.level,
                        sent_on: today,
                    }));
                }
                Err(violation) => {
                    tracing::debug!(
                        invoice = %id,
                        last_reminder = ?violation.last_reminder,
                        "manual reminder suppressed by cooldown"
                    );
                    return Ok(ReminderOutcome::Skipped(violation));
                }
            }
        }
    }
}

#[cfg(feature = "fec")]
impl<S: LedgerStore> Ledger<S> {
    /// Render the statutory FEC file for one fiscal year. Fails closed on
    /// an unbalanced journal or an exceeded deadline; never emits a
    /// partial file.
    #[instrument(name = "facture.ledger.export_fec", skip(self, chart, opts), err)]
    pub fn export_fec(
        &self,
        company: &CompanyId,
        fiscal_year: i32,
        chart: &ChartOfAccounts,
        opts: &crate::fec::ExportOptions,
    ) -> Result<String, LedgerError> {
        let entries = self.journal_for_year(company, fiscal_year, chart)?;
        crate::fec::to_fec(&entries, fiscal_year, opts)
    }
}

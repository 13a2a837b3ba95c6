use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::amounts;
use super::error::{LedgerError, validation_failure};
use super::types::*;
use super::validation;

/// Builder for draft invoices.
///
/// Drafts are the only mutable stage of the lifecycle: they carry no
/// sequence number, no external number, and no chain hashes. Those appear
/// only when the ledger finalizes the draft.
///
/// ```
/// use chrono::NaiveDate;
/// use facture::core::*;
/// use rust_decimal_macros::dec;
///
/// let draft = DraftBuilder::new("inv-1", "acme", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
///     .client(ClientRef::new("c-7", "Dupont SARL"))
///     .due_date(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap())
///     .add_line(InvoiceLine::new("Conseil", dec!(3), dec!(100.00), VatRate::Standard))
///     .build()
///     .unwrap();
///
/// assert_eq!(draft.status, InvoiceStatus::Draft);
/// assert!(draft.number.is_none());
/// assert_eq!(draft.totals.unwrap().total, dec!(360.00));
/// ```
pub struct DraftBuilder {
    id: InvoiceId,
    company_id: CompanyId,
    client: Option<ClientRef>,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    currency: String,
    lines: Vec<InvoiceLine>,
}

impl DraftBuilder {
    pub fn new(
        id: impl Into<InvoiceId>,
        company_id: impl Into<CompanyId>,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            company_id: company_id.into(),
            client: None,
            issue_date,
            due_date: None,
            currency: "EUR".to_string(),
            lines: Vec::new(),
        }
    }

    pub fn client(mut self, client: ClientRef) -> Self {
        self.client = Some(client);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn add_line(mut self, line: InvoiceLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Add a line pre-filled from a product record.
    pub fn add_product(mut self, product: &Product, quantity: Decimal) -> Self {
        self.lines.push(InvoiceLine::from_product(product, quantity));
        self
    }

    /// Build the draft, computing totals and running validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<Invoice, LedgerError> {
        let invoice = self.assemble();
        let errors = validation::validate_draft(&invoice);
        if !errors.is_empty() {
            return Err(validation_failure(&errors));
        }
        Ok(invoice)
    }

    /// Build without validation — useful for testing or importing external
    /// data. Totals are still computed. A missing client or due date is
    /// defaulted (empty client, due date = issue date) and will surface at
    /// finalization, which validates again.
    pub fn build_unchecked(self) -> Invoice {
        self.assemble()
    }

    fn assemble(self) -> Invoice {
        let client = self.client.unwrap_or_else(|| ClientRef::new("", ""));
        let due_date = self.due_date.unwrap_or(self.issue_date);

        let mut lines = self.lines;
        let totals = amounts::compute_totals(&mut lines);

        Invoice {
            id: self.id,
            company_id: self.company_id,
            client,
            status: InvoiceStatus::Draft,
            sequence: None,
            number: None,
            issue_date: self.issue_date,
            due_date,
            currency: self.currency,
            lines,
            totals: Some(totals),
            prev_hash: None,
            self_hash: None,
            dunning: DunningStatus::default(),
            finalized_on: None,
            paid_on: None,
        }
    }
}

/// Mutations applicable to a draft. Fields left `None` keep their current
/// value; lines, when given, replace the draft's lines wholesale and the
/// totals are recomputed.
#[derive(Debug, Default, Clone)]
pub struct DraftUpdate {
    pub client: Option<ClientRef>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub lines: Option<Vec<InvoiceLine>>,
}

impl DraftUpdate {
    pub fn lines(lines: Vec<InvoiceLine>) -> Self {
        Self {
            lines: Some(lines),
            ..Self::default()
        }
    }

    /// Apply to a draft in place, recomputing totals.
    /// The caller is responsible for checking the Draft status first.
    pub(crate) fn apply(self, invoice: &mut Invoice) {
        if let Some(client) = self.client {
            invoice.client = client;
        }
        if let Some(d) = self.issue_date {
            invoice.issue_date = d;
        }
        if let Some(d) = self.due_date {
            invoice.due_date = d;
        }
        if let Some(lines) = self.lines {
            invoice.lines = lines;
        }
        invoice.totals = Some(amounts::compute_totals(&mut invoice.lines));
    }
}

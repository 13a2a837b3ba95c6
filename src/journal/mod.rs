//! Journal projection and monthly aggregates.
//!
//! Finalized invoices and recorded expenses are turned into balanced
//! debit/credit rows on demand. Nothing here is incrementally maintained:
//! every projection and every aggregate is a pure re-derivation from the
//! source records, so recomputing from unchanged data is bit-identical.

mod accounts;

pub use accounts::{Account, ChartOfAccounts, JournalCode};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    CompanyId, Expense, ExpenseId, Invoice, InvoiceId, InvoiceStatus, LedgerError,
};

/// Which source record a journal row was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceRef {
    Invoice(InvoiceId),
    Expense(ExpenseId),
}

/// Reconciliation marker (FEC EcritureLet / DateLet), set on the
/// receivable row once the source invoice is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lettering {
    pub code: String,
    pub date: NaiveDate,
}

/// One journal row. For any projected document the debit rows and credit
/// rows sum to the same amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub journal: JournalCode,
    /// Sequential number of the écriture within its journal (the invoice
    /// sequence for sales, the expense ordinal for purchases).
    pub entry_num: u64,
    pub date: NaiveDate,
    pub company_id: CompanyId,
    pub account: Account,
    /// Auxiliary account (client or supplier): (number, label).
    pub aux_account: Option<(String, String)>,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Reference of the source document (invoice number, expense id).
    pub piece_ref: String,
    pub piece_date: NaiveDate,
    pub label: String,
    pub source: SourceRef,
    pub lettering: Option<Lettering>,
    /// Date the écriture was validated (the invoice's finalization date).
    pub validated_on: NaiveDate,
}

/// Monthly VAT/revenue aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub revenue: Decimal,
    pub vat_collected: Decimal,
    pub invoice_count: u64,
}

/// Project one finalized invoice into journal rows:
/// debit receivable for the gross total (client as auxiliary account),
/// credit revenue for the net subtotal, credit VAT collected once per rate
/// present. VAT rows carry the per-line-rounded sums from the invoice's
/// breakdown, so the écriture balances exactly.
pub fn project_invoice(
    invoice: &Invoice,
    chart: &ChartOfAccounts,
) -> Result<Vec<JournalEntry>, LedgerError> {
    let totals = invoice.totals.as_ref().ok_or_else(|| {
        LedgerError::Validation(format!("invoice {} has no computed totals", invoice.id))
    })?;
    let (Some(sequence), Some(number)) = (invoice.sequence, invoice.number.as_deref()) else {
        return Err(LedgerError::Validation(format!(
            "invoice {} is not finalized and cannot be journalized",
            invoice.id
        )));
    };

    let label = entry_label(invoice, number);
    let validated_on = invoice.finalized_on.unwrap_or(invoice.issue_date);
    let lettering = invoice.paid_on.map(|date| Lettering {
        code: number.to_string(),
        date,
    });

    let row = |account: &Account, debit: Decimal, credit: Decimal| JournalEntry {
        journal: JournalCode::Sales,
        entry_num: sequence,
        date: invoice.issue_date,
        company_id: invoice.company_id.clone(),
        account: account.clone(),
        aux_account: None,
        debit,
        credit,
        piece_ref: number.to_string(),
        piece_date: invoice.issue_date,
        label: label.clone(),
        source: SourceRef::Invoice(invoice.id.clone()),
        lettering: None,
        validated_on,
    };

    let mut entries = Vec::with_capacity(2 + totals.vat_breakdown.len());

    let mut receivable = row(&chart.receivable, totals.total, Decimal::ZERO);
    receivable.aux_account = Some((
        invoice.client.id.to_string(),
        invoice.client.name.clone(),
    ));
    receivable.lettering = lettering;
    entries.push(receivable);

    entries.push(row(&chart.revenue, Decimal::ZERO, totals.subtotal));

    for breakdown in &totals.vat_breakdown {
        if breakdown.vat_amount.is_zero() {
            continue;
        }
        entries.push(row(
            &chart.vat_collected,
            Decimal::ZERO,
            breakdown.vat_amount,
        ));
    }

    Ok(entries)
}

/// Project one expense, symmetrically to an invoice with debit and credit
/// reversed: debit expense net, debit deductible VAT, credit supplier
/// gross. `entry_num` is the expense's ordinal in its journal for the
/// fiscal year.
pub fn project_expense(
    expense: &Expense,
    entry_num: u64,
    chart: &ChartOfAccounts,
) -> Vec<JournalEntry> {
    let row = |account: &Account, debit: Decimal, credit: Decimal| JournalEntry {
        journal: JournalCode::Purchases,
        entry_num,
        date: expense.date,
        company_id: expense.company_id.clone(),
        account: account.clone(),
        aux_account: None,
        debit,
        credit,
        piece_ref: expense.id.to_string(),
        piece_date: expense.date,
        label: expense.label.clone(),
        source: SourceRef::Expense(expense.id.clone()),
        lettering: None,
        validated_on: expense.date,
    };

    let mut entries = Vec::with_capacity(3);
    entries.push(row(&chart.expense, expense.net, Decimal::ZERO));
    let vat = expense.vat();
    if !vat.is_zero() {
        entries.push(row(&chart.vat_deductible, vat, Decimal::ZERO));
    }
    let mut supplier = row(&chart.supplier, Decimal::ZERO, expense.gross());
    supplier.aux_account = Some((expense.supplier.clone(), expense.supplier.clone()));
    entries.push(supplier);
    entries
}

/// Net position of a set of rows: `Σdebit − Σcredit`. Zero when balanced.
pub fn balance(entries: &[JournalEntry]) -> Decimal {
    entries
        .iter()
        .map(|e| e.debit - e.credit)
        .sum()
}

/// Re-derive the monthly aggregate from the given invoices. Counts
/// finalized and paid invoices issue-dated in (year, month); drafts and
/// cancelled invoices never contribute.
pub fn monthly_aggregate(invoices: &[Invoice], year: i32, month: u32) -> MonthlyAggregate {
    let mut agg = MonthlyAggregate {
        revenue: Decimal::ZERO,
        vat_collected: Decimal::ZERO,
        invoice_count: 0,
    };
    for invoice in invoices {
        if !matches!(
            invoice.status,
            InvoiceStatus::Finalized | InvoiceStatus::Paid
        ) {
            continue;
        }
        if invoice.issue_date.year() != year || invoice.issue_date.month() != month {
            continue;
        }
        let Some(totals) = &invoice.totals else {
            continue;
        };
        agg.revenue += totals.subtotal;
        agg.vat_collected += totals.vat_total;
        agg.invoice_count += 1;
    }
    agg
}

/// Posting text: invoice number plus the line description when there is a
/// single line, the bare number otherwise.
fn entry_label(invoice: &Invoice, number: &str) -> String {
    if invoice.lines.len() == 1 {
        format!("{} {}", number, invoice.lines[0].description)
    } else {
        number.to_string()
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

    fn finalized_invoice() -> Invoice {
        let mut invoice = DraftBuilder::new("inv-1", "acme", date(2024, 6, 15))
            .client(ClientRef::new("c-7", "Dupont SARL"))
            .due_date(date(2024, 7, 15))
            .add_line(InvoiceLine::new(
                "Conseil",
                dec!(3),
                dec!(100.00),
                VatRate::Standard,
            ))
            .add_line(InvoiceLine::new(
                "Formation",
                dec!(1),
                dec!(50.00),
                VatRate::Intermediate,
            ))
            .build()
            .unwrap();
        invoice.status = InvoiceStatus::Finalized;
        invoice.sequence = Some(1);
        invoice.number = Some("INV-2024-000001".into());
        invoice.finalized_on = Some(date(2024, 6, 15));
        invoice
    }

    #[test]
    fn invoice_projection_balances() {
        let entries = project_invoice(&finalized_invoice(), &ChartOfAccounts::default()).unwrap();
        assert_eq!(balance(&entries), dec!(0));
        // 411 gross, 706 net, one 44571 row per rate
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].debit, dec!(415.00));
        assert_eq!(entries[1].credit, dec!(350.00));
        let vat: Decimal = entries[2..].iter().map(|e| e.credit).sum();
        assert_eq!(vat, dec!(65.00));
    }

    #[test]
    fn receivable_carries_client_aux_account() {
        let entries = project_invoice(&finalized_invoice(), &ChartOfAccounts::default()).unwrap();
        assert_eq!(
            entries[0].aux_account,
            Some(("c-7".to_string(), "Dupont SARL".to_string()))
        );
        assert_eq!(entries[1].aux_account, None);
    }

    #[test]
    fn paid_invoice_letters_the_receivable() {
        let mut invoice = finalized_invoice();
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_on = Some(date(2024, 8, 2));
        let entries = project_invoice(&invoice, &ChartOfAccounts::default()).unwrap();
        let lettering = entries[0].lettering.as_ref().unwrap();
        assert_eq!(lettering.code, "INV-2024-000001");
        assert_eq!(lettering.date, date(2024, 8, 2));
        assert!(entries[1].lettering.is_none());
    }

    #[test]
    fn draft_cannot_be_journalized() {
        let draft = DraftBuilder::new("inv-1", "acme", date(2024, 6, 15))
            .client(ClientRef::new("c-7", "Dupont SARL"))
            .due_date(date(2024, 7, 15))
            .add_line(InvoiceLine::new("X", dec!(1), dec!(10), VatRate::Standard))
            .build()
            .unwrap();
        assert!(project_invoice(&draft, &ChartOfAccounts::default()).is_err());
    }

    #[test]
    fn expense_projection_balances_reversed() {
        let expense = Expense {
            id: "e-1".into(),
            company_id: "acme".into(),
            date: date(2024, 6, 20),
            label: "Fournitures bureau".into(),
            supplier: "Papeterie SA".into(),
            net: dec!(120.00),
            vat_rate: VatRate::Standard,
        };
        let entries = project_expense(&expense, 1, &ChartOfAccounts::default());
        assert_eq!(balance(&entries), dec!(0));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].debit, dec!(120.00)); // 606
        assert_eq!(entries[1].debit, dec!(24.00)); // 44566
        assert_eq!(entries[2].credit, dec!(144.00)); // 401
        assert_eq!(entries[2].journal, JournalCode::Purchases);
    }

    #[test]
    fn zero_rate_invoice_emits_no_vat_row() {
        let mut invoice = DraftBuilder::new("inv-2", "acme", date(2024, 6, 15))
            .client(ClientRef::new("c-7", "Dupont SARL"))
            .due_date(date(2024, 7, 15))
            .add_line(InvoiceLine::new(
                "Export",
                dec!(1),
                dec!(500.00),
                VatRate::Zero,
            ))
            .build()
            .unwrap();
        invoice.status = InvoiceStatus::Finalized;
        invoice.sequence = Some(1);
        invoice.number = Some("INV-2024-000001".into());
        let entries = project_invoice(&invoice, &ChartOfAccounts::default()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(balance(&entries), dec!(0));
    }

    #[test]
    fn monthly_aggregate_is_pure() {
        let invoices = vec![finalized_invoice()];
        let a = monthly_aggregate(&invoices, 2024, 6);
        let b = monthly_aggregate(&invoices, 2024, 6);
        assert_eq!(a, b);
        assert_eq!(a.revenue, dec!(350.00));
        assert_eq!(a.vat_collected, dec!(65.00));
        assert_eq!(a.invoice_count, 1);
        // Other months are empty
        let other = monthly_aggregate(&invoices, 2024, 7);
        assert_eq!(other.invoice_count, 0);
    }

    #[test]
    fn cancelled_invoices_do_not_aggregate() {
        let mut invoice = finalized_invoice();
        invoice.status = InvoiceStatus::Cancelled;
        let agg = monthly_aggregate(&[invoice], 2024, 6);
        assert_eq!(agg.invoice_count, 0);
        assert_eq!(agg.revenue, dec!(0));
    }
}

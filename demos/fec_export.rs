use chrono::NaiveDate;
use facture::core::*;
use facture::fec::ExportOptions;
use facture::journal::ChartOfAccounts;
use facture::ledger::{Ledger, MemoryStore};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn main() {
    let ledger = Ledger::new(MemoryStore::new());
    ledger.register_company(Company::new("acme", "ACME SARL"));

    for (id, issued, label, price) in [
        ("inv-1", date(2024, 3, 15), "Développement", dec!(4800.00)),
        ("inv-2", date(2024, 3, 20), "Hébergement annuel", dec!(588.00)),
        ("inv-3", date(2024, 9, 2), "Maintenance", dec!(1200.00)),
    ] {
        let draft = DraftBuilder::new(id, "acme", issued)
            .client(ClientRef::new("c-7", "Dupont SARL"))
            .due_date(issued + chrono::Duration::days(30))
            .add_line(InvoiceLine::new(label, dec!(1), price, VatRate::Standard))
            .build()
            .expect("draft valid");
        let id = ledger.create_draft(draft).expect("stored");
        ledger.finalize(&id, issued).expect("finalized");
    }

    ledger
        .record_expense(Expense {
            id: "e-1".into(),
            company_id: "acme".into(),
            date: date(2024, 4, 12),
            label: "Licences logicielles".into(),
            supplier: "Adobe France".into(),
            net: dec!(240.00),
            vat_rate: VatRate::Standard,
        })
        .expect("expense recorded");

    // One payment, so the export shows a lettered receivable.
    ledger
        .record_payment(&"inv-1".into(), date(2024, 4, 2))
        .expect("paid");

    let fec = ledger
        .export_fec(
            &"acme".into(),
            2024,
            &ChartOfAccounts::default(),
            &ExportOptions::default(),
        )
        .expect("balanced export");

    print!("{fec}");
    eprintln!("--- {} rows", fec.lines().count() - 1);
}

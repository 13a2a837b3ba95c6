use chrono::NaiveDate;
use facture::core::*;
use facture::dunning::DunningConfig;
use facture::ledger::{Ledger, MemoryStore};
use rust_decimal_macros::dec;

fn main() {
    let ledger = Ledger::new(MemoryStore::new());
    ledger.register_company(Company::new("acme", "ACME SARL"));

    // Draft: freely mutable, no number yet.
    let draft = DraftBuilder::new(
        "inv-1",
        "acme",
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
    )
    .client(ClientRef::new("c-7", "Dupont SARL"))
    .due_date(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap())
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
    .expect("draft valid");
    let id = ledger.create_draft(draft).expect("draft stored");

    // Finalize: gapless number + chain digest, sealed forever.
    let receipt = ledger
        .finalize(&id, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        .expect("finalized");
    println!("number:   {}", receipt.number);
    println!("sequence: {}", receipt.sequence);
    println!("hash:     {}", receipt.hash);
    println!(
        "totals:   {} HT / {} TVA / {} TTC",
        receipt.totals.subtotal, receipt.totals.vat_total, receipt.totals.total
    );

    // Chain verification is a read anyone can run.
    let verification = ledger.verify_chain(&"acme".into(), 2024).expect("verified");
    println!("chain valid: {}", verification.valid);

    // Months later, the invoice is overdue: run a dunning sweep.
    let report = ledger
        .dunning_sweep(
            &"acme".into(),
            NaiveDate::from_ymd_opt(2024, 7, 20).unwrap(),
            &DunningConfig::default(),
        )
        .expect("sweep");
    for notice in &report.reminders {
        println!(
            "reminder for {} at level {:?}",
            notice.invoice_id, notice.level
        );
    }

    // A payment event from reconciliation ends the workflow.
    ledger
        .record_payment(&id, NaiveDate::from_ymd_opt(2024, 7, 25).unwrap())
        .expect("paid");
    println!("status: {:?}", ledger.invoice(&id).unwrap().status);
}

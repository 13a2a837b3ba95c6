//! Tamper evidence: the chain must verify clean for untouched history and
//! pinpoint the first altered record otherwise.

use chrono::NaiveDate;
use facture::chain;
use facture::core::*;
use facture::ledger::{Ledger, LedgerStore, MemoryStore};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ledger_with_chain(n: u64) -> Ledger<MemoryStore> {
    let ledger = Ledger::new(MemoryStore::new());
    ledger.register_company(Company::new("acme", "ACME SARL"));
    for i in 0..n {
        let draft = DraftBuilder::new(
            format!("inv-{i}").as_str(),
            "acme",
            date(2024, 6, 1 + i as u32),
        )
        .client(ClientRef::new("c-7", "Dupont SARL"))
        .due_date(date(2024, 7, 1 + i as u32))
        .add_line(InvoiceLine::new(
            format!("Prestation {i}"),
            dec!(1),
            dec!(100.00) + rust_decimal::Decimal::from(i),
            VatRate::Standard,
        ))
        .build()
        .unwrap();
        let id = ledger.create_draft(draft).unwrap();
        ledger.finalize(&id, date(2024, 6, 1 + i as u32)).unwrap();
    }
    ledger
}

#[test]
fn untouched_chains_verify_at_any_length() {
    for n in [0u64, 1, 2, 7] {
        let ledger = ledger_with_chain(n);
        let v = ledger.verify_chain(&"acme".into(), 2024).unwrap();
        assert!(v.valid, "length {n}");
        assert_eq!(v.checked, n);
        assert_eq!(v.first_broken_sequence, None);
    }
}

#[test]
fn each_link_references_its_predecessor() {
    let ledger = ledger_with_chain(3);
    let invoices = ledger.store().finalized(&"acme".into(), 2024);
    assert_eq!(
        invoices[0].prev_hash.as_deref().unwrap(),
        chain::genesis_hash(&"acme".into(), 2024)
    );
    assert_eq!(invoices[1].prev_hash, invoices[0].self_hash);
    assert_eq!(invoices[2].prev_hash, invoices[1].self_hash);
}

#[test]
fn tampering_any_field_is_caught_at_that_index() {
    let ledger = ledger_with_chain(5);
    let pristine = ledger.store().finalized(&"acme".into(), 2024);

    // Mutate one field of one historical invoice at a time; verification
    // must flag exactly that sequence number.
    let mutations: Vec<(usize, Box<dyn Fn(&mut Invoice)>)> = vec![
        (
            0,
            Box::new(|inv| {
                inv.lines[0].unit_price = dec!(999.99);
            }),
        ),
        (
            2,
            Box::new(|inv| {
                inv.issue_date = date(2024, 1, 1);
            }),
        ),
        (
            2,
            Box::new(|inv| {
                inv.client = ClientRef::new("c-0", "Autre Client");
            }),
        ),
        (
            4,
            Box::new(|inv| {
                if let Some(t) = inv.totals.as_mut() {
                    t.total += dec!(0.01);
                }
            }),
        ),
    ];
    for (idx, mutate) in mutations {
        let mut chain_copy = pristine.clone();
        mutate(&mut chain_copy[idx]);
        let v = chain::verify(&"acme".into(), 2024, &chain_copy);
        assert!(!v.valid);
        assert_eq!(
            v.first_broken_sequence,
            Some((idx + 1) as u64),
            "mutation at index {idx}"
        );
    }
}

#[test]
fn deleting_a_record_breaks_the_chain_at_the_hole() {
    let ledger = ledger_with_chain(4);
    let mut chain_copy = ledger.store().finalized(&"acme".into(), 2024);
    chain_copy.remove(1); // drop sequence 2
    let v = chain::verify(&"acme".into(), 2024, &chain_copy);
    assert!(!v.valid);
    assert_eq!(v.first_broken_sequence, Some(2));
}

#[test]
fn reordering_records_breaks_the_chain() {
    let ledger = ledger_with_chain(4);
    let mut chain_copy = ledger.store().finalized(&"acme".into(), 2024);
    chain_copy.swap(1, 2);
    let v = chain::verify(&"acme".into(), 2024, &chain_copy);
    assert!(!v.valid);
    assert_eq!(v.first_broken_sequence, Some(2));
}

#[test]
fn rewriting_hashes_cannot_hide_a_tamper() {
    // An attacker edits invoice 2 and recomputes its digest, but cannot
    // fix invoice 3's stored prev_hash without rewriting it too — the
    // break surfaces at the first record whose linkage disagrees.
    let ledger = ledger_with_chain(3);
    let mut chain_copy = ledger.store().finalized(&"acme".into(), 2024);

    chain_copy[1].lines[0].unit_price = dec!(1.00);
    if let Some(t) = chain_copy[1].totals.as_mut() {
        t.subtotal = dec!(1.00);
        t.vat_total = dec!(0.20);
        t.total = dec!(1.20);
    }
    let prev = chain_copy[1].prev_hash.clone().unwrap();
    let forged = chain::digest(&chain::canonical_bytes(&chain_copy[1]), &prev);
    chain_copy[1].self_hash = Some(forged);

    let v = chain::verify(&"acme".into(), 2024, &chain_copy);
    assert!(!v.valid);
    assert_eq!(v.first_broken_sequence, Some(3));
}

#[test]
fn verification_is_read_only() {
    let ledger = ledger_with_chain(3);
    let before = ledger.store().finalized(&"acme".into(), 2024);
    let _ = ledger.verify_chain(&"acme".into(), 2024).unwrap();
    let _ = ledger.verify_chain(&"acme".into(), 2024).unwrap();
    let after = ledger.store().finalized(&"acme".into(), 2024);
    assert_eq!(
        before.iter().map(|i| i.self_hash.clone()).collect::<Vec<_>>(),
        after.iter().map(|i| i.self_hash.clone()).collect::<Vec<_>>()
    );
}

#[test]
fn verify_company_covers_every_fiscal_year() {
    let ledger = ledger_with_chain(2);
    let draft = DraftBuilder::new("inv-2025", "acme", date(2025, 2, 1))
        .client(ClientRef::new("c-7", "Dupont SARL"))
        .due_date(date(2025, 3, 1))
        .add_line(InvoiceLine::new("X", dec!(1), dec!(10), VatRate::Standard))
        .build()
        .unwrap();
    let id = ledger.create_draft(draft).unwrap();
    ledger.finalize(&id, date(2025, 2, 1)).unwrap();

    let all = ledger.verify_company(&"acme".into()).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|(_, v)| v.valid));
    assert_eq!(all[0].0, 2024);
    assert_eq!(all[1].0, 2025);
}

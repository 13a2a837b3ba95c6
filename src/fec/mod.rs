//! FEC (Fichier des Écritures Comptables) generation.
//!
//! The statutory export every French business must be able to hand the
//! tax authority: one tab-delimited row per journal entry in the fixed
//! 18-column layout of Article A47 A-1 LPF, CRLF line endings, amounts
//! with a comma decimal separator. Output is deterministic — an unchanged
//! ledger renders to byte-identical files, with no locale or clock
//! dependence at call time.

use std::time::Instant;

use rust_decimal::Decimal;

use crate::core::LedgerError;
use crate::journal::{JournalEntry, balance};

/// The normative column set, in order. Compliance tooling downstream
/// matches on these exact headers.
pub const COLUMNS: [&str; 18] = [
    "JournalCode",
    "JournalLib",
    "EcritureNum",
    "EcritureDate",
    "CompteNum",
    "CompteLib",
    "CompAuxNum",
    "CompAuxLib",
    "PieceRef",
    "PieceDate",
    "EcritureLib",
    "Debit",
    "Credit",
    "EcritureLet",
    "DateLet",
    "ValidDate",
    "Montantdevise",
    "Idevise",
];

/// Export options.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Abort the export when this instant passes, rather than keep a
    /// caller waiting or emit a partial file.
    pub deadline: Option<Instant>,
}

impl ExportOptions {
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }
}

/// Render the FEC for one fiscal year's journal.
///
/// Asserts `Σdebit == Σcredit` over the whole input before emitting
/// anything: an unbalanced journal fails closed with
/// [`LedgerError::Unbalanced`] instead of producing a non-compliant file.
/// Rows are ordered by entry date, then journal code, then entry number,
/// keeping each écriture's internal row order.
pub fn to_fec(
    entries: &[JournalEntry],
    fiscal_year: i32,
    opts: &ExportOptions,
) -> Result<String, LedgerError> {
    let imbalance = balance(entries);
    if !imbalance.is_zero() {
        return Err(LedgerError::Unbalanced {
            fiscal_year,
            imbalance,
        });
    }

    let mut ordered: Vec<&JournalEntry> = entries.iter().collect();
    // Stable sort: rows of one écriture keep their projection order.
    ordered.sort_by_key(|e| (e.date, e.journal.code(), e.entry_num));

    let mut out = String::new();
    out.push_str(&COLUMNS.join("\t"));
    out.push_str("\r\n");

    for (rows, entry) in ordered.iter().enumerate() {
        if let Some(deadline) = opts.deadline {
            if Instant::now() >= deadline {
                return Err(LedgerError::DeadlineExceeded { rows });
            }
        }
        write_row(&mut out, entry);
    }

    Ok(out)
}

fn write_row(out: &mut String, entry: &JournalEntry) {
    let (aux_num, aux_label) = match &entry.aux_account {
        Some((num, label)) => (num.as_str(), label.as_str()),
        None => ("", ""),
    };
    let (lettering_code, lettering_date) = match &entry.lettering {
        Some(l) => (l.code.clone(), fec_date(l.date)),
        None => (String::new(), String::new()),
    };

    let fields = [
        entry.journal.code().to_string(),
        entry.journal.label().to_string(),
        entry.entry_num.to_string(),
        fec_date(entry.date),
        entry.account.code.clone(),
        entry.account.label.clone(),
        clean(aux_num),
        clean(aux_label),
        clean(&entry.piece_ref),
        fec_date(entry.piece_date),
        clean(&entry.label),
        fec_amount(entry.debit),
        fec_amount(entry.credit),
        lettering_code,
        lettering_date,
        fec_date(entry.validated_on),
        // Montantdevise / Idevise stay empty for a single-currency EUR
        // ledger.
        String::new(),
        String::new(),
    ];

    out.push_str(&fields.join("\t"));
    out.push_str("\r\n");
}

/// FEC date rendering: YYYYMMDD.
fn fec_date(date: chrono::NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// FEC amount rendering: two decimals, comma separator.
fn fec_amount(d: Decimal) -> String {
    format!("{:.2}", d).replace('.', ",")
}

/// Free text must not carry the separators of the format.
fn clean(s: &str) -> String {
    s.replace(['\t', '\r', '\n'], " ")
}

//! Canonical serialization of the immutable invoice content.
//!
//! The digest of a finalized invoice must be reproducible by any verifier,
//! so the byte rendering is fixed: fields in a fixed order, one `key=value`
//! per line, amounts at exactly two decimals, quantities and rates
//! normalized. Two invoices with the same logical content always render to
//! the same bytes regardless of how the structs were assembled.

use rust_decimal::Decimal;

use crate::core::{Invoice, InvoiceLine};

/// Render the immutable content of a finalized invoice.
///
/// Covered fields: number, sequence, company, client, dates, currency,
/// every line in order, and the three totals. Status, dunning fields and
/// payment dates are deliberately excluded: they are the only fields
/// allowed to change after finalization.
pub fn canonical_bytes(invoice: &Invoice) -> Vec<u8> {
    let mut out = String::new();

    push_field(&mut out, "number", invoice.number.as_deref().unwrap_or(""));
    push_field(
        &mut out,
        "sequence",
        &invoice.sequence.map_or(String::new(), |s| s.to_string()),
    );
    push_field(&mut out, "company", invoice.company_id.as_str());
    push_field(&mut out, "client_id", invoice.client.id.as_str());
    push_field(&mut out, "client_name", &invoice.client.name);
    push_field(&mut out, "issue", &invoice.issue_date.to_string());
    push_field(&mut out, "due", &invoice.due_date.to_string());
    push_field(&mut out, "currency", &invoice.currency);

    for line in &invoice.lines {
        push_line(&mut out, line);
    }

    if let Some(totals) = &invoice.totals {
        push_field(&mut out, "subtotal", &amount(totals.subtotal));
        push_field(&mut out, "vat", &amount(totals.vat_total));
        push_field(&mut out, "total", &amount(totals.total));
    }

    out.into_bytes()
}

fn push_line(out: &mut String, line: &InvoiceLine) {
    out.push_str("line=");
    out.push_str(&escape(&line.description));
    out.push('|');
    out.push_str(&line.quantity.normalize().to_string());
    out.push('|');
    out.push_str(&amount(line.unit_price));
    out.push('|');
    out.push_str(&line.vat_rate.rate().normalize().to_string());
    out.push('|');
    out.push_str(&line.net.map_or(String::new(), amount));
    out.push('|');
    out.push_str(&line.vat.map_or(String::new(), amount));
    out.push('\n');
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push('=');
    out.push_str(&escape(value));
    out.push('\n');
}

/// Fixed two-decimal rendering, so 65 and 65.00 hash identically.
fn amount(d: Decimal) -> String {
    format!("{:.2}", d)
}

/// Escape the separator characters used by the rendering.
fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '|' => escaped.push_str("\\|"),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

//! Line-level amount computation.
//!
//! VAT is computed **per line**, rounded half-up to 2 decimals, then
//! summed. Computing on the aggregate subtotal and rounding once can
//! diverge from the per-line result by a cent, which tax-authority
//! reconciliation rejects.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::LedgerError;
use super::types::{Invoice, InvoiceLine, Totals, VatBreakdown, VatRate};

/// Round a Decimal to `dp` decimal places using half-up (commercial rounding).
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Net amount of one line: quantity × unit price, rounded at the line level.
pub fn line_net(line: &InvoiceLine) -> Decimal {
    round_half_up(line.quantity * line.unit_price, 2)
}

/// VAT of one line, computed on the rounded line net.
pub fn line_vat(line: &InvoiceLine) -> Decimal {
    round_half_up(line_net(line) * line.vat_rate.rate() / dec!(100), 2)
}

/// Fill the per-line `net`/`vat` fields and return the derived totals.
pub fn compute_totals(lines: &mut [InvoiceLine]) -> Totals {
    for line in lines.iter_mut() {
        line.net = Some(line_net(line));
        line.vat = Some(line_vat(line));
    }

    let subtotal: Decimal = lines.iter().filter_map(|l| l.net).sum();
    let vat_total: Decimal = lines.iter().filter_map(|l| l.vat).sum();

    // Breakdown rows sum the already-rounded line amounts so they always
    // reconcile exactly with subtotal/vat_total.
    let mut breakdown: Vec<VatBreakdown> = Vec::new();
    for rate in [
        VatRate::Zero,
        VatRate::SuperReduced,
        VatRate::Reduced,
        VatRate::Intermediate,
        VatRate::Standard,
    ] {
        let mut taxable = Decimal::ZERO;
        let mut vat = Decimal::ZERO;
        let mut seen = false;
        for line in lines.iter().filter(|l| l.vat_rate == rate) {
            seen = true;
            taxable += line.net.unwrap_or(Decimal::ZERO);
            vat += line.vat.unwrap_or(Decimal::ZERO);
        }
        if seen {
            breakdown.push(VatBreakdown {
                vat_rate: rate,
                taxable_amount: taxable,
                vat_amount: vat,
            });
        }
    }

    Totals {
        subtotal,
        vat_total,
        total: subtotal + vat_total,
        vat_breakdown: breakdown,
    }
}

/// Recompute totals from the lines and compare with the stored ones,
/// zero tolerance. Run at finalize time: a disagreement means the stored
/// amounts were produced by a different (buggy) computation and must not
/// be sealed into the chain.
pub fn verify_totals(invoice: &Invoice) -> Result<(), LedgerError> {
    let stored = invoice
        .totals
        .as_ref()
        .ok_or_else(|| LedgerError::Validation("totals have not been computed".into()))?;

    let mut lines = invoice.lines.clone();
    let computed = compute_totals(&mut lines);

    if stored.subtotal != computed.subtotal {
        return Err(LedgerError::RoundingMismatch {
            field: "subtotal",
            stored: stored.subtotal,
            computed: computed.subtotal,
        });
    }
    if stored.vat_total != computed.vat_total {
        return Err(LedgerError::RoundingMismatch {
            field: "vat_total",
            stored: stored.vat_total,
            computed: computed.vat_total,
        });
    }
    if stored.total != computed.total {
        return Err(LedgerError::RoundingMismatch {
            field: "total",
            stored: stored.total,
            computed: computed.total,
        });
    }

    Ok(())
}

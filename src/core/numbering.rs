use serde::{Deserialize, Serialize};

/// External invoice number formatting.
///
/// Finalized invoices are numbered `{prefix}-{fiscalYear}-{sequence}` with
/// a zero-padded sequence, e.g. "INV-2024-000042". French tax law requires
/// the sequence to be continuous and gapless per company and fiscal year
/// (Article 242 nonies A, annexe II CGI); gaplessness itself is enforced by
/// the store's atomic finalize commit, not by this formatter. Drafts carry
/// no number at all; there is no "DRAFT" placeholder to collide on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberingScheme {
    prefix: String,
    zero_pad: usize,
}

impl Default for NumberingScheme {
    fn default() -> Self {
        Self {
            prefix: "INV".to_string(),
            zero_pad: 6,
        }
    }
}

impl NumberingScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Set zero-padding width (default: 6, so "000001").
    pub fn with_padding(mut self, width: usize) -> Self {
        self.zero_pad = width;
        self
    }

    /// Format an external number.
    pub fn format(&self, fiscal_year: i32, sequence: u64) -> String {
        format!(
            "{}-{}-{:0>width$}",
            self.prefix,
            fiscal_year,
            sequence,
            width = self.zero_pad
        )
    }

    /// Parse an external number back into (fiscal year, sequence).
    /// Returns None if the prefix or shape does not match this scheme.
    pub fn parse(&self, number: &str) -> Option<(i32, u64)> {
        let rest = number.strip_prefix(&self.prefix)?.strip_prefix('-')?;
        let (year, seq) = rest.split_once('-')?;
        Some((year.parse().ok()?, seq.parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format() {
        let scheme = NumberingScheme::default();
        assert_eq!(scheme.format(2024, 1), "INV-2024-000001");
        assert_eq!(scheme.format(2024, 123456), "INV-2024-123456");
    }

    #[test]
    fn custom_prefix_and_padding() {
        let scheme = NumberingScheme::new("FA").with_padding(4);
        assert_eq!(scheme.format(2025, 42), "FA-2025-0042");
    }

    #[test]
    fn parse_round_trip() {
        let scheme = NumberingScheme::default();
        for seq in [1, 42, 999999, 1000000] {
            let n = scheme.format(2024, seq);
            assert_eq!(scheme.parse(&n), Some((2024, seq)));
        }
    }

    #[test]
    fn parse_rejects_foreign_prefix() {
        let scheme = NumberingScheme::default();
        assert_eq!(scheme.parse("FA-2024-000001"), None);
        assert_eq!(scheme.parse("INV-abcd-000001"), None);
        assert_eq!(scheme.parse("INV-2024"), None);
    }
}

use super::error::ValidationError;
use super::types::Invoice;

/// Validate a draft against the rules every invoice must satisfy before it
/// can be finalized. Returns all errors found (not just the first).
pub fn validate_draft(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice.client.name.trim().is_empty() {
        errors.push(ValidationError::with_article(
            "client.name",
            "client name must not be empty",
            "289 CGI",
        ));
    }

    if invoice.due_date < invoice.issue_date {
        errors.push(ValidationError::new(
            "due_date",
            format!(
                "due date {} precedes issue date {}",
                invoice.due_date, invoice.issue_date
            ),
        ));
    }

    if invoice.currency.trim().is_empty() {
        errors.push(ValidationError::new(
            "currency",
            "currency code must not be empty",
        ));
    } else if invoice.currency.len() != 3 || !invoice.currency.chars().all(|c| c.is_ascii_uppercase())
    {
        errors.push(ValidationError::new(
            "currency",
            "currency code must be 3 uppercase characters (ISO 4217)",
        ));
    }

    if invoice.lines.is_empty() {
        errors.push(ValidationError::with_article(
            "lines",
            "invoice must have at least one line",
            "289 CGI",
        ));
    }

    // Input limit to prevent abuse
    if invoice.lines.len() > 10_000 {
        errors.push(ValidationError::new(
            "lines",
            "invoice cannot have more than 10,000 lines",
        ));
    }

    for (i, line) in invoice.lines.iter().enumerate() {
        let prefix = format!("lines[{i}]");

        if line.description.trim().is_empty() {
            errors.push(ValidationError::with_article(
                format!("{prefix}.description"),
                "line description must not be empty",
                "289 CGI",
            ));
        }

        if line.quantity <= rust_decimal::Decimal::ZERO {
            errors.push(ValidationError::new(
                format!("{prefix}.quantity"),
                "quantity must be greater than zero",
            ));
        }

        if line.unit_price.is_sign_negative() {
            errors.push(ValidationError::new(
                format!("{prefix}.unit_price"),
                "unit price must not be negative",
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::DraftBuilder;
    use crate::core::types::{ClientRef, InvoiceLine, VatRate};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft_with_line(line: InvoiceLine) -> Invoice {
        DraftBuilder::new("inv-1", "acme", date(2024, 6, 15))
            .client(ClientRef::new("c-1", "Dupont SARL"))
            .due_date(date(2024, 7, 15))
            .add_line(line)
            .build_unchecked()
    }

    #[test]
    fn valid_draft_has_no_errors() {
        let draft = draft_with_line(InvoiceLine::new(
            "Conseil",
            dec!(1),
            dec!(100),
            VatRate::Standard,
        ));
        assert!(validate_draft(&draft).is_empty());
    }

    #[test]
    fn empty_lines_rejected() {
        let draft = DraftBuilder::new("inv-1", "acme", date(2024, 6, 15))
            .client(ClientRef::new("c-1", "Dupont SARL"))
            .due_date(date(2024, 7, 15))
            .build_unchecked();
        let errors = validate_draft(&draft);
        assert!(errors.iter().any(|e| e.field == "lines"));
    }

    #[test]
    fn zero_quantity_rejected() {
        let draft = draft_with_line(InvoiceLine::new(
            "Conseil",
            dec!(0),
            dec!(100),
            VatRate::Standard,
        ));
        let errors = validate_draft(&draft);
        assert!(errors.iter().any(|e| e.field == "lines[0].quantity"));
    }

    #[test]
    fn negative_price_rejected() {
        let draft = draft_with_line(InvoiceLine::new(
            "Conseil",
            dec!(1),
            dec!(-5),
            VatRate::Standard,
        ));
        let errors = validate_draft(&draft);
        assert!(errors.iter().any(|e| e.field == "lines[0].unit_price"));
    }

    #[test]
    fn due_before_issue_rejected() {
        let draft = DraftBuilder::new("inv-1", "acme", date(2024, 6, 15))
            .client(ClientRef::new("c-1", "Dupont SARL"))
            .due_date(date(2024, 6, 1))
            .add_line(InvoiceLine::new(
                "Conseil",
                dec!(1),
                dec!(100),
                VatRate::Standard,
            ))
            .build_unchecked();
        let errors = validate_draft(&draft);
        assert!(errors.iter().any(|e| e.field == "due_date"));
    }

    #[test]
    fn all_errors_accumulate() {
        let draft = draft_with_line(InvoiceLine::new("", dec!(0), dec!(-1), VatRate::Standard));
        let errors = validate_draft(&draft);
        assert!(errors.len() >= 3, "expected 3+ errors, got {errors:?}");
    }
}

//! # facture
//!
//! Invoicing ledger core for small businesses and the accounting firms
//! that manage them: mutable drafts become immutable, gaplessly numbered,
//! hash-chained fiscal records, from which the crate derives journal rows,
//! monthly VAT aggregates, an escalating reminder (dunning) workflow, and
//! the statutory FEC export.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating
//! point. All date-dependent operations take their dates explicitly; the
//! core never reads the clock.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use facture::core::*;
//! use facture::ledger::{Ledger, MemoryStore};
//! use rust_decimal_macros::dec;
//!
//! let ledger = Ledger::new(MemoryStore::new());
//! ledger.register_company(Company::new("acme", "ACME SARL"));
//!
//! let draft = DraftBuilder::new("inv-1", "acme", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .client(ClientRef::new("c-7", "Dupont SARL"))
//!     .due_date(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap())
//!     .add_line(InvoiceLine::new("Conseil", dec!(3), dec!(100.00), VatRate::Standard))
//!     .add_line(InvoiceLine::new("Formation", dec!(1), dec!(50.00), VatRate::Intermediate))
//!     .build()
//!     .unwrap();
//! let id = ledger.create_draft(draft).unwrap();
//!
//! let receipt = ledger
//!     .finalize(&id, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .unwrap();
//! assert_eq!(receipt.number, "INV-2024-000001");
//! assert_eq!(receipt.totals.total, dec!(415.00));
//!
//! let verification = ledger.verify_chain(&"acme".into(), 2024).unwrap();
//! assert!(verification.valid);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Invoice types, validation, numbering, hash chain, ledger facade |
//! | `journal` | Journal projection (PCG accounts) and monthly aggregates |
//! | `dunning` | Overdue-reminder escalation state machine |
//! | `fec` | Statutory FEC export (implies `journal`) |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod chain;

#[cfg(feature = "core")]
pub mod ledger;

#[cfg(feature = "journal")]
pub mod journal;

#[cfg(feature = "dunning")]
pub mod dunning;

#[cfg(feature = "fec")]
pub mod fec;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

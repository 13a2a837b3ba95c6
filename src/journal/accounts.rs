//! Chart of accounts for journal projection.
//!
//! Defaults follow the French Plan Comptable Général: 411 clients,
//! 401 fournisseurs, 706 prestations, 606 achats, 44571 TVA collectée,
//! 44566 TVA déductible. All codes are configuration: a deployment on a
//! different chart swaps the codes, not the projector.

use serde::{Deserialize, Serialize};

/// A general-ledger account: code plus human label (FEC CompteNum /
/// CompteLib).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: String,
    pub label: String,
}

impl Account {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// Accounts the projector posts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    /// Trade receivables (clients).
    pub receivable: Account,
    /// Revenue from services/sales.
    pub revenue: Account,
    /// VAT collected on sales.
    pub vat_collected: Account,
    /// Trade payables (suppliers).
    pub supplier: Account,
    /// Purchases / external charges.
    pub expense: Account,
    /// Deductible VAT on purchases.
    pub vat_deductible: Account,
}

impl Default for ChartOfAccounts {
    fn default() -> Self {
        Self {
            receivable: Account::new("411000", "Clients"),
            revenue: Account::new("706000", "Prestations de services"),
            vat_collected: Account::new("445710", "TVA collectée"),
            supplier: Account::new("401000", "Fournisseurs"),
            expense: Account::new("606000", "Achats non stockés"),
            vat_deductible: Account::new("445660", "TVA déductible"),
        }
    }
}

/// Journal a row belongs to (FEC JournalCode / JournalLib).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalCode {
    /// Sales journal.
    Sales,
    /// Purchases journal.
    Purchases,
}

impl JournalCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sales => "VE",
            Self::Purchases => "AC",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sales => "Ventes",
            Self::Purchases => "Achats",
        }
    }
}

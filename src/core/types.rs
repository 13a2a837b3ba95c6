use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Company identifier, assigned by the surrounding system.
    CompanyId
);
string_id!(
    /// Invoice identifier, assigned by the surrounding system.
    /// Never part of the numbering domain: sequence numbers exist only
    /// on finalized invoices.
    InvoiceId
);
string_id!(
    /// Client identifier, assigned by the surrounding system.
    ClientId
);
string_id!(
    /// Expense identifier, assigned by the surrounding system.
    ExpenseId
);

/// A company whose invoices this ledger records.
///
/// The company record itself (addresses, bank details, logo…) lives in the
/// surrounding system; the ledger only needs identity, the fiscal-year
/// configuration, and the ledger currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// First month of the fiscal year (1–12). 1 = calendar-year accounting.
    pub fiscal_year_start_month: u32,
    /// Ledger currency (ISO 4217). Assumed "EUR", 2 decimal places.
    pub currency: String,
}

impl Company {
    pub fn new(id: impl Into<CompanyId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fiscal_year_start_month: 1,
            currency: "EUR".to_string(),
        }
    }

    pub fn with_fiscal_year_start(mut self, month: u32) -> Self {
        self.fiscal_year_start_month = month;
        self
    }

    /// Fiscal year containing `date`, labeled by the calendar year in which
    /// the fiscal year begins. With a January start this is the calendar
    /// year; with an April start, 2024-03-15 belongs to fiscal year 2023.
    pub fn fiscal_year_of(&self, date: NaiveDate) -> i32 {
        if date.month() >= self.fiscal_year_start_month {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// First day of the given fiscal year.
    pub fn fiscal_year_start(&self, fiscal_year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(fiscal_year, self.fiscal_year_start_month, 1)
            .expect("month 1-12 with day 1 is always a valid date")
    }

    /// Day after the last day of the given fiscal year (exclusive end).
    pub fn fiscal_year_end_exclusive(&self, fiscal_year: i32) -> NaiveDate {
        self.fiscal_year_start(fiscal_year + 1)
    }
}

/// Client snapshot carried on the invoice.
///
/// The client registry belongs to the surrounding system; the invoice keeps
/// an immutable copy of the identity it was addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: ClientId,
    pub name: String,
}

impl ClientRef {
    pub fn new(id: impl Into<ClientId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Product record used to pre-fill invoice lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub label: String,
    pub unit_price: Decimal,
    pub vat_rate: VatRate,
}

/// French VAT rates (Article 278 sqq. CGI). The legal set is closed:
/// arbitrary percentages are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VatRate {
    /// 0 % — exempt or zero-rated supplies.
    Zero,
    /// 2.1 % — press, reimbursable medicines.
    SuperReduced,
    /// 5.5 % — essential goods.
    Reduced,
    /// 10 % — intermediate rate.
    Intermediate,
    /// 20 % — standard rate.
    Standard,
}

impl VatRate {
    /// Rate as a percentage.
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Zero => dec!(0),
            Self::SuperReduced => dec!(2.1),
            Self::Reduced => dec!(5.5),
            Self::Intermediate => dec!(10),
            Self::Standard => dec!(20),
        }
    }

    /// Parse from a percentage value.
    pub fn from_rate(rate: Decimal) -> Option<Self> {
        [
            Self::Zero,
            Self::SuperReduced,
            Self::Reduced,
            Self::Intermediate,
            Self::Standard,
        ]
        .into_iter()
        .find(|r| r.rate() == rate)
    }
}

/// One invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    /// Invoiced quantity, must be > 0.
    pub quantity: Decimal,
    /// Net price per unit, must be >= 0.
    pub unit_price: Decimal,
    pub vat_rate: VatRate,
    /// Net line amount, rounded at the line level.
    /// Set by totals computation.
    pub net: Option<Decimal>,
    /// VAT for this line, rounded at the line level.
    /// Set by totals computation.
    pub vat: Option<Decimal>,
}

impl InvoiceLine {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        vat_rate: VatRate,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            vat_rate,
            net: None,
            vat: None,
        }
    }

    /// Pre-fill a line from a product record.
    pub fn from_product(product: &Product, quantity: Decimal) -> Self {
        Self::new(
            product.label.clone(),
            quantity,
            product.unit_price,
            product.vat_rate,
        )
    }
}

/// Invoice lifecycle status.
///
/// Draft invoices are freely mutable and deletable; they carry no sequence
/// number and no chain hashes. Finalization seals lines, amounts, number
/// and hashes forever; afterwards only the status (to Paid or Cancelled)
/// and the dunning fields may change. Finalized invoices are never deleted:
/// cancellation is a status flag, so the chain keeps its continuity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Finalized,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Whether the invoice has been sealed into the chain.
    pub fn is_sealed(&self) -> bool {
        !matches!(self, Self::Draft)
    }
}

/// Dunning escalation level.
///
/// Ordered: escalation only ever moves forward while the invoice is unpaid;
/// payment resets to `None`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum DunningLevel {
    #[default]
    None,
    FirstNotice,
    SecondNotice,
    FormalNotice,
    Legal,
}

/// Dunning state carried on the invoice, the only fields besides status
/// that stay mutable after finalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DunningStatus {
    pub level: DunningLevel,
    /// Date of the most recent reminder, if any.
    pub last_reminder: Option<NaiveDate>,
}

/// An invoice: mutable draft or immutable fiscal record, depending on
/// status. Mandatory mentions (Article 289 CGI) are enforced at validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub company_id: CompanyId,
    pub client: ClientRef,
    pub status: InvoiceStatus,
    /// Gapless per-(company, fiscal year) sequence. None while draft.
    pub sequence: Option<u64>,
    /// Formatted external number, e.g. "INV-2024-000042". None while draft.
    pub number: Option<String>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    /// Ordered lines; non-empty once finalized.
    pub lines: Vec<InvoiceLine>,
    /// Computed totals, set at build/update time and re-verified with
    /// zero tolerance at finalization.
    pub totals: Option<Totals>,
    /// Chain digest of the previous finalized invoice (genesis constant for
    /// sequence 1). None while draft.
    pub prev_hash: Option<String>,
    /// This invoice's chain digest. None while draft.
    pub self_hash: Option<String>,
    pub dunning: DunningStatus,
    /// Date the invoice was finalized (FEC ValidDate). None while draft.
    pub finalized_on: Option<NaiveDate>,
    /// Date the payment event was recorded. None until paid.
    pub paid_on: Option<NaiveDate>,
}

impl Invoice {
    /// Days overdue at `today`. Zero or negative means not overdue.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days()
    }
}

/// Invoice totals, derived from the lines.
///
/// All three amounts are sums of *already rounded* line amounts — VAT is
/// never computed on the aggregate base, so the stored totals always agree
/// with the tax authority's per-line expectation to the cent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of rounded line net amounts.
    pub subtotal: Decimal,
    /// Sum of rounded line VAT amounts.
    pub vat_total: Decimal,
    /// subtotal + vat_total.
    pub total: Decimal,
    /// Per-rate breakdown, sorted by rate for deterministic output.
    pub vat_breakdown: Vec<VatBreakdown>,
}

/// VAT breakdown per rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub vat_rate: VatRate,
    /// Sum of rounded line nets taxed at this rate.
    pub taxable_amount: Decimal,
    /// Sum of rounded line VAT amounts at this rate.
    pub vat_amount: Decimal,
}

/// A recorded purchase, consumed by the journal projector symmetrically to
/// invoices (debit expense + deductible VAT, credit supplier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub company_id: CompanyId,
    pub date: NaiveDate,
    pub label: String,
    pub supplier: String,
    /// Net amount, 2 decimals.
    pub net: Decimal,
    pub vat_rate: VatRate,
}

impl Expense {
    /// Deductible VAT, rounded half-up to 2 decimals.
    pub fn vat(&self) -> Decimal {
        crate::core::amounts::round_half_up(self.net * self.vat_rate.rate() / dec!(100), 2)
    }

    /// Gross amount owed to the supplier.
    pub fn gross(&self) -> Decimal {
        self.net + self.vat()
    }
}

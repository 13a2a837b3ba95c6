//! Dunning: escalating reminders on overdue invoices.
//!
//! The level is a function of days overdue only, and transitions are
//! monotonic forward while the invoice stays unpaid; payment resets the
//! state and ends the workflow. Reminder *delivery* is someone else's job:
//! this module records "reminder sent at T" and never blocks on or retries
//! the mail subsystem.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{DunningLevel, Invoice, InvoiceId, InvoiceStatus};

/// Escalation thresholds (days overdue) and the reminder cooldown.
///
/// The day boundaries are the common convention, not universal law, so
/// they are deployment configuration, not constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DunningConfig {
    /// Days overdue at which the first notice is due.
    pub first_notice_after: i64,
    pub second_notice_after: i64,
    pub formal_notice_after: i64,
    pub legal_after: i64,
    /// Minimum days between two reminders for the same invoice.
    pub cooldown_days: i64,
}

impl Default for DunningConfig {
    fn default() -> Self {
        Self {
            first_notice_after: 1,
            second_notice_after: 15,
            formal_notice_after: 30,
            legal_after: 60,
            cooldown_days: 7,
        }
    }
}

/// Builder for [`DunningConfig`].
pub struct DunningConfigBuilder {
    config: DunningConfig,
}

impl DunningConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DunningConfig::default(),
        }
    }

    pub fn thresholds(mut self, first: i64, second: i64, formal: i64, legal: i64) -> Self {
        self.config.first_notice_after = first;
        self.config.second_notice_after = second;
        self.config.formal_notice_after = formal;
        self.config.legal_after = legal;
        self
    }

    pub fn cooldown_days(mut self, days: i64) -> Self {
        self.config.cooldown_days = days;
        self
    }

    pub fn build(self) -> DunningConfig {
        self.config
    }
}

impl Default for DunningConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Level an invoice *should* be at for the given days overdue.
pub fn level_for(days_overdue: i64, config: &DunningConfig) -> DunningLevel {
    if days_overdue >= config.legal_after {
        DunningLevel::Legal
    } else if days_overdue >= config.formal_notice_after {
        DunningLevel::FormalNotice
    } else if days_overdue >= config.second_notice_after {
        DunningLevel::SecondNotice
    } else if days_overdue >= config.first_notice_after {
        DunningLevel::FirstNotice
    } else {
        DunningLevel::None
    }
}

/// A planned forward transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub invoice_id: InvoiceId,
    pub from: DunningLevel,
    pub to: DunningLevel,
}

/// Record of a reminder considered sent (fire-and-forget; delivery is the
/// mail subsystem's concern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub invoice_id: InvoiceId,
    pub level: DunningLevel,
    pub sent_on: NaiveDate,
}

/// A reminder withheld because the previous one is too recent. Expected
/// control flow: logged and skipped, never surfaced as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownViolation {
    pub invoice_id: InvoiceId,
    pub last_reminder: Option<NaiveDate>,
    /// First date a reminder may be sent again.
    pub retry_after: NaiveDate,
}

/// Outcome of a manual reminder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderOutcome {
    Sent(ReminderNotice),
    Skipped(CooldownViolation),
}

/// What one sweep did: escalations applied, reminders recorded, reminders
/// suppressed by cooldown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub escalations: Vec<Escalation>,
    pub reminders: Vec<ReminderNotice>,
    pub skipped: Vec<CooldownViolation>,
}

impl SweepReport {
    /// True when the sweep changed nothing, the signature of a repeated
    /// run over unchanged data.
    pub fn is_noop(&self) -> bool {
        self.escalations.is_empty() && self.reminders.is_empty() && self.skipped.is_empty()
    }
}

/// Decide whether the invoice's level must advance at `today`.
///
/// Returns `None` for anything that is not an unpaid finalized invoice, for
/// invoices not yet overdue, and whenever the computed target does not
/// exceed the current level; the state never silently regresses while
/// unpaid.
pub fn plan_escalation(
    invoice: &Invoice,
    today: NaiveDate,
    config: &DunningConfig,
) -> Option<Escalation> {
    if invoice.status != InvoiceStatus::Finalized {
        return None;
    }
    let target = level_for(invoice.days_overdue(today), config);
    if target > invoice.dunning.level {
        Some(Escalation {
            invoice_id: invoice.id.clone(),
            from: invoice.dunning.level,
            to: target,
        })
    } else {
        None
    }
}

/// Check the reminder cooldown for an invoice at `today`.
pub fn check_cooldown(
    invoice: &Invoice,
    today: NaiveDate,
    config: &DunningConfig,
) -> Result<(), CooldownViolation> {
    match invoice.dunning.last_reminder {
        Some(last) if (today - last).num_days() < config.cooldown_days => {
            Err(CooldownViolation {
                invoice_id: invoice.id.clone(),
                last_reminder: Some(last),
                retry_after: last + chrono::Duration::days(config.cooldown_days),
            })
        }
        _ => Ok(()),
    }
}

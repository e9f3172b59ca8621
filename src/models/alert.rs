//! # models::alert
//!
//! [`AlertEvent`]s are created by the reconciliation engine, handed straight to
//! the notification sender, never persisted.

use serde::Serialize;

/// Which period low was breached. Declared from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LowPeriod {
    FiveYear,
    ThreeYear,
    YearToDate,
}

impl LowPeriod {
    pub fn label(self) -> &'static str {
        match self {
            LowPeriod::FiveYear => "5-year low",
            LowPeriod::ThreeYear => "3-year low",
            LowPeriod::YearToDate => "YTD low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PnlDirection {
    Gain,
    Loss,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    /// Current price at or below a period low.
    PeriodLow { period: LowPeriod, low: f64 },
    /// Unrealised profit/loss magnitude reached the entry threshold.
    Threshold {
        direction:     PnlDirection,
        threshold_pct: f64,
        actual_pct:    f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub kind:          AlertKind,
    pub entry_name:    String,
    pub ticker_symbol: String,
    pub message_body:  String,
}

impl AlertEvent {
    pub fn severity_label(&self) -> &'static str {
        match &self.kind {
            AlertKind::PeriodLow { period, .. } => period.label(),
            AlertKind::Threshold { direction: PnlDirection::Gain, .. } => "gain",
            AlertKind::Threshold { direction: PnlDirection::Loss, .. } => "loss",
        }
    }

    pub fn is_period_low(&self) -> bool {
        matches!(self.kind, AlertKind::PeriodLow { .. })
    }

    /// Final push text, tagged with where the check came from.
    pub fn notification_text(&self, origin: Origin) -> String {
        format!("[{}] {}", origin.label(), self.message_body)
    }
}

/// What triggered the reconciliation that produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Scheduled,
    Manual,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::Scheduled => "Scheduled",
            Origin::Manual => "Manual check",
        }
    }
}

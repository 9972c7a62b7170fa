use jiff::civil::Date;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    #[serde(alias = "deposit", alias = "Deposit")]
    Deposit,
    #[serde(alias = "withdrawal", alias = "Withdrawal")]
    Withdrawal,
}

impl EventKind {
    pub fn sign(self) -> f64 {
        match self {
            EventKind::Deposit => 1.0,
            EventKind::Withdrawal => -1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    #[serde(alias = "once", alias = "Once")]
    Once,
    #[serde(alias = "monthly", alias = "Monthly")]
    Monthly,
    #[serde(alias = "annual", alias = "Annual")]
    Annual,
}

/// A recurring or one-off cash flow applied to the projected balance.
#[derive(Debug, Clone, PartialEq)]
pub struct MonetaryEvent {
    pub kind: EventKind,
    pub amount: f64,
    pub frequency: Frequency,
    pub start_date: Date,
    /// Inclusive at month granularity. `None` never ends.
    pub end_date: Option<Date>,
}

/// Year/month pair used to compare dates while ignoring the day of month.
///
/// Field order matters: the derived ordering compares `year` first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct MonthAnchor {
    pub year: i16,
    /// 1..=12
    pub month: i8,
}

impl MonthAnchor {
    pub fn new(year: i16, month: i8) -> Self {
        Self { year, month }
    }
}

impl From<Date> for MonthAnchor {
    fn from(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// A [`MonetaryEvent`] with its sign resolved and its dates reduced to month anchors,
/// ready for the per-month trigger check.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    pub amount: f64,
    pub frequency: Frequency,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub sign: f64,
    pub start_month: MonthAnchor,
    pub end_month: Option<MonthAnchor>,
}

/// Everything a projection needs: starting balance, rate, events and the last year.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    pub initial_wealth: f64,
    /// Nominal annual rate, 0.04 = 4%.
    pub annual_rate: f64,
    pub events: Vec<MonetaryEvent>,
    /// Inclusive.
    pub horizon_year: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSnapshot {
    pub year: i16,
    pub projected_value: f64,
}

/// Inputs to the required-contribution solver. `months` is the saving horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestionQuery {
    pub present_value: f64,
    pub target_sum: f64,
    pub months: u32,
    pub annual_rate: f64,
}

/// Monthly contribution, rounded up to whole units, that closes the gap to the target.
/// `already_met` is set when present value alone reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSuggestion {
    pub required_monthly: u64,
    pub already_met: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentStatus {
    Green,
    LightYellow,
    DarkYellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    /// Percentage of current wealth committed to goals, 2 decimals.
    pub alignment_percent: String,
    pub status: AlignmentStatus,
    pub current_wealth: f64,
    pub total_goals: f64,
}

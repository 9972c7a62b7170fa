use tracing::debug;

use super::events::{fires, normalize_events};
use super::types::{SimulationRun, YearSnapshot};

/// Monthly rate `i` with `(1 + i)^12 = 1 + annual_rate`.
pub fn monthly_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// Calendar year of the local clock.
pub fn current_year() -> i16 {
    jiff::Zoned::now().year()
}

/// Year-by-year projection from `current_year` through `run.horizon_year`.
///
/// Each month applies every triggered event (flooring the balance at zero after
/// each one) and then one month of interest. Values are rounded to cents only
/// when a year's snapshot is taken.
pub fn project(run: &SimulationRun, current_year: i16) -> Vec<YearSnapshot> {
    if run.initial_wealth <= 0.0 || current_year > run.horizon_year {
        return Vec::new();
    }

    let events = normalize_events(&run.events);
    let growth = 1.0 + monthly_rate(run.annual_rate);
    let mut value = run.initial_wealth;
    let mut snapshots =
        Vec::with_capacity((i32::from(run.horizon_year) - i32::from(current_year) + 1) as usize);

    for year in current_year..=run.horizon_year {
        for month in 1..=12 {
            for event in events.iter().filter(|ev| fires(ev, year, month)) {
                value += event.sign * event.amount;
                if value < 0.0 {
                    value = 0.0;
                }
            }
            value *= growth;
        }
        snapshots.push(YearSnapshot {
            year,
            projected_value: round_cents(value),
        });
    }

    debug!(
        years = snapshots.len(),
        events = events.len(),
        final_value = value,
        "projection complete"
    );
    snapshots
}

/// [`project`] against the real clock.
pub fn project_now(run: &SimulationRun) -> Vec<YearSnapshot> {
    project(run, current_year())
}

/// Plain compounding curve with no cash-flow events.
pub fn project_curve(
    initial_wealth: f64,
    annual_rate: f64,
    horizon_year: i16,
    current_year: i16,
) -> Vec<YearSnapshot> {
    project(
        &SimulationRun {
            initial_wealth,
            annual_rate,
            events: Vec::new(),
            horizon_year,
        },
        current_year,
    )
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

mod alignment;
mod engine;
mod events;
mod solver;
mod types;

pub use alignment::alignment;
pub use engine::{current_year, monthly_rate, project, project_curve, project_now};
pub use events::{fires, normalize_event, normalize_events};
pub use solver::required_monthly;
pub use types::{
    Alignment, AlignmentStatus, ContributionSuggestion, EventKind, Frequency, MonetaryEvent,
    MonthAnchor, NormalizedEvent, SimulationRun, SuggestionQuery, YearSnapshot,
};

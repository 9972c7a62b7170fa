use super::types::{Alignment, AlignmentStatus};

/// Share of current wealth that the goal targets represent, banded into a status.
///
/// Returns `None` when there is no wealth to compare against.
pub fn alignment(current_wealth: f64, goal_targets: &[f64]) -> Option<Alignment> {
    if current_wealth == 0.0 {
        return None;
    }

    let total_goals: f64 = goal_targets.iter().sum();
    let percent = total_goals / current_wealth * 100.0;
    let status = if percent > 90.0 {
        AlignmentStatus::Green
    } else if percent > 70.0 {
        AlignmentStatus::LightYellow
    } else if percent > 50.0 {
        AlignmentStatus::DarkYellow
    } else {
        AlignmentStatus::Red
    };

    Some(Alignment {
        alignment_percent: format!("{percent:.2}"),
        status,
        current_wealth,
        total_goals,
    })
}

use tracing::debug;

use super::engine::monthly_rate;
use super::types::{ContributionSuggestion, SuggestionQuery};

/// Level monthly deposit that grows `present_value` into `target_sum` after
/// `months` months, using the same monthly-equivalent rate as the projection.
///
/// Rounded up to a whole currency unit. Degenerate results (zero rate, zero
/// months) collapse to 0.
pub fn required_monthly(query: SuggestionQuery) -> ContributionSuggestion {
    let i = monthly_rate(query.annual_rate);
    let growth = (1.0 + i).powf(f64::from(query.months));
    let future_value_no_contribution = query.present_value * growth;

    if query.target_sum <= future_value_no_contribution {
        debug!(
            target_sum = query.target_sum,
            future_value = future_value_no_contribution,
            "target already reachable"
        );
        return ContributionSuggestion {
            required_monthly: 0,
            already_met: true,
        };
    }

    let mut payment = ((query.target_sum - future_value_no_contribution) * i) / (growth - 1.0);
    if !payment.is_finite() || payment < 0.0 {
        payment = 0.0;
    }

    ContributionSuggestion {
        required_monthly: payment.ceil() as u64,
        already_met: false,
    }
}

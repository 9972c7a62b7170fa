use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use crate::core::{
    EventKind, Frequency, MonetaryEvent, MonthAnchor, SimulationRun, SuggestionQuery,
};

pub const DEFAULT_ANNUAL_RATE: f64 = 0.04;
pub const MAX_HORIZON_YEAR: i16 = 2060;
pub const DEFAULT_SUGGESTION_MONTHS: u32 = 24;
pub const MAX_SUGGESTION_MONTHS: u32 = 600;

/// Event as it arrives on the wire. Dates are text until decoded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(alias = "amount")]
    pub value: f64,
    pub frequency: Frequency,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Decoded event echoed back to the caller with canonical dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub value: f64,
    pub frequency: Frequency,
    pub start_date: Date,
    pub end_date: Option<Date>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionPayload {
    pub initial_wealth: Option<f64>,
    /// Raw rate text or number; see [`resolve_annual_rate`].
    pub rate: Option<Value>,
    pub horizon_year: Option<i16>,
    pub events: Vec<EventPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationPayload {
    pub initial_wealth: Option<f64>,
    pub rate_annual: Option<f64>,
    pub end_year: Option<i16>,
    pub title: Option<String>,
    pub events: Vec<EventPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuggestionPayload {
    #[serde(alias = "totalWealth")]
    pub present_value: Option<f64>,
    pub target_sum: Option<f64>,
    pub goal_targets: Option<Vec<f64>>,
    pub months: Option<u32>,
    pub rate_annual: Option<f64>,
}

/// Query-string form of [`SuggestionPayload`]. `goalTargets` is comma separated,
/// e.g. `goalTargets=5000,2500`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuggestionQueryParams {
    #[serde(alias = "totalWealth")]
    pub present_value: Option<f64>,
    pub target_sum: Option<f64>,
    pub goal_targets: Option<String>,
    pub months: Option<u32>,
    pub rate_annual: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlignmentPayload {
    pub current_wealth: Option<f64>,
    pub goal_targets: Vec<f64>,
}

#[derive(Debug)]
pub struct ProjectionRequest {
    pub run: SimulationRun,
}

#[derive(Debug)]
pub struct SimulationRequest {
    pub title: Option<String>,
    pub run: SimulationRun,
    pub events_snapshot: Vec<EventSnapshot>,
}

#[derive(Debug)]
pub struct SuggestionRequest {
    pub query: SuggestionQuery,
}

/// Interprets a free-form annual rate parameter.
///
/// Values above 1 are percentages (`"5"` is 5%). Missing, empty or unparseable
/// input falls back to [`DEFAULT_ANNUAL_RATE`].
pub fn resolve_annual_rate(raw: Option<&str>) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_ANNUAL_RATE;
    };
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => {
            if n > 1.0 {
                n / 100.0
            } else {
                n
            }
        }
        _ => DEFAULT_ANNUAL_RATE,
    }
}

/// Accepts RFC 3339 timestamps (taken at UTC), civil datetimes and plain dates.
pub fn parse_event_date(text: &str) -> Option<Date> {
    let text = text.trim();
    if let Ok(ts) = text.parse::<jiff::Timestamp>() {
        return Some(ts.to_zoned(TimeZone::UTC).date());
    }
    if let Ok(dt) = text.parse::<DateTime>() {
        return Some(dt.date());
    }
    text.parse::<Date>().ok()
}

pub fn decode_event(payload: &EventPayload) -> ApiResult<EventSnapshot> {
    if !payload.value.is_finite() || payload.value <= 0.0 {
        return Err(ApiError::validation("event value must be > 0"));
    }

    let start_date =
        parse_event_date(&payload.start_date).ok_or_else(|| ApiError::InvalidDate {
            field: "startDate",
            value: payload.start_date.clone(),
        })?;
    let end_date = match payload.end_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) => Some(parse_event_date(text).ok_or_else(|| ApiError::InvalidDate {
            field: "endDate",
            value: text.to_string(),
        })?),
    };

    if let Some(end) = end_date {
        if MonthAnchor::from(end) < MonthAnchor::from(start_date) {
            return Err(ApiError::validation(
                "event endDate must not precede startDate",
            ));
        }
    }

    Ok(EventSnapshot {
        id: payload.id.clone(),
        kind: payload.kind,
        value: payload.value,
        frequency: payload.frequency,
        start_date,
        end_date,
    })
}

pub fn decode_events(payloads: &[EventPayload]) -> ApiResult<Vec<EventSnapshot>> {
    payloads.iter().map(decode_event).collect()
}

impl From<&EventSnapshot> for MonetaryEvent {
    fn from(snapshot: &EventSnapshot) -> Self {
        MonetaryEvent {
            kind: snapshot.kind,
            amount: snapshot.value,
            frequency: snapshot.frequency,
            start_date: snapshot.start_date,
            end_date: snapshot.end_date,
        }
    }
}

fn rate_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn require_wealth(value: Option<f64>) -> ApiResult<f64> {
    let Some(wealth) = value else {
        return Err(ApiError::validation("initialWealth is required"));
    };
    if !wealth.is_finite() || wealth <= 0.0 {
        return Err(ApiError::validation("client has no current wealth"));
    }
    Ok(wealth)
}

pub fn projection_request_from_payload(payload: ProjectionPayload) -> ApiResult<ProjectionRequest> {
    let initial_wealth = require_wealth(payload.initial_wealth)?;

    let raw_rate = payload.rate.as_ref().and_then(rate_text);
    let annual_rate = resolve_annual_rate(raw_rate.as_deref());
    if annual_rate <= -0.99 || annual_rate > 1.5 {
        return Err(ApiError::validation("invalid annual rate"));
    }

    let horizon_year = payload.horizon_year.unwrap_or(MAX_HORIZON_YEAR);
    if horizon_year > MAX_HORIZON_YEAR {
        return Err(ApiError::validation(format!(
            "horizonYear must be <= {MAX_HORIZON_YEAR}"
        )));
    }

    let events = decode_events(&payload.events)?;
    Ok(ProjectionRequest {
        run: SimulationRun {
            initial_wealth,
            annual_rate,
            events: events.iter().map(MonetaryEvent::from).collect(),
            horizon_year,
        },
    })
}

pub fn simulation_request_from_payload(
    payload: SimulationPayload,
    current_year: i16,
) -> ApiResult<SimulationRequest> {
    let initial_wealth = require_wealth(payload.initial_wealth)?;

    let annual_rate = payload.rate_annual.unwrap_or(DEFAULT_ANNUAL_RATE);
    if !annual_rate.is_finite() || annual_rate <= 0.0 || annual_rate > 2.0 {
        return Err(ApiError::validation("rateAnnual must be > 0 and <= 2"));
    }

    let end_year = payload.end_year.unwrap_or(MAX_HORIZON_YEAR);
    if !(current_year..=MAX_HORIZON_YEAR).contains(&end_year) {
        return Err(ApiError::validation(format!(
            "endYear must be between {current_year} and {MAX_HORIZON_YEAR}"
        )));
    }

    let title = match payload.title {
        Some(title) if title.trim().is_empty() => {
            return Err(ApiError::validation("title must not be empty"));
        }
        title => title,
    };

    let events_snapshot = decode_events(&payload.events)?;
    Ok(SimulationRequest {
        title,
        run: SimulationRun {
            initial_wealth,
            annual_rate,
            events: events_snapshot.iter().map(MonetaryEvent::from).collect(),
            horizon_year: end_year,
        },
        events_snapshot,
    })
}

fn split_goal_targets(raw: &str) -> ApiResult<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<f64>().map_err(|_| {
                ApiError::validation(format!("goalTargets has a non-numeric entry: {part:?}"))
            })
        })
        .collect()
}

pub fn suggestion_payload_from_query(
    params: SuggestionQueryParams,
) -> ApiResult<SuggestionPayload> {
    let goal_targets = params
        .goal_targets
        .as_deref()
        .map(split_goal_targets)
        .transpose()?;

    Ok(SuggestionPayload {
        present_value: params.present_value,
        target_sum: params.target_sum,
        goal_targets,
        months: params.months,
        rate_annual: params.rate_annual,
    })
}

pub fn suggestion_request_from_payload(payload: SuggestionPayload) -> ApiResult<SuggestionRequest> {
    let Some(present_value) = payload.present_value else {
        return Err(ApiError::validation("presentValue is required"));
    };
    if !present_value.is_finite() {
        return Err(ApiError::validation("presentValue must be finite"));
    }

    let target_sum = match (payload.target_sum, payload.goal_targets) {
        (Some(sum), _) => sum,
        (None, Some(targets)) => {
            if targets.iter().any(|t| !t.is_finite() || *t <= 0.0) {
                return Err(ApiError::validation("goal targets must be > 0"));
            }
            targets.iter().sum()
        }
        (None, None) => return Err(ApiError::validation("targetSum or goalTargets is required")),
    };
    if !target_sum.is_finite() || target_sum < 0.0 {
        return Err(ApiError::validation("targetSum must be >= 0"));
    }

    let months = payload.months.unwrap_or(DEFAULT_SUGGESTION_MONTHS);
    if !(1..=MAX_SUGGESTION_MONTHS).contains(&months) {
        return Err(ApiError::validation(format!(
            "months must be between 1 and {MAX_SUGGESTION_MONTHS}"
        )));
    }

    let annual_rate = payload.rate_annual.unwrap_or(DEFAULT_ANNUAL_RATE);
    if !(0.0..=1.0).contains(&annual_rate) {
        return Err(ApiError::validation("rateAnnual must be between 0 and 1"));
    }

    Ok(SuggestionRequest {
        query: SuggestionQuery {
            present_value: present_value.max(0.0),
            target_sum,
            months,
            annual_rate,
        },
    })
}

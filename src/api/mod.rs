mod error;
mod payload;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::core::{
    Alignment, ContributionSuggestion, SuggestionQuery, YearSnapshot, alignment, current_year,
    project, required_monthly,
};

pub use error::{ApiError, ApiResult};
pub use payload::{
    AlignmentPayload, DEFAULT_ANNUAL_RATE, DEFAULT_SUGGESTION_MONTHS, EventPayload,
    EventSnapshot, MAX_HORIZON_YEAR, MAX_SUGGESTION_MONTHS, ProjectionPayload, SimulationPayload,
    SuggestionPayload, SuggestionQueryParams, decode_events, parse_event_date,
    projection_request_from_payload, resolve_annual_rate, simulation_request_from_payload,
    suggestion_payload_from_query, suggestion_request_from_payload,
};

/// Shared handler state. A pinned year replaces the clock for every projection.
#[derive(Copy, Clone, Debug, Default)]
pub struct AppState {
    pinned_year: Option<i16>,
}

impl AppState {
    pub fn new(pinned_year: Option<i16>) -> Self {
        Self { pinned_year }
    }

    pub fn current_year(&self) -> i16 {
        self.pinned_year.unwrap_or_else(current_year)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    rate_annual: f64,
    events_count: usize,
    projection: Vec<YearSnapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationResponse {
    title: Option<String>,
    rate_annual: f64,
    end_year: i16,
    initial_wealth: f64,
    events_snapshot: Vec<EventSnapshot>,
    result: Vec<YearSnapshot>,
    created_at: jiff::Timestamp,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub total_wealth: f64,
    pub total_goals: f64,
    pub months: u32,
    pub rate_annual: f64,
    pub required_monthly: u64,
    pub already_met: bool,
    pub suggestions: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/projection", post(projection_handler))
        .route("/api/simulations", post(simulation_handler))
        .route(
            "/api/suggestions",
            get(suggestion_get_handler).post(suggestion_post_handler),
        )
        .route("/api/alignment", post(alignment_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, pinned_year = ?state.pinned_year, "projection API listening");

    axum::serve(listener, router(state)).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    ApiError::NotFound.into_response()
}

async fn projection_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProjectionPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let request = projection_request_from_payload(payload)?;
    let year = state.current_year();
    debug!(
        year,
        horizon_year = request.run.horizon_year,
        events = request.run.events.len(),
        "running projection"
    );

    let projection = project(&request.run, year);
    Ok(json_response(
        StatusCode::OK,
        ProjectionResponse {
            rate_annual: round_to(request.run.annual_rate, 6),
            events_count: request.run.events.len(),
            projection,
        },
    ))
}

async fn simulation_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimulationPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let year = state.current_year();
    let request = simulation_request_from_payload(payload, year)?;
    let result = project(&request.run, year);
    info!(
        title = request.title.as_deref().unwrap_or(""),
        end_year = request.run.horizon_year,
        years = result.len(),
        "simulation snapshot created"
    );

    Ok(json_response(
        StatusCode::CREATED,
        SimulationResponse {
            title: request.title,
            rate_annual: request.run.annual_rate,
            end_year: request.run.horizon_year,
            initial_wealth: request.run.initial_wealth,
            events_snapshot: request.events_snapshot,
            result,
            created_at: jiff::Timestamp::now(),
        },
    ))
}

async fn suggestion_get_handler(
    params: Result<Query<SuggestionQueryParams>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(params) = params?;
    suggestion_handler_impl(suggestion_payload_from_query(params)?)
}

async fn suggestion_post_handler(
    payload: Result<Json<SuggestionPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    suggestion_handler_impl(payload)
}

fn suggestion_handler_impl(payload: SuggestionPayload) -> ApiResult<Response> {
    let request = suggestion_request_from_payload(payload)?;
    let suggestion = required_monthly(request.query);
    Ok(json_response(
        StatusCode::OK,
        build_suggestion_response(request.query, suggestion),
    ))
}

async fn alignment_handler(
    payload: Result<Json<AlignmentPayload>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(payload) = payload?;
    let Some(wealth) = payload.current_wealth else {
        return Err(ApiError::validation("currentWealth is required"));
    };
    let result: Alignment = alignment(wealth, &payload.goal_targets)
        .ok_or_else(|| ApiError::validation("current wealth is 0"))?;
    Ok(json_response(StatusCode::OK, result))
}

pub fn build_suggestion_response(
    query: SuggestionQuery,
    suggestion: ContributionSuggestion,
) -> SuggestionResponse {
    let message = if suggestion.already_met {
        "Goals are already reachable within the considered horizon.".to_string()
    } else {
        format!(
            "Increase contributions by {} per month for {} months to reach the goals.",
            suggestion.required_monthly, query.months
        )
    };

    SuggestionResponse {
        total_wealth: query.present_value,
        total_goals: query.target_sum,
        months: query.months,
        rate_annual: query.annual_rate,
        required_monthly: suggestion.required_monthly,
        already_met: suggestion.already_met,
        suggestions: vec![message],
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const YEAR: i16 = 2030;

    fn app() -> Router {
        router(AppState::new(Some(YEAR)))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = serde_json::from_slice(&bytes).expect("body should be json");
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("valid request");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn projection_uses_default_rate_and_counts_events() {
        let body = r#"{
          "initialWealth": 100000,
          "horizonYear": 2032,
          "events": [{
            "type": "DEPOSIT",
            "value": 500,
            "frequency": "MONTHLY",
            "startDate": "2030-01-01T00:00:00.000Z"
          }]
        }"#;
        let (status, body) = send(post_json("/api/projection", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rateAnnual"], 0.04);
        assert_eq!(body["eventsCount"], 1);

        let projection = body["projection"].as_array().expect("projection array");
        assert_eq!(projection.len(), 3);
        assert_eq!(projection[0]["year"], 2030);
        let first = projection[0]["projectedValue"].as_f64().expect("number");
        let last = projection[2]["projectedValue"].as_f64().expect("number");
        assert!(last > first);
    }

    #[tokio::test]
    async fn projection_rejects_missing_wealth() {
        let (status, body) = send(post_json("/api/projection", r#"{"initialWealth": 0}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .expect("error string")
                .contains("no current wealth")
        );
    }

    #[tokio::test]
    async fn projection_rejects_unparseable_event_date() {
        let body = r#"{
          "initialWealth": 1000,
          "events": [{"type": "DEPOSIT", "value": 5, "frequency": "ONCE", "startDate": "someday"}]
        }"#;
        let (status, body) = send(post_json("/api/projection", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error string").contains("startDate"));
    }

    #[tokio::test]
    async fn simulation_returns_created_snapshot() {
        let body = r#"{
          "initialWealth": 20000,
          "rateAnnual": 0.05,
          "endYear": 2031,
          "title": "Base case",
          "events": [{
            "id": "e1",
            "type": "WITHDRAWAL",
            "value": 1000,
            "frequency": "ANNUAL",
            "startDate": "2030-06-15T12:00:00.000Z",
            "endDate": null
          }]
        }"#;
        let (status, body) = send(post_json("/api/simulations", body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["title"], "Base case");
        assert_eq!(body["endYear"], 2031);
        assert_eq!(body["initialWealth"], 20000.0);
        assert_eq!(body["eventsSnapshot"][0]["id"], "e1");
        assert_eq!(body["eventsSnapshot"][0]["type"], "WITHDRAWAL");
        assert_eq!(body["eventsSnapshot"][0]["startDate"], "2030-06-15");
        assert_eq!(body["eventsSnapshot"][0]["endDate"], Value::Null);
        assert_eq!(body["result"].as_array().map(Vec::len), Some(2));
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn simulation_rejects_end_year_before_pinned_year() {
        let body = r#"{"initialWealth": 20000, "endYear": 2029}"#;
        let (status, _) = send(post_json("/api/simulations", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn simulation_rejects_mistyped_rate_as_json_error() {
        let body = r#"{"initialWealth": 1000, "rateAnnual": "abc"}"#;
        let (status, body) = send(post_json("/api/simulations", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error string").contains("rateAnnual"));
    }

    #[tokio::test]
    async fn malformed_json_body_is_json_error() {
        let (status, body) = send(post_json("/api/projection", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn suggestion_via_query_string() {
        let request = Request::builder()
            .uri("/api/suggestions?presentValue=100000&targetSum=220000&months=24&rateAnnual=0.04")
            .body(Body::empty())
            .expect("valid request");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["requiredMonthly"], 4487);
        assert_eq!(body["alreadyMet"], false);
        assert!(
            body["suggestions"][0]
                .as_str()
                .expect("message")
                .contains("4487")
        );
    }

    #[tokio::test]
    async fn suggestion_query_accepts_comma_separated_goals() {
        let request = Request::builder()
            .uri("/api/suggestions?presentValue=1000&goalTargets=5000,2500")
            .body(Body::empty())
            .expect("valid request");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalGoals"], 7500.0);
        assert_eq!(body["totalWealth"], 1000.0);
        assert_eq!(body["alreadyMet"], false);
    }

    #[tokio::test]
    async fn suggestion_query_with_bad_goal_is_json_error() {
        let request = Request::builder()
            .uri("/api/suggestions?presentValue=1000&goalTargets=5000,abc")
            .body(Body::empty())
            .expect("valid request");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("error string").contains("goalTargets"));
    }

    #[tokio::test]
    async fn suggestion_query_with_mistyped_number_is_json_error() {
        let request = Request::builder()
            .uri("/api/suggestions?presentValue=lots&targetSum=10")
            .body(Body::empty())
            .expect("valid request");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn suggestion_reports_goal_already_met() {
        let body = r#"{"presentValue": 300000, "goalTargets": [60000, 40000]}"#;
        let (status, body) = send(post_json("/api/suggestions", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalGoals"], 100000.0);
        assert_eq!(body["requiredMonthly"], 0);
        assert_eq!(body["alreadyMet"], true);
        assert_eq!(body["months"], DEFAULT_SUGGESTION_MONTHS);
    }

    #[tokio::test]
    async fn alignment_bands_and_rejects_zero_wealth() {
        let body = r#"{"currentWealth": 300000, "goalTargets": [100000, 155700]}"#;
        let (status, body) = send(post_json("/api/alignment", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alignmentPercent"], "85.23");
        assert_eq!(body["status"], "light-yellow");

        let body = r#"{"currentWealth": 0, "goalTargets": [1]}"#;
        let (status, _) = send(post_json("/api/alignment", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let request = Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .expect("valid request");
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }

    #[test]
    fn suggestion_response_serialization_contains_expected_fields() {
        let query = SuggestionQuery {
            present_value: 1000.0,
            target_sum: 5000.0,
            months: 12,
            annual_rate: 0.04,
        };
        let response = build_suggestion_response(query, required_monthly(query));
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"totalWealth\""));
        assert!(json.contains("\"totalGoals\""));
        assert!(json.contains("\"requiredMonthly\""));
        assert!(json.contains("\"alreadyMet\""));
        assert!(json.contains("\"suggestions\""));
    }

    #[test]
    fn round_to_six_decimals() {
        assert_eq!(round_to(0.123_456_78, 6), 0.123_457);
        assert_eq!(round_to(0.04, 6), 0.04);
    }
}

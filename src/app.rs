//! The HTTP query gateway.
//!
//! Validates requests, resolves cache hits, delegates to the warehouse and document
//! store clients and serialises results to JSON. Each request moves through
//! received, validated, cache-hit-or-delegated, serialised; validation failures are
//! terminal and never touch a backend.

use crate::app_state::SharedAppState;
use crate::error::DataServiceError;
use crate::metrics;
use crate::models::{
    CaseCount, CaseStreak, CommentRequest, CommentResponse, DataParams, PatternsParams, Record,
};
use crate::patterns;
use crate::queries::{self, Dataset, DateRange};
use crate::validated_json::ValidatedJson;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the gateway router.
///
/// CORS is wide open: the visualization client is served from a different origin, and
/// the upstream service allowed all origins too.
pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/data", get(get_data))
        .route("/comment", post(post_comment))
        .route("/patterns", get(get_patterns))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .on_request(metrics::request_counter)
                        .on_response(metrics::record_response_metrics),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Resolve the query text for a `GET /data` request.
///
/// Either a literal query or a named dataset must be supplied, but not both. A blank
/// literal query counts as absent. Note that literal query text is forwarded to the
/// warehouse verbatim, as the upstream contract requires; callers wanting a closed
/// surface should use the `dataset` form.
fn resolve_query(params: &DataParams) -> Result<String, DataServiceError> {
    match (&params.query, &params.dataset) {
        (Some(_), Some(_)) => Err(DataServiceError::ConflictingQuerySelector),
        (Some(query), None) if !query.trim().is_empty() => Ok(query.clone()),
        (None, Some(name)) => {
            let dataset =
                Dataset::parse(name).ok_or_else(|| DataServiceError::UnknownDataset {
                    dataset: name.clone(),
                })?;
            let range = DateRange::new(params.start_date.as_deref(), params.end_date.as_deref())?;
            Ok(dataset.sql(&range))
        }
        _ => Err(DataServiceError::MissingQuerySelector),
    }
}

/// `GET /data`: execute a warehouse query and return its records as a JSON array.
///
/// Results are memoized by the verbatim query text; a cache hit skips the warehouse
/// entirely. An empty result set is reported as an error, never as an empty success.
async fn get_data(
    State(state): State<SharedAppState>,
    Query(params): Query<DataParams>,
) -> Result<Json<Vec<Record>>, DataServiceError> {
    let sql = resolve_query(&params)?;
    let records = state
        .cache
        .get_or_compute(&sql, || {
            let state = state.clone();
            let sql = sql.clone();
            async move { state.warehouse.execute(&sql).await }
        })
        .await?;
    if records.is_empty() {
        return Err(DataServiceError::EmptyResult);
    }
    Ok(Json(records))
}

/// `POST /comment`: append a comment record to the document store.
async fn post_comment(
    State(state): State<SharedAppState>,
    ValidatedJson(request): ValidatedJson<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), DataServiceError> {
    state.documents.insert_comment(&request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: "Comment added successfully".to_string(),
        }),
    ))
}

/// `GET /patterns`: run the fixed pattern detection scan and return the streaks.
///
/// The dashboard client sends a date range, but the range has never been applied as a
/// filter to the underlying scan; it is accepted for compatibility and ignored.
async fn get_patterns(
    State(state): State<SharedAppState>,
    Query(params): Query<PatternsParams>,
) -> Result<Json<Vec<CaseStreak>>, DataServiceError> {
    if params.start_date.is_some() || params.end_date.is_some() {
        tracing::debug!(
            start_date = ?params.start_date,
            end_date = ?params.end_date,
            "ignoring patterns date range"
        );
    }
    let records = state.warehouse.execute(queries::CASE_COUNTS).await?;
    let rows = CaseCount::from_records(records)?;
    let streaks = patterns::find_streaks(&rows);
    if streaks.is_empty() {
        return Err(DataServiceError::EmptyResult);
    }
    Ok(Json(streaks))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app_state::AppState;
    use axum::{
        body::Body,
        http::{self, Request, StatusCode},
        response::Response,
    };
    use clap::Parser;
    use regex::Regex;
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot` and `ready`

    /// Build a router whose backends point at a port nothing listens on, so any
    /// accidental backend call fails fast instead of hanging.
    fn test_router() -> Router {
        let args = crate::cli::CommandLineArgs::parse_from([
            "episerve",
            "--warehouse-url",
            "http://127.0.0.1:1/",
            "--document-store-url",
            "http://127.0.0.1:1/",
        ]);
        router(Arc::new(AppState::new(&args)))
    }

    async fn get(uri: &str) -> Response {
        test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(uri: &str, body: &str) -> Response {
        test_router()
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri(uri)
                    .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn resolve_literal_query() {
        let params = DataParams {
            query: Some("SELECT cases, date FROM jhu_covid_19 LIMIT 100".to_string()),
            dataset: None,
            start_date: None,
            end_date: None,
        };
        assert_eq!(
            resolve_query(&params).unwrap(),
            "SELECT cases, date FROM jhu_covid_19 LIMIT 100"
        );
    }

    #[test]
    fn resolve_named_dataset() {
        let params = DataParams {
            query: None,
            dataset: Some("DATABANK_DEMOGRAPHICS".to_string()),
            start_date: Some("2020-06-01".to_string()),
            end_date: Some("2020-09-30".to_string()),
        };
        let sql = resolve_query(&params).unwrap();
        assert!(sql.contains("BETWEEN '2020-06-01' AND '2020-09-30'"));
    }

    #[test]
    fn resolve_blank_query_is_missing() {
        let params = DataParams {
            query: Some("   ".to_string()),
            dataset: None,
            start_date: None,
            end_date: None,
        };
        assert!(matches!(
            resolve_query(&params),
            Err(DataServiceError::MissingQuerySelector)
        ));
    }

    #[tokio::test]
    async fn data_without_query_is_bad_request() {
        // No backend connection is attempted: validation fails first, and the test
        // backends would error with a connection failure rather than a 400 if it were.
        let response = get("/data").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r"query parameter is required").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn data_with_both_selectors_is_bad_request() {
        let response = get("/data?query=SELECT%201&dataset=CDC_TESTING").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r"mutually exclusive").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn data_with_unknown_dataset_is_bad_request() {
        let response = get("/data?dataset=NOT_A_DATASET").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r"unknown dataset NOT_A_DATASET").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn data_with_invalid_date_is_bad_request() {
        let response = get("/data?dataset=DATABANK_DEMOGRAPHICS&start_date=not-a-date").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r"invalid date not-a-date").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn data_backend_failure_is_internal_server_error() {
        let response = get("/data?dataset=CDC_TESTING").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        let re = Regex::new(r"error connecting to the warehouse").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn comment_missing_field_is_bad_request() {
        // The store write must not happen; the test store would report a connection
        // failure rather than a 400 if it were attempted.
        let response =
            post_json("/comment", r#"{"user_id": "alice", "comment": "interesting"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r"missing field `data_point_id`").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn comment_empty_field_is_bad_request() {
        let response = post_json(
            "/comment",
            r#"{"user_id": "", "data_point_id": "jhu-1", "comment": "interesting"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_string(response).await;
        let re = Regex::new(r"request data is not valid").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn comment_backend_failure_is_internal_server_error() {
        let response = post_json(
            "/comment",
            r#"{"user_id": "alice", "data_point_id": "jhu-1", "comment": "interesting"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        let re = Regex::new(r"error connecting to the document store").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn patterns_backend_failure_is_internal_server_error() {
        let response = get("/patterns?start_date=2020-01-01&end_date=2022-12-31").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        let re = Regex::new(r"error connecting to the warehouse").unwrap();
        assert!(re.is_match(&body), "body: {body}");
    }

    #[tokio::test]
    async fn metrics_endpoint_responds() {
        let response = get("/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

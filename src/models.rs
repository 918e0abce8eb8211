//! Request and response data for the HTTP query surface.

use crate::error::DataServiceError;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// A single result row produced by executing a warehouse query.
///
/// Keys are column names in the query's projection order; the `preserve_order`
/// feature of [serde_json] keeps the order intact through serialisation. Every
/// record of one query execution shares the same key set by construction.
pub type Record = serde_json::Map<String, Value>;

/// Query string parameters accepted by `GET /data`.
///
/// Exactly one of `query` (literal SQL, the upstream contract) or `dataset` (a named
/// query template) must be supplied. The date range parameters only apply to
/// templates that declare them.
#[derive(Debug, Deserialize)]
pub struct DataParams {
    /// Literal query text, forwarded to the warehouse verbatim
    pub query: Option<String>,
    /// Name of a named query template, e.g. `JHU_COVID_19`
    pub dataset: Option<String>,
    /// Inclusive start of the date range (`YYYY-MM-DD`)
    pub start_date: Option<String>,
    /// Inclusive end of the date range (`YYYY-MM-DD`)
    pub end_date: Option<String>,
}

/// Query string parameters accepted by `GET /patterns`.
///
/// The dashboard client always sends a date range, but the scan does not apply it as a
/// filter. See [crate::app::get_patterns].
#[derive(Debug, Deserialize)]
pub struct PatternsParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Body of a `POST /comment` request.
///
/// All three fields are required and must be non-empty; there are no further
/// constraints on comment content.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CommentRequest {
    /// Identifier of the commenting user
    #[validate(length(min = 1))]
    pub user_id: String,
    /// Identifier of the data point the comment is attached to
    #[validate(length(min = 1))]
    pub data_point_id: String,
    /// Free-text comment
    #[validate(length(min = 1))]
    pub comment: String,
}

/// Body of a successful `POST /comment` response.
#[derive(Debug, Deserialize, Serialize)]
pub struct CommentResponse {
    pub message: String,
}

/// One raw daily case count row, the input to the pattern detection engine.
///
/// Rows are deserialised from warehouse [Record]s; the aliases accept the upper-case
/// column names the warehouse reports.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CaseCount {
    #[serde(alias = "COUNTRY_REGION")]
    pub country_region: String,
    #[serde(default, alias = "PROVINCE_STATE")]
    pub province_state: Option<String>,
    #[serde(alias = "CASE_TYPE")]
    pub case_type: String,
    /// ISO 8601 date; lexicographic order equals chronological order
    #[serde(alias = "DATE")]
    pub date: String,
    /// Reported cumulative case count; missing counts are preserved as `None`
    #[serde(default, alias = "CASES")]
    pub cases: Option<i64>,
}

impl CaseCount {
    /// Convert a list of warehouse records into case count rows.
    pub fn from_records(records: Vec<Record>) -> Result<Vec<Self>, DataServiceError> {
        records
            .into_iter()
            .map(|record| serde_json::from_value(Value::Object(record)).map_err(Into::into))
            .collect()
    }
}

/// A derived record marking a two-step strictly increasing run in daily case counts for
/// one region and case category.
///
/// Request-scoped: computed fresh per invocation and never persisted.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CaseStreak {
    pub country_region: String,
    pub province_state: Option<String>,
    /// Date on which the streak condition held
    pub start_date: String,
    /// Date of the next sample in the same partition, if any
    pub end_date: Option<String>,
    pub current_cases: i64,
    pub previous_cases: i64,
    pub two_days_ago_cases: i64,
}

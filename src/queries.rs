//! Named query templates.
//!
//! The dashboard client historically embedded literal SQL for each dropdown option and
//! sent it through `GET /data?query=...`. That contract is still honoured, but the
//! fixed query texts are also modelled here as a closed set of named templates with
//! declared parameters, so that callers can select a dataset by name instead of
//! shipping SQL over the wire.

use crate::error::DataServiceError;

use strum_macros::Display;
use time::macros::format_description;

/// Source query for the pattern detection scan: every daily confirmed-case sample,
/// grouped by region so that the engine can window over each partition in date order.
pub const CASE_COUNTS: &str = "SELECT country_region, province_state, case_type, date, cases \
     FROM jhu_covid_19 \
     WHERE case_type = 'Confirmed' \
     ORDER BY country_region, province_state, date";

/// A named dashboard dataset backed by a fixed query template.
///
/// The serialised names are the dataset identifiers the visualization client has always
/// used in its dropdown options.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Dataset {
    /// Vaccination counts joined with detailed mortality
    #[strum(serialize = "JHU_COVID_19")]
    VaccinationsAndDeaths,
    /// Daily case counts by date
    #[strum(serialize = "CDC_TESTING")]
    CasesByDate,
    /// Case counts for populous countries, bounded by a date range
    #[strum(serialize = "DATABANK_DEMOGRAPHICS")]
    Demographics,
    /// Per-state population and death rate
    #[strum(serialize = "MOBILITY_COMPARISON")]
    MobilityComparison,
    /// Positive test counts by date
    #[strum(serialize = "CASES_TESTING")]
    PositiveTests,
}

impl Dataset {
    /// Resolve a dataset identifier sent by the client.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "JHU_COVID_19" => Some(Self::VaccinationsAndDeaths),
            "CDC_TESTING" => Some(Self::CasesByDate),
            "DATABANK_DEMOGRAPHICS" => Some(Self::Demographics),
            "MOBILITY_COMPARISON" => Some(Self::MobilityComparison),
            "CASES_TESTING" => Some(Self::PositiveTests),
            _ => None,
        }
    }

    /// Render the template into executable SQL.
    ///
    /// Only [Dataset::Demographics] declares parameters; the other templates ignore the
    /// date range, as the upstream dashboard queries did.
    pub fn sql(&self, range: &DateRange) -> String {
        match self {
            Self::VaccinationsAndDeaths => "SELECT DISTINCT o.people_vaccinated, deaths \
                 FROM owid_vaccinations AS o \
                 JOIN scs_be_detailed_mortality AS s ON o.date = s.date \
                 LIMIT 100"
                .to_string(),
            Self::CasesByDate => "SELECT cases, date FROM jhu_covid_19 LIMIT 100".to_string(),
            Self::Demographics => format!(
                "SELECT cases, date FROM ecdc_global \
                 WHERE population > 10000000 AND date BETWEEN '{}' AND '{}' \
                 LIMIT 30",
                range.start, range.end
            ),
            Self::MobilityComparison => "SELECT DISTINCT state, population, death_rate \
                 FROM rki_ger_covid19_dashboard \
                 LIMIT 100"
                .to_string(),
            Self::PositiveTests => "SELECT positive, date FROM cdc_testing LIMIT 100".to_string(),
        }
    }
}

/// An inclusive, validated date range parameter pair.
///
/// Both bounds must parse as `YYYY-MM-DD` before they are interpolated into a
/// template; anything else is rejected up front.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Date picker defaults used by the visualization client.
const DEFAULT_START: &str = "2020-01-01";
const DEFAULT_END: &str = "2022-12-31";

impl DateRange {
    /// Build a date range from optional request parameters, falling back to the
    /// dashboard's default picker range.
    pub fn new(start: Option<&str>, end: Option<&str>) -> Result<Self, DataServiceError> {
        let start = start.unwrap_or(DEFAULT_START);
        let end = end.unwrap_or(DEFAULT_END);
        for value in [start, end] {
            let format = format_description!("[year]-[month]-[day]");
            time::Date::parse(value, format).map_err(|_| DataServiceError::InvalidDate {
                value: value.to_string(),
            })?;
        }
        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

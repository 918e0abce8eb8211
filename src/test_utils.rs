use crate::models::CaseCount;

/// Create a confirmed-case count row for one region and date.
pub(crate) fn case_count(
    country: &str,
    province: Option<&str>,
    date: &str,
    cases: Option<i64>,
) -> CaseCount {
    CaseCount {
        country_region: country.to_string(),
        province_state: province.map(|p| p.to_string()),
        case_type: "Confirmed".to_string(),
        date: date.to_string(),
        cases,
    }
}

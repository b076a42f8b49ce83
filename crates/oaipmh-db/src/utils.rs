//! Shared utility functions

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DbError;

/// Separator used when set specs are aggregated with `GROUP_CONCAT`
pub(crate) const SET_SPEC_SEPARATOR: char = '\u{1f}';

/// Format a timestamp the way it is stored in the database
///
/// All timestamps are stored as RFC3339 in UTC with second precision and a
/// `Z` suffix, so that lexicographic comparison in SQL matches chronological
/// order.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use oaipmh_db::utils::to_db_timestamp;
///
/// let dt = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// assert_eq!(to_db_timestamp(&dt), "2024-01-01T12:00:00Z");
/// ```
pub fn to_db_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored RFC3339 timestamp
pub fn parse_db_timestamp(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidData(format!("timestamp '{}': {}", s, e)))
}

/// Split an aggregated set spec column into its parts
pub(crate) fn split_set_specs(aggregated: Option<String>) -> Vec<String> {
    aggregated
        .map(|s| {
            let mut specs: Vec<String> = s
                .split(SET_SPEC_SEPARATOR)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect();
            specs.sort();
            specs
        })
        .unwrap_or_default()
}

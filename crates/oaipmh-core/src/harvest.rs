//! Selective-harvest resolution
//!
//! Turns validated list arguments, or a resumption token, into the concrete
//! parameters of a provider query.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arguments::ValidatedArguments;
use crate::arguments::names::{FROM, UNTIL};
use crate::config::Granularity;
use crate::error::OaiError;
use crate::format::MetadataFormat;
use crate::resumption::{ResumptionManager, ResumptionState};

/// Concrete parameters of one list query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Requested format; absent for ListSets
    pub metadata_format: Option<MetadataFormat>,
    /// Inclusive lower bound on the record datestamp
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound; a day-granularity `until` covers the whole day
    pub until: Option<DateTime<Utc>>,
    /// Granularity the dates were given in
    pub granularity: Option<Granularity>,
    pub set: Option<String>,
    /// Position of the first item still to be returned
    pub cursor: usize,
}

/// Outcome of resolving a list request
#[derive(Debug)]
pub enum Search<T> {
    /// A new query starting at cursor 0
    Fresh(SearchParams),
    /// Continuation of a truncated list
    Resumed(ResumptionState<T>),
}

/// Resolves list requests against the repository's datestamp granularity
#[derive(Debug, Clone, Copy)]
pub struct HarvestResolver {
    granularity: Granularity,
}

impl HarvestResolver {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// Resolve a list request, consuming its resumption token if present
    pub async fn resolve<T: DeserializeOwned>(
        &self,
        args: &ValidatedArguments,
        resumption: &ResumptionManager,
    ) -> Result<Search<T>, OaiError> {
        match args.resumption_token() {
            Some(token) => {
                let state = resumption.lookup(args.verb(), token).await?;
                debug!(
                    "Resuming {} at cursor {} of {}",
                    args.verb(),
                    state.cursor,
                    state.complete_list_size
                );
                Ok(Search::Resumed(state))
            }
            None => self.fresh(args).map(Search::Fresh),
        }
    }

    /// Build search parameters from selective-harvest arguments
    pub fn fresh(&self, args: &ValidatedArguments) -> Result<SearchParams, OaiError> {
        let metadata_format = args
            .metadata_prefix()
            .map(MetadataFormat::from_prefix)
            .transpose()?;

        let from = args
            .from()
            .map(|value| parse_harvest_date(FROM, value))
            .transpose()?;
        let until = args
            .until()
            .map(|value| parse_harvest_date(UNTIL, value))
            .transpose()?;

        let granularity = match (&from, &until) {
            (Some(from), Some(until)) if from.granularity != until.granularity => {
                return Err(OaiError::BadArgument(
                    "The from and until arguments must have the same granularity".to_string(),
                ));
            }
            (Some(date), _) | (None, Some(date)) => Some(date.granularity),
            (None, None) => None,
        };

        if let Some(requested) = granularity
            && !self.granularity.accepts(requested)
        {
            return Err(OaiError::BadArgument(format!(
                "The repository does not support {} granularity",
                requested.as_str()
            )));
        }

        let from = from.map(|date| date.lower_bound());
        let until = until.map(|date| date.upper_bound());
        if let (Some(from), Some(until)) = (from, until)
            && from > until
        {
            return Err(OaiError::BadArgument(
                "The from argument must be less than or equal to the until argument".to_string(),
            ));
        }

        Ok(SearchParams {
            metadata_format,
            from,
            until,
            granularity,
            set: args.set().map(str::to_string),
            cursor: 0,
        })
    }
}

/// A `from`/`until` argument value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HarvestDate {
    granularity: Granularity,
    value: NaiveDateTime,
}

impl HarvestDate {
    fn lower_bound(&self) -> DateTime<Utc> {
        self.value.and_utc()
    }

    fn upper_bound(&self) -> DateTime<Utc> {
        match self.granularity {
            Granularity::Seconds => self.value.and_utc(),
            Granularity::Day => self
                .value
                .date()
                .and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
                .and_utc(),
        }
    }
}

const DAY_SHAPE: &str = "dddd-dd-dd";
const SECONDS_SHAPE: &str = "dddd-dd-ddTdd:dd:ddZ";

/// Parse a date argument in either OAI-PMH granularity
fn parse_harvest_date(name: &str, value: &str) -> Result<HarvestDate, OaiError> {
    let invalid = || {
        OaiError::BadArgument(format!(
            "The {} argument '{}' is not a valid date (expected YYYY-MM-DD or YYYY-MM-DDThh:mm:ssZ)",
            name, value
        ))
    };

    if has_shape(value, DAY_SHAPE) {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
        Ok(HarvestDate {
            granularity: Granularity::Day,
            value: date.and_time(NaiveTime::MIN),
        })
    } else if has_shape(value, SECONDS_SHAPE) {
        let value =
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ").map_err(|_| invalid())?;
        Ok(HarvestDate {
            granularity: Granularity::Seconds,
            value,
        })
    } else {
        Err(invalid())
    }
}

/// Check `value` against a shape where `d` stands for an ASCII digit
fn has_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

//! Request argument parsing and validation

mod validator;

pub use validator::{ValidatedArguments, validate, validate_request};

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

use crate::error::OaiError;

/// Argument names defined by OAI-PMH
pub mod names {
    pub const VERB: &str = "verb";
    pub const IDENTIFIER: &str = "identifier";
    pub const METADATA_PREFIX: &str = "metadataPrefix";
    pub const FROM: &str = "from";
    pub const UNTIL: &str = "until";
    pub const SET: &str = "set";
    pub const RESUMPTION_TOKEN: &str = "resumptionToken";
}

/// Flattened request arguments, one value per name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArguments {
    values: BTreeMap<String, String>,
}

impl QueryArguments {
    /// Parse the raw query string and an optional form-encoded body
    ///
    /// A name repeated within either source is a `badArgument`. When a name
    /// appears in both sources the query string value is kept.
    pub fn parse(query: Option<&str>, form: Option<&str>) -> Result<Self, OaiError> {
        let mut values = match form {
            Some(body) => parse_unique(body)?,
            None => BTreeMap::new(),
        };

        if let Some(query) = query {
            for (name, value) in parse_unique(query)? {
                if let Some(previous) = values.insert(name.clone(), value) {
                    debug!(
                        "Argument '{}' given in query and body, ignoring body value '{}'",
                        name, previous
                    );
                }
            }
        }

        Ok(Self { values })
    }

    /// Build arguments from decoded name/value pairs, rejecting repeated names
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, OaiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in pairs {
            match values.entry(name.into()) {
                Entry::Occupied(entry) => return Err(duplicate(entry.key())),
                Entry::Vacant(entry) => {
                    entry.insert(value.into());
                }
            }
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Iterate over arguments in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn parse_unique(raw: &str) -> Result<BTreeMap<String, String>, OaiError> {
    let pairs = url::form_urlencoded::parse(raw.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()));
    QueryArguments::from_pairs(pairs).map(|args| args.values)
}

fn duplicate(name: &str) -> OaiError {
    OaiError::BadArgument(format!("The argument '{}' is repeated", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_values() {
        let args = QueryArguments::parse(
            Some("verb=GetRecord&identifier=oai%3Arepo%3A42&metadataPrefix=oai_dc"),
            None,
        )
        .unwrap();
        assert_eq!(args.get("identifier"), Some("oai:repo:42"));
        assert_eq!(args.iter().count(), 3);
    }

    #[test]
    fn test_duplicate_in_query_is_bad_argument() {
        let err = QueryArguments::parse(Some("verb=Identify&verb=Identify"), None).unwrap_err();
        assert!(matches!(err, OaiError::BadArgument(_)));
    }

    #[test]
    fn test_duplicate_in_body_is_bad_argument() {
        let err = QueryArguments::parse(None, Some("set=a&set=b&verb=ListRecords")).unwrap_err();
        assert!(matches!(err, OaiError::BadArgument(_)));
    }

    #[test]
    fn test_query_wins_over_body() {
        let args = QueryArguments::parse(
            Some("verb=ListSets"),
            Some("verb=Identify&resumptionToken=x"),
        )
        .unwrap();
        assert_eq!(args.get("verb"), Some("ListSets"));
        assert_eq!(args.get("resumptionToken"), Some("x"));
    }

    #[test]
    fn test_empty_input() {
        let args = QueryArguments::parse(Some(""), None).unwrap();
        assert_eq!(args.iter().count(), 0);
        assert_eq!(args.get("verb"), None);
    }
}

//! Per-verb argument validation

use std::collections::BTreeMap;

use super::QueryArguments;
use super::names::{FROM, IDENTIFIER, METADATA_PREFIX, RESUMPTION_TOKEN, SET, UNTIL, VERB};
use crate::error::OaiError;
use crate::verb::Verb;

/// Arguments that passed the grammar of their verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArguments {
    verb: Verb,
    values: BTreeMap<String, String>,
}

impl ValidatedArguments {
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Get an argument other than `verb`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Get an argument the verb's grammar requires
    pub fn require(&self, name: &str) -> Result<&str, OaiError> {
        self.get(name)
            .ok_or_else(|| OaiError::BadArgument(format!("Missing required argument '{}'", name)))
    }

    pub fn identifier(&self) -> Option<&str> {
        self.get(IDENTIFIER)
    }

    pub fn metadata_prefix(&self) -> Option<&str> {
        self.get(METADATA_PREFIX)
    }

    pub fn from(&self) -> Option<&str> {
        self.get(FROM)
    }

    pub fn until(&self) -> Option<&str> {
        self.get(UNTIL)
    }

    pub fn set(&self) -> Option<&str> {
        self.get(SET)
    }

    pub fn resumption_token(&self) -> Option<&str> {
        self.get(RESUMPTION_TOKEN)
    }

    /// Iterate over the arguments (without `verb`) in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Extract the verb and validate the remaining arguments against it
pub fn validate_request(args: &QueryArguments) -> Result<ValidatedArguments, OaiError> {
    let verb = args
        .get(VERB)
        .ok_or_else(|| OaiError::BadVerb("The verb argument is missing".to_string()))?
        .parse::<Verb>()?;
    validate(verb, args)
}

/// Validate arguments against the grammar of `verb`
pub fn validate(verb: Verb, args: &QueryArguments) -> Result<ValidatedArguments, OaiError> {
    let rules = verb.rules();
    let values: BTreeMap<String, String> = args
        .iter()
        .filter(|(name, _)| *name != VERB)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    for (name, value) in &values {
        if !rules.allows(name) {
            return Err(OaiError::BadArgument(format!(
                "The argument '{}' is not allowed for verb {}",
                name, verb
            )));
        }
        if value.is_empty() {
            return Err(OaiError::BadArgument(format!(
                "The argument '{}' has an empty value",
                name
            )));
        }
    }

    if let Some(exclusive) = rules.exclusive.iter().find(|name| values.contains_key(**name)) {
        if values.len() > 1 {
            return Err(OaiError::BadArgument(format!(
                "The argument '{}' is exclusive and must be the only argument besides verb",
                exclusive
            )));
        }
        return Ok(ValidatedArguments { verb, values });
    }

    if let Some(missing) = rules.required.iter().find(|name| !values.contains_key(**name)) {
        return Err(OaiError::BadArgument(format!(
            "Missing required argument '{}'",
            missing
        )));
    }

    Ok(ValidatedArguments { verb, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> QueryArguments {
        QueryArguments::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn expect_bad_argument(pairs: &[(&str, &str)]) {
        let err = validate_request(&args(pairs)).unwrap_err();
        assert!(
            matches!(err, OaiError::BadArgument(_)),
            "expected badArgument for {:?}, got {:?}",
            pairs,
            err
        );
    }

    #[test]
    fn test_missing_verb() {
        let err = validate_request(&args(&[("identifier", "x")])).unwrap_err();
        assert!(matches!(err, OaiError::BadVerb(ref msg) if msg.contains("missing")));
    }

    #[test]
    fn test_illegal_verb() {
        let err = validate_request(&args(&[("verb", "Harvest")])).unwrap_err();
        assert!(matches!(err, OaiError::BadVerb(ref msg) if msg.contains("not a legal")));
    }

    #[test]
    fn test_identify_takes_no_arguments() {
        assert!(validate_request(&args(&[("verb", "Identify")])).is_ok());
        expect_bad_argument(&[("verb", "Identify"), ("set", "a")]);
    }

    #[test]
    fn test_get_record_requires_both_arguments() {
        expect_bad_argument(&[("verb", "GetRecord"), ("identifier", "oai:repo:1")]);
        expect_bad_argument(&[("verb", "GetRecord"), ("metadataPrefix", "oai_dc")]);

        let validated = validate_request(&args(&[
            ("verb", "GetRecord"),
            ("identifier", "oai:repo:1"),
            ("metadataPrefix", "oai_dc"),
        ]))
        .unwrap();
        assert_eq!(validated.verb(), Verb::GetRecord);
        assert_eq!(validated.identifier(), Some("oai:repo:1"));
        assert_eq!(validated.iter().count(), 2);
    }

    #[test]
    fn test_resumption_token_is_exclusive() {
        for verb in ["ListRecords", "ListIdentifiers"] {
            expect_bad_argument(&[
                ("verb", verb),
                ("resumptionToken", "abc"),
                ("metadataPrefix", "oai_dc"),
            ]);
            expect_bad_argument(&[("verb", verb), ("resumptionToken", "abc"), ("set", "a")]);

            let validated =
                validate_request(&args(&[("verb", verb), ("resumptionToken", "abc")])).unwrap();
            assert_eq!(validated.resumption_token(), Some("abc"));
            assert_eq!(validated.metadata_prefix(), None);
        }
    }

    #[test]
    fn test_list_records_selective_arguments() {
        let validated = validate_request(&args(&[
            ("verb", "ListRecords"),
            ("metadataPrefix", "oai_dc"),
            ("from", "2024-01-01"),
            ("until", "2024-02-01"),
            ("set", "physics"),
        ]))
        .unwrap();
        assert_eq!(validated.from(), Some("2024-01-01"));
        assert_eq!(validated.until(), Some("2024-02-01"));
        assert_eq!(validated.set(), Some("physics"));

        expect_bad_argument(&[("verb", "ListRecords"), ("from", "2024-01-01")]);
        expect_bad_argument(&[
            ("verb", "ListRecords"),
            ("metadataPrefix", "oai_dc"),
            ("identifier", "x"),
        ]);
    }

    #[test]
    fn test_list_sets_and_formats() {
        assert!(validate_request(&args(&[("verb", "ListSets")])).is_ok());
        expect_bad_argument(&[("verb", "ListSets"), ("metadataPrefix", "oai_dc")]);

        assert!(validate_request(&args(&[("verb", "ListMetadataFormats")])).is_ok());
        assert!(
            validate_request(&args(&[("verb", "ListMetadataFormats"), ("identifier", "x")]))
                .is_ok()
        );
    }

    #[test]
    fn test_empty_value_is_bad_argument() {
        expect_bad_argument(&[("verb", "ListRecords"), ("metadataPrefix", "")]);
    }

    #[test]
    fn test_require_reports_missing_argument() {
        let validated = validate_request(&args(&[("verb", "Identify")])).unwrap();
        assert!(matches!(
            validated.require("identifier"),
            Err(OaiError::BadArgument(_))
        ));
    }
}

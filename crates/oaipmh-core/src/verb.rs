//! Protocol verbs and their argument grammar

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::arguments::names::{FROM, IDENTIFIER, METADATA_PREFIX, RESUMPTION_TOKEN, SET, UNTIL};
use crate::error::OaiError;

/// One of the six OAI-PMH requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    GetRecord,
    Identify,
    ListIdentifiers,
    ListMetadataFormats,
    ListRecords,
    ListSets,
}

/// Argument sets accepted by a verb
///
/// An exclusive argument must be the only argument besides `verb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbRules {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub exclusive: &'static [&'static str],
}

impl VerbRules {
    /// Whether `name` may appear in a request for this verb
    pub fn allows(&self, name: &str) -> bool {
        self.required.contains(&name)
            || self.optional.contains(&name)
            || self.exclusive.contains(&name)
    }
}

const NO_ARGUMENTS: VerbRules = VerbRules {
    required: &[],
    optional: &[],
    exclusive: &[],
};

const LIST_RECORDS_RULES: VerbRules = VerbRules {
    required: &[METADATA_PREFIX],
    optional: &[FROM, UNTIL, SET],
    exclusive: &[RESUMPTION_TOKEN],
};

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::GetRecord,
        Verb::Identify,
        Verb::ListIdentifiers,
        Verb::ListMetadataFormats,
        Verb::ListRecords,
        Verb::ListSets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::GetRecord => "GetRecord",
            Verb::Identify => "Identify",
            Verb::ListIdentifiers => "ListIdentifiers",
            Verb::ListMetadataFormats => "ListMetadataFormats",
            Verb::ListRecords => "ListRecords",
            Verb::ListSets => "ListSets",
        }
    }

    pub fn rules(&self) -> VerbRules {
        match self {
            Verb::Identify => NO_ARGUMENTS,
            Verb::GetRecord => VerbRules {
                required: &[IDENTIFIER, METADATA_PREFIX],
                optional: &[],
                exclusive: &[],
            },
            Verb::ListIdentifiers | Verb::ListRecords => LIST_RECORDS_RULES,
            Verb::ListMetadataFormats => VerbRules {
                required: &[],
                optional: &[IDENTIFIER],
                exclusive: &[],
            },
            Verb::ListSets => VerbRules {
                required: &[],
                optional: &[],
                exclusive: &[RESUMPTION_TOKEN],
            },
        }
    }
}

impl FromStr for Verb {
    type Err = OaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == s)
            .ok_or_else(|| {
                OaiError::BadVerb(
                    "Value of the verb argument is not a legal OAI-PMH verb".to_string(),
                )
            })
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

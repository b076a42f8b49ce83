//! Verb payloads produced by the engine

use oaipmh_db::RecordSet;

use crate::arguments::ValidatedArguments;
use crate::config::Granularity;
use crate::dublin_core::DublinCore;
use crate::error::OaiError;
use crate::format::MetadataFormat;
use crate::resumption::Page;
use crate::verb::Verb;

/// Protocol version answered in Identify
pub const PROTOCOL_VERSION: &str = "2.0";

/// Deleted-record policy; this repository keeps no deletion history
pub const DELETED_RECORD_POLICY: &str = "no";

/// Repository description returned by Identify
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub repository_name: String,
    pub base_url: String,
    pub protocol_version: &'static str,
    pub admin_email: String,
    /// Earliest datestamp, formatted in the repository granularity
    pub earliest_datestamp: String,
    pub deleted_record: &'static str,
    pub granularity: Granularity,
}

/// Record header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// OAI identifier, `oai:<namespace>:<local id>`
    pub identifier: String,
    /// Datestamp, formatted in the repository granularity
    pub datestamp: String,
    pub set_specs: Vec<String>,
}

/// Header plus metadata of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordView {
    pub header: Header,
    pub metadata: DublinCore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Identify(Identity),
    GetRecord(RecordView),
    ListIdentifiers(Page<Header>),
    ListRecords(Page<RecordView>),
    ListMetadataFormats(Vec<MetadataFormat>),
    ListSets(Page<RecordSet>),
}

impl Payload {
    pub fn verb(&self) -> Verb {
        match self {
            Payload::Identify(_) => Verb::Identify,
            Payload::GetRecord(_) => Verb::GetRecord,
            Payload::ListIdentifiers(_) => Verb::ListIdentifiers,
            Payload::ListRecords(_) => Verb::ListRecords,
            Payload::ListMetadataFormats(_) => Verb::ListMetadataFormats,
            Payload::ListSets(_) => Verb::ListSets,
        }
    }
}

/// Outcome of one OAI-PMH request
#[derive(Debug)]
pub struct OaiResponse {
    /// Arguments echoed in the `request` element; absent if they never validated
    pub request: Option<ValidatedArguments>,
    pub result: Result<Payload, OaiError>,
}

impl OaiResponse {
    /// Response to a request rejected before validation
    pub fn rejected(error: OaiError) -> Self {
        Self {
            request: None,
            result: Err(error),
        }
    }

    /// Whether the `request` element may echo the arguments
    ///
    /// Arguments are never echoed for `badVerb` and `badArgument`.
    pub fn echoes_arguments(&self) -> bool {
        match &self.result {
            Ok(_) => self.request.is_some(),
            Err(OaiError::BadVerb(_) | OaiError::BadArgument(_)) => false,
            Err(_) => self.request.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{QueryArguments, validate_request};

    #[test]
    fn test_echoes_arguments() {
        let args = QueryArguments::parse(Some("verb=ListSets"), None).unwrap();
        let request = validate_request(&args).unwrap();

        let ok = OaiResponse {
            request: Some(request.clone()),
            result: Ok(Payload::ListMetadataFormats(MetadataFormat::SUPPORTED.to_vec())),
        };
        assert!(ok.echoes_arguments());
        assert_eq!(ok.result.as_ref().unwrap().verb(), Verb::ListMetadataFormats);

        let bad_argument = OaiResponse {
            request: Some(request.clone()),
            result: Err(OaiError::BadArgument("bad date".to_string())),
        };
        assert!(!bad_argument.echoes_arguments());

        let no_sets = OaiResponse {
            request: Some(request),
            result: Err(OaiError::NoSetHierarchy("none".to_string())),
        };
        assert!(no_sets.echoes_arguments());

        assert!(!OaiResponse::rejected(OaiError::BadVerb("missing".to_string())).echoes_arguments());
    }
}

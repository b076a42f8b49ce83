//! Supported metadata formats

use serde::{Deserialize, Serialize};

use crate::error::OaiError;

/// Metadata format the repository can disseminate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetadataFormat {
    /// Unqualified Dublin Core
    #[serde(rename = "oai_dc")]
    OaiDc,
}

impl MetadataFormat {
    /// Every format this repository supports, for ListMetadataFormats
    pub const SUPPORTED: [MetadataFormat; 1] = [MetadataFormat::OaiDc];

    pub fn prefix(&self) -> &'static str {
        match self {
            MetadataFormat::OaiDc => "oai_dc",
        }
    }

    pub fn schema(&self) -> &'static str {
        match self {
            MetadataFormat::OaiDc => "http://www.openarchives.org/OAI/2.0/oai_dc.xsd",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            MetadataFormat::OaiDc => "http://www.openarchives.org/OAI/2.0/oai_dc/",
        }
    }

    /// Classify a requested `metadataPrefix`
    pub fn from_prefix(prefix: &str) -> Result<Self, OaiError> {
        Self::SUPPORTED
            .into_iter()
            .find(|format| format.prefix() == prefix)
            .ok_or_else(|| {
                OaiError::CannotDisseminateFormat(format!(
                    "The metadata format '{}' is not supported by this repository",
                    prefix
                ))
            })
    }
}

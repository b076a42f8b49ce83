//! Protocol error types

use oaipmh_store::StoreError;
use std::fmt;
use thiserror::Error;

use crate::provider::ProviderError;

/// Wire-level error code of an OAI-PMH error document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BadVerb,
    BadArgument,
    BadResumptionToken,
    CannotDisseminateFormat,
    IdDoesNotExist,
    NoRecordsMatch,
    NoSetHierarchy,
    /// Failure outside the protocol taxonomy
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadVerb => "badVerb",
            ErrorCode::BadArgument => "badArgument",
            ErrorCode::BadResumptionToken => "badResumptionToken",
            ErrorCode::CannotDisseminateFormat => "cannotDisseminateFormat",
            ErrorCode::IdDoesNotExist => "idDoesNotExist",
            ErrorCode::NoRecordsMatch => "noRecordsMatch",
            ErrorCode::NoSetHierarchy => "noSetHierarchy",
            ErrorCode::UnknownError => "unknownError",
        }
    }

    /// Whether the code belongs to the OAI-PMH error taxonomy
    pub fn is_protocol_error(&self) -> bool {
        !matches!(self, ErrorCode::UnknownError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum OaiError {
    #[error("{0}")]
    BadVerb(String),

    #[error("{0}")]
    BadArgument(String),

    #[error("{0}")]
    BadResumptionToken(String),

    #[error("{0}")]
    CannotDisseminateFormat(String),

    #[error("{0}")]
    IdDoesNotExist(String),

    #[error("{0}")]
    NoRecordsMatch(String),

    #[error("{0}")]
    NoSetHierarchy(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OaiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            OaiError::BadVerb(_) => ErrorCode::BadVerb,
            OaiError::BadArgument(_) => ErrorCode::BadArgument,
            OaiError::BadResumptionToken(_) => ErrorCode::BadResumptionToken,
            OaiError::CannotDisseminateFormat(_) => ErrorCode::CannotDisseminateFormat,
            OaiError::IdDoesNotExist(_) => ErrorCode::IdDoesNotExist,
            OaiError::NoRecordsMatch(_) => ErrorCode::NoRecordsMatch,
            OaiError::NoSetHierarchy(_) => ErrorCode::NoSetHierarchy,
            OaiError::Provider(_) | OaiError::Store(_) | OaiError::Internal(_) => {
                ErrorCode::UnknownError
            }
        }
    }

    pub(crate) fn bad_resumption_token() -> Self {
        OaiError::BadResumptionToken(
            "The value of the resumptionToken argument is invalid or expired".to_string(),
        )
    }
}

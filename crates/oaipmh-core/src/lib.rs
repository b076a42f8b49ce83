//! OAI-PMH Server Core Business Logic
//!
//! This crate provides the protocol rule engine: argument validation,
//! selective-harvest resolution, resumption-token flow control and verb
//! dispatch, plus the record provider contract the engine reads from.

pub mod arguments;
pub mod config;
pub mod dublin_core;
pub mod engine;
pub mod error;
pub mod format;
pub mod harvest;
pub mod provider;
pub mod response;
pub mod resumption;
pub mod verb;

pub use arguments::{QueryArguments, ValidatedArguments, validate, validate_request};
pub use config::{Granularity, ProtocolConfig};
pub use dublin_core::{DcElement, DublinCore};
pub use engine::ProtocolEngine;
pub use error::{ErrorCode, OaiError};
pub use format::MetadataFormat;
pub use harvest::{HarvestResolver, Search, SearchParams};
pub use provider::{MemoryProvider, ProviderError, RecordProvider, RepositoryInfo, SqliteProvider};
pub use response::{Header, Identity, OaiResponse, Payload, RecordView};
pub use resumption::{Page, Resumption, ResumptionManager, ResumptionState, Window};
pub use verb::{Verb, VerbRules};

//! Verb dispatcher
//!
//! `ProtocolEngine` ties the argument validator, the harvest resolver, the
//! resumption manager and the record provider together. One call to
//! [`ProtocolEngine::handle`] answers one OAI-PMH request.

use std::sync::Arc;

use oaipmh_db::{Record, RecordSet};
use oaipmh_store::CacheStore;
use tracing::{debug, error};

use crate::arguments::names::{IDENTIFIER, METADATA_PREFIX};
use crate::arguments::{QueryArguments, ValidatedArguments, validate_request};
use crate::config::ProtocolConfig;
use crate::error::OaiError;
use crate::format::MetadataFormat;
use crate::harvest::{HarvestResolver, Search};
use crate::provider::RecordProvider;
use crate::response::{
    DELETED_RECORD_POLICY, Header, Identity, OaiResponse, PROTOCOL_VERSION, Payload, RecordView,
};
use crate::resumption::{Page, ResumptionManager, Window};
use crate::verb::Verb;

pub struct ProtocolEngine {
    provider: Arc<dyn RecordProvider>,
    config: ProtocolConfig,
    resolver: HarvestResolver,
    resumption: ResumptionManager,
}

impl ProtocolEngine {
    pub fn new(
        provider: Arc<dyn RecordProvider>,
        store: Arc<dyn CacheStore>,
        config: ProtocolConfig,
    ) -> Self {
        let resolver = HarvestResolver::new(config.granularity);
        let resumption = ResumptionManager::new(store, config.page_size, config.token_ttl);
        Self {
            provider,
            config,
            resolver,
            resumption,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Validate and answer one request
    pub async fn handle(&self, args: &QueryArguments) -> OaiResponse {
        let request = match validate_request(args) {
            Ok(request) => request,
            Err(e) => {
                debug!("Rejected request: {}", e);
                return OaiResponse::rejected(e);
            }
        };

        let result = self.dispatch(&request).await;
        match &result {
            Ok(_) => debug!("Answered {}", request.verb()),
            Err(e) if e.code().is_protocol_error() => {
                debug!("{} failed with {}: {}", request.verb(), e.code(), e)
            }
            Err(e) => error!("{} failed: {}", request.verb(), e),
        }

        OaiResponse {
            request: Some(request),
            result,
        }
    }

    /// Run the handler of an already validated request
    pub async fn dispatch(&self, args: &ValidatedArguments) -> Result<Payload, OaiError> {
        match args.verb() {
            Verb::GetRecord => self.get_record(args).await.map(Payload::GetRecord),
            Verb::Identify => self.identify().await.map(Payload::Identify),
            Verb::ListIdentifiers => {
                let page = self.list_records(args).await?;
                let mut headers = Vec::with_capacity(page.items.len());
                for record in &page.items {
                    headers.push(self.header(record).await?);
                }
                self.release_token(args).await?;
                Ok(Payload::ListIdentifiers(page.with_items(headers)))
            }
            Verb::ListRecords => {
                let page = self.list_records(args).await?;
                let mut views = Vec::with_capacity(page.items.len());
                for record in &page.items {
                    views.push(self.record_view(record).await?);
                }
                self.release_token(args).await?;
                Ok(Payload::ListRecords(page.with_items(views)))
            }
            Verb::ListMetadataFormats => self
                .list_metadata_formats(args)
                .await
                .map(Payload::ListMetadataFormats),
            Verb::ListSets => {
                let page = self.list_sets(args).await?;
                self.release_token(args).await?;
                Ok(Payload::ListSets(page))
            }
        }
    }

    /// Consume the presented resumption token once its page is complete
    async fn release_token(&self, args: &ValidatedArguments) -> Result<(), OaiError> {
        match args.resumption_token() {
            Some(token) => self.resumption.release(token).await,
            None => Ok(()),
        }
    }

    /// Number of records the repository exposes
    pub async fn record_count(&self) -> Result<usize, OaiError> {
        Ok(self.provider.record_count().await?)
    }

    async fn get_record(&self, args: &ValidatedArguments) -> Result<RecordView, OaiError> {
        MetadataFormat::from_prefix(args.require(METADATA_PREFIX)?)?;
        let record = self.find_record(args.require(IDENTIFIER)?).await?;
        self.record_view(&record).await
    }

    async fn identify(&self) -> Result<Identity, OaiError> {
        let earliest = self.provider.earliest_datestamp().await?;
        Ok(Identity {
            repository_name: self.provider.repository_name().await?,
            base_url: self.config.base_url.clone(),
            protocol_version: PROTOCOL_VERSION,
            admin_email: self.provider.admin_email().await?,
            earliest_datestamp: self.config.granularity.format_datestamp(&earliest),
            deleted_record: DELETED_RECORD_POLICY,
            granularity: self.config.granularity,
        })
    }

    async fn list_metadata_formats(
        &self,
        args: &ValidatedArguments,
    ) -> Result<Vec<MetadataFormat>, OaiError> {
        if let Some(identifier) = args.identifier() {
            self.find_record(identifier).await?;
        }
        Ok(MetadataFormat::SUPPORTED.to_vec())
    }

    async fn list_sets(&self, args: &ValidatedArguments) -> Result<Page<RecordSet>, OaiError> {
        let (window, params) = match self.resolver.resolve(args, &self.resumption).await? {
            Search::Fresh(params) => {
                if !self.provider.supports_sets().await? {
                    return Err(no_set_hierarchy());
                }
                let sets = self.provider.get_sets().await?;
                if sets.is_empty() {
                    return Err(no_set_hierarchy());
                }
                (Window::fresh(sets), params)
            }
            Search::Resumed(state) => state.into_window(),
        };
        self.resumption.paginate(Verb::ListSets, window, &params).await
    }

    /// Shared pipeline of ListRecords and ListIdentifiers
    async fn list_records(&self, args: &ValidatedArguments) -> Result<Page<Record>, OaiError> {
        let (window, params) = match self.resolver.resolve(args, &self.resumption).await? {
            Search::Fresh(params) => {
                if params.set.is_some() && !self.provider.supports_sets().await? {
                    return Err(no_set_hierarchy());
                }
                let records = self
                    .provider
                    .get_records(params.set.as_deref(), params.from, params.until)
                    .await?;
                if records.is_empty() {
                    return Err(OaiError::NoRecordsMatch(
                        "The combination of the values of the from, until, set and \
                         metadataPrefix arguments results in an empty list"
                            .to_string(),
                    ));
                }
                debug!("Fresh {} query matched {} records", args.verb(), records.len());
                (Window::fresh(records), params)
            }
            Search::Resumed(state) => state.into_window(),
        };
        self.resumption.paginate(args.verb(), window, &params).await
    }

    /// Look up a record by OAI or local identifier
    ///
    /// Everything up to the last `:` is ignored, so `oai:repo:42` and `42`
    /// name the same record.
    async fn find_record(&self, identifier: &str) -> Result<Record, OaiError> {
        let local_id = identifier.rsplit(':').next().unwrap_or(identifier);
        self.provider.get_record(local_id).await?.ok_or_else(|| {
            OaiError::IdDoesNotExist(format!(
                "The value '{}' of the identifier argument is unknown or illegal in this repository",
                identifier
            ))
        })
    }

    async fn header(&self, record: &Record) -> Result<Header, OaiError> {
        let sets = self.provider.sets_for_record(record).await?;
        Ok(Header {
            identifier: self
                .config
                .oai_identifier(&self.provider.record_id(record)),
            datestamp: self
                .config
                .granularity
                .format_datestamp(&self.provider.record_updated(record)),
            set_specs: sets.into_iter().map(|set| set.spec).collect(),
        })
    }

    async fn record_view(&self, record: &Record) -> Result<RecordView, OaiError> {
        Ok(RecordView {
            header: self.header(record).await?,
            metadata: self.provider.dublinize(record),
        })
    }
}

fn no_set_hierarchy() -> OaiError {
    OaiError::NoSetHierarchy("This repository does not support sets".to_string())
}

//! WoRMS REST API HTTP client

use crate::config::WormsConfig;
use crate::error::{Result, WormsError};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Answer of `AphiaIDByName` when a name matches more than one taxon
const AMBIGUOUS_APHIA_ID: i64 = -999;

/// Client for the World Register of Marine Species REST API
///
/// Every method is one independent request. The client holds no mutable
/// state, so a single instance can be shared between tasks.
pub struct WormsClient {
    http: reqwest::Client,
    base_url: String,
}

impl WormsClient {
    /// Names or ids the service accepts in one batched request
    pub const MAX_BATCH_SIZE: usize = 50;

    /// Create a client with default settings (30 second timeout)
    ///
    /// The base URL can be overridden with the `WORMS_BASE_URL` environment variable.
    pub fn new() -> Self {
        Self::from_config(WormsConfig::from_env()).expect("Failed to create HTTP client")
    }

    /// Create a client against a custom WoRMS URL
    pub fn with_base_url(base_url: &str) -> Self {
        Self::from_config(WormsConfig::default().base_url(base_url))
            .expect("Failed to create HTTP client")
    }

    /// Create a client from an explicit configuration
    pub fn from_config(config: WormsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------
    // Single taxon lookups
    // ------------------------------------------------------------------

    /// Get the complete Aphia record for an AphiaID
    ///
    /// Returns `None` if the id is unknown.
    pub async fn aphia_record_by_aphia_id(&self, aphia_id: u64) -> Result<Option<AphiaRecord>> {
        let url = self.build_url(&format!("AphiaRecordByAphiaID/{}", aphia_id), &[]);
        self.get_optional("AphiaRecordByAphiaID", url).await
    }

    /// Get the scientific name for an AphiaID
    pub async fn aphia_name_by_aphia_id(&self, aphia_id: u64) -> Result<Option<String>> {
        let url = self.build_url(&format!("AphiaNameByAphiaID/{}", aphia_id), &[]);
        self.get_optional("AphiaNameByAphiaID", url).await
    }

    /// Get the AphiaID for a scientific name
    ///
    /// Returns `None` when nothing matches and also when the name is ambiguous
    /// (the service answers `-999` if several taxa share the name).
    ///
    /// # Arguments
    /// * `name` - Exact scientific name
    /// * `marine_only` - Restrict to marine taxa
    pub async fn aphia_id_by_name(&self, name: &str, marine_only: bool) -> Result<Option<u64>> {
        let name = require_non_blank(name, "name")?;
        let url = self.build_url(
            &format!("AphiaIDByName/{}", urlencoding::encode(name)),
            &[("marine_only", marine_only.to_string())],
        );

        let id: Option<i64> = self.get_optional("AphiaIDByName", url).await?;
        match id {
            Some(AMBIGUOUS_APHIA_ID) => {
                warn!(scientific_name = name, "WoRMS reports multiple taxa for name");
                Ok(None)
            }
            Some(id) if id < 0 => {
                warn!(
                    scientific_name = name,
                    answer = id,
                    "WoRMS returned an unexpected AphiaID"
                );
                Ok(None)
            }
            Some(id) => Ok(u64::try_from(id).ok()),
            None => Ok(None),
        }
    }

    /// Get the Aphia record for an identifier of another database
    ///
    /// # Arguments
    /// * `external_id` - Identifier in the external namespace
    /// * `source` - Namespace the identifier belongs to
    pub async fn aphia_record_by_external_id(
        &self,
        external_id: &str,
        source: ExternalIdentifierSource,
    ) -> Result<Option<AphiaRecord>> {
        let external_id = require_non_blank(external_id, "external_id")?;
        let url = self.build_url(
            &format!("AphiaRecordByExternalID/{}", urlencoding::encode(external_id)),
            &[("type", source.as_str().to_string())],
        );
        self.get_optional("AphiaRecordByExternalID", url).await
    }

    /// Get the identifiers another database uses for an AphiaID
    pub async fn aphia_external_id_by_aphia_id(
        &self,
        aphia_id: u64,
        source: ExternalIdentifierSource,
    ) -> Result<Vec<String>> {
        let url = self.build_url(
            &format!("AphiaExternalIDByAphiaID/{}", aphia_id),
            &[("type", source.as_str().to_string())],
        );
        self.get_list("AphiaExternalIDByAphiaID", url).await
    }

    // ------------------------------------------------------------------
    // Record searches
    // ------------------------------------------------------------------

    /// Search Aphia records by scientific name
    ///
    /// # Arguments
    /// * `name` - Scientific name; with `like` set, `%` is appended server side
    /// * `like` - Match names starting with `name` instead of exact matches
    /// * `marine_only` - Restrict to marine taxa
    /// * `offset` - 1-based index of the first record (pages hold 50 records)
    pub async fn aphia_records_by_name(
        &self,
        name: &str,
        like: bool,
        marine_only: bool,
        offset: u32,
    ) -> Result<Vec<AphiaRecord>> {
        let name = require_non_blank(name, "name")?;
        let offset = require_offset(offset)?;
        let url = self.build_url(
            &format!("AphiaRecordsByName/{}", urlencoding::encode(name)),
            &[
                ("like", like.to_string()),
                ("marine_only", marine_only.to_string()),
                ("offset", offset.to_string()),
            ],
        );
        self.get_list("AphiaRecordsByName", url).await
    }

    /// Search Aphia records for several scientific names at once
    ///
    /// The result has one entry per input name, in input order. Names without
    /// any match yield `None`. Inputs longer than [`Self::MAX_BATCH_SIZE`]
    /// are sent as consecutive requests; if any of them fails the whole call
    /// fails.
    ///
    /// A blank entry in `names` rejects the whole call with
    /// [`WormsError::InvalidArgument`] before anything is sent.
    ///
    /// Alignment relies on the service answering one group per name. A short
    /// answer is padded with `None` at the end of its chunk (and logged), so a
    /// group missing in the middle shifts the later results of that chunk.
    pub async fn aphia_records_by_names<S: AsRef<str>>(
        &self,
        names: &[S],
        like: bool,
        marine_only: bool,
    ) -> Result<Vec<Option<Vec<AphiaRecord>>>> {
        let names = require_names(names)?;
        let groups = self
            .get_batched(
                "AphiaRecordsByNames",
                "scientificnames[]",
                &names,
                &[
                    ("like", like.to_string()),
                    ("marine_only", marine_only.to_string()),
                ],
            )
            .await?;
        Ok(non_empty_groups(groups))
    }

    /// Match several names with the TAXAMATCH fuzzy matching algorithm
    ///
    /// Alignment and batching behave as in [`Self::aphia_records_by_names`].
    pub async fn aphia_records_by_match_names<S: AsRef<str>>(
        &self,
        names: &[S],
        marine_only: bool,
    ) -> Result<Vec<Option<Vec<AphiaRecord>>>> {
        let names = require_names(names)?;
        let groups = self
            .get_batched(
                "AphiaRecordsByMatchNames",
                "scientificnames[]",
                &names,
                &[("marine_only", marine_only.to_string())],
            )
            .await?;
        Ok(non_empty_groups(groups))
    }

    /// Get Aphia records for several AphiaIDs at once
    ///
    /// One entry per input id, in input order; unknown ids yield `None`.
    pub async fn aphia_records_by_aphia_ids(
        &self,
        aphia_ids: &[u64],
    ) -> Result<Vec<Option<AphiaRecord>>> {
        if aphia_ids.is_empty() {
            return Err(WormsError::InvalidArgument(
                "aphia_ids must not be empty".to_string(),
            ));
        }
        let ids: Vec<String> = aphia_ids.iter().map(|id| id.to_string()).collect();
        self.get_batched("AphiaRecordsByAphiaIDs", "aphiaids[]", &ids, &[])
            .await
    }

    /// Search Aphia records by common name
    ///
    /// # Arguments
    /// * `vernacular` - Common name
    /// * `like` - Match names starting with `vernacular`
    /// * `offset` - 1-based index of the first record
    pub async fn aphia_records_by_vernacular(
        &self,
        vernacular: &str,
        like: bool,
        offset: u32,
    ) -> Result<Vec<AphiaRecord>> {
        let vernacular = require_non_blank(vernacular, "vernacular")?;
        let offset = require_offset(offset)?;
        let url = self.build_url(
            &format!("AphiaRecordsByVernacular/{}", urlencoding::encode(vernacular)),
            &[("like", like.to_string()), ("offset", offset.to_string())],
        );
        self.get_list("AphiaRecordsByVernacular", url).await
    }

    /// Get records added or modified between two points in time
    ///
    /// Results are paged; call again with `offset + 50` until the page comes
    /// back empty.
    pub async fn aphia_records_by_date(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        marine_only: bool,
        offset: u32,
    ) -> Result<Vec<AphiaRecord>> {
        if from > to {
            return Err(WormsError::InvalidArgument(format!(
                "start date {} is after end date {}",
                from, to
            )));
        }
        let offset = require_offset(offset)?;
        let url = self.build_url(
            "AphiaRecordsByDate",
            &[
                ("startdate", format_date(&from)),
                ("enddate", format_date(&to)),
                ("marine_only", marine_only.to_string()),
                ("offset", offset.to_string()),
            ],
        );
        self.get_list("AphiaRecordsByDate", url).await
    }

    /// Get records of a given rank, optionally below a given taxon
    pub async fn aphia_records_by_taxon_rank_id(
        &self,
        taxon_rank_id: i32,
        belongs_to: Option<u64>,
        offset: u32,
    ) -> Result<Vec<AphiaRecord>> {
        let offset = require_offset(offset)?;
        let mut params = vec![("offset", offset.to_string())];
        if let Some(parent) = belongs_to {
            params.push(("belongsTo", parent.to_string()));
        }
        let url = self.build_url(
            &format!("AphiaRecordsByTaxonRankID/{}", taxon_rank_id),
            &params,
        );
        self.get_list("AphiaRecordsByTaxonRankID", url).await
    }

    // ------------------------------------------------------------------
    // Linked entities
    // ------------------------------------------------------------------

    /// Get the ancestor chain of a taxon, root first
    pub async fn aphia_classification_by_aphia_id(
        &self,
        aphia_id: u64,
    ) -> Result<Option<Classification>> {
        let url = self.build_url(&format!("AphiaClassificationByAphiaID/{}", aphia_id), &[]);
        self.get_optional("AphiaClassificationByAphiaID", url).await
    }

    /// Get the direct children of a taxon
    pub async fn aphia_children_by_aphia_id(
        &self,
        aphia_id: u64,
        marine_only: bool,
        offset: u32,
    ) -> Result<Vec<AphiaRecord>> {
        let offset = require_offset(offset)?;
        let url = self.build_url(
            &format!("AphiaChildrenByAphiaID/{}", aphia_id),
            &[
                ("marine_only", marine_only.to_string()),
                ("offset", offset.to_string()),
            ],
        );
        self.get_list("AphiaChildrenByAphiaID", url).await
    }

    /// Get the synonyms of a taxon
    pub async fn aphia_synonyms_by_aphia_id(
        &self,
        aphia_id: u64,
        offset: u32,
    ) -> Result<Vec<AphiaSynonym>> {
        let offset = require_offset(offset)?;
        let url = self.build_url(
            &format!("AphiaSynonymsByAphiaID/{}", aphia_id),
            &[("offset", offset.to_string())],
        );
        self.get_list("AphiaSynonymsByAphiaID", url).await
    }

    /// Get the common names of a taxon
    pub async fn aphia_vernaculars_by_aphia_id(
        &self,
        aphia_id: u64,
    ) -> Result<Vec<AphiaVernacular>> {
        let url = self.build_url(&format!("AphiaVernacularsByAphiaID/{}", aphia_id), &[]);
        self.get_list("AphiaVernacularsByAphiaID", url).await
    }

    /// Get the recorded distribution of a taxon
    pub async fn aphia_distributions_by_aphia_id(
        &self,
        aphia_id: u64,
    ) -> Result<Vec<AphiaDistribution>> {
        let url = self.build_url(&format!("AphiaDistributionsByAphiaID/{}", aphia_id), &[]);
        self.get_list("AphiaDistributionsByAphiaID", url).await
    }

    /// Get the literature sources of a taxon
    pub async fn aphia_sources_by_aphia_id(&self, aphia_id: u64) -> Result<Vec<AphiaSource>> {
        let url = self.build_url(&format!("AphiaSourcesByAphiaID/{}", aphia_id), &[]);
        self.get_list("AphiaSourcesByAphiaID", url).await
    }

    /// Get rank definitions by rank id, optionally for one kingdom
    pub async fn aphia_taxon_ranks_by_id(
        &self,
        taxon_rank_id: i32,
        kingdom_aphia_id: Option<u64>,
    ) -> Result<Vec<AphiaRank>> {
        let params = kingdom_param(kingdom_aphia_id);
        let url = self.build_url(&format!("AphiaTaxonRanksByID/{}", taxon_rank_id), &params);
        self.get_list("AphiaTaxonRanksByID", url).await
    }

    /// Get rank definitions by rank name, optionally for one kingdom
    pub async fn aphia_taxon_ranks_by_name(
        &self,
        taxon_rank: &str,
        kingdom_aphia_id: Option<u64>,
    ) -> Result<Vec<AphiaRank>> {
        let taxon_rank = require_non_blank(taxon_rank, "taxon_rank")?;
        let params = kingdom_param(kingdom_aphia_id);
        let url = self.build_url(
            &format!("AphiaTaxonRanksByName/{}", urlencoding::encode(taxon_rank)),
            &params,
        );
        self.get_list("AphiaTaxonRanksByName", url).await
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Get attribute definitions; id `0` lists the root definitions
    pub async fn aphia_attribute_keys_by_id(
        &self,
        attribute_id: u64,
        include_children: bool,
    ) -> Result<Vec<AphiaAttributeKey>> {
        let url = self.build_url(
            &format!("AphiaAttributeKeysByID/{}", attribute_id),
            &[("include_children", include_children.to_string())],
        );
        self.get_list("AphiaAttributeKeysByID", url).await
    }

    /// Get the attributes of a taxon
    ///
    /// # Arguments
    /// * `aphia_id` - The taxon
    /// * `include_inherited` - Also return attributes set on ancestor taxa
    pub async fn aphia_attributes_by_aphia_id(
        &self,
        aphia_id: u64,
        include_inherited: bool,
    ) -> Result<Vec<AphiaAttribute>> {
        let url = self.build_url(
            &format!("AphiaAttributesByAphiaID/{}", aphia_id),
            &[("include_inherited", include_inherited.to_string())],
        );
        self.get_list("AphiaAttributesByAphiaID", url).await
    }

    /// Get the allowed values of an attribute category
    pub async fn aphia_attribute_values_by_category_id(
        &self,
        category_id: u64,
    ) -> Result<Vec<AphiaAttributeValue>> {
        let url = self.build_url(
            &format!("AphiaAttributeValuesByCategoryID/{}", category_id),
            &[],
        );
        self.get_list("AphiaAttributeValuesByCategoryID", url).await
    }

    /// Get taxa carrying an attribute, with the matching attributes
    pub async fn aphia_ids_by_attribute_key_id(
        &self,
        attribute_id: u64,
        offset: u32,
    ) -> Result<Vec<AphiaAttributeSet>> {
        let offset = require_offset(offset)?;
        let url = self.build_url(
            &format!("AphiaIDsByAttributeKeyID/{}", attribute_id),
            &[("offset", offset.to_string())],
        );
        self.get_list("AphiaIDsByAttributeKeyID", url).await
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/{}", self.base_url, path);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// GET and decode; `None` for 204, 404, an empty body or a JSON `null`
    async fn get_optional<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        url: String,
    ) -> Result<Option<T>> {
        debug!(endpoint, url = %url, "WoRMS request");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            debug!(endpoint, status = %status, "WoRMS returned no content");
            return Ok(None);
        }

        if !status.is_success() {
            warn!(endpoint, status = %status, "WoRMS request failed");
            return Err(WormsError::Status { status, url });
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_list<T: DeserializeOwned>(&self, endpoint: &str, url: String) -> Result<Vec<T>> {
        Ok(self.get_optional(endpoint, url).await?.unwrap_or_default())
    }

    /// Send `values` as repeated `array_key` parameters in chunks of
    /// [`Self::MAX_BATCH_SIZE`], one request after the other
    async fn get_batched<G: DeserializeOwned>(
        &self,
        endpoint: &str,
        array_key: &str,
        values: &[String],
        params: &[(&str, String)],
    ) -> Result<Vec<Option<G>>> {
        let mut results = Vec::with_capacity(values.len());

        for (index, chunk) in values.chunks(Self::MAX_BATCH_SIZE).enumerate() {
            debug!(endpoint, chunk = index, size = chunk.len(), "WoRMS batch request");

            let mut query: Vec<(&str, String)> =
                chunk.iter().map(|value| (array_key, value.clone())).collect();
            query.extend(params.iter().cloned());

            let url = self.build_url(endpoint, &query);
            let groups: Vec<Option<G>> = self.get_list(endpoint, url).await?;
            results.extend(align_chunk(endpoint, groups, chunk.len()));
        }

        Ok(results)
    }
}

impl Default for WormsClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Pad or cut a batch answer so that it holds exactly one entry per input
fn align_chunk<G>(endpoint: &str, mut groups: Vec<Option<G>>, expected: usize) -> Vec<Option<G>> {
    if !groups.is_empty() && groups.len() != expected {
        warn!(
            endpoint,
            expected,
            received = groups.len(),
            "WoRMS batch answer does not match input length"
        );
    }
    groups.resize_with(expected, || None);
    groups
}

fn non_empty_groups(groups: Vec<Option<Vec<AphiaRecord>>>) -> Vec<Option<Vec<AphiaRecord>>> {
    groups
        .into_iter()
        .map(|group| group.filter(|records| !records.is_empty()))
        .collect()
}

fn require_non_blank<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WormsError::InvalidArgument(format!(
            "{} must not be blank",
            what
        )));
    }
    Ok(trimmed)
}

fn require_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>> {
    if names.is_empty() {
        return Err(WormsError::InvalidArgument(
            "names must not be empty".to_string(),
        ));
    }
    names
        .iter()
        .map(|name| require_non_blank(name.as_ref(), "name").map(str::to_string))
        .collect()
}

fn require_offset(offset: u32) -> Result<u32> {
    if offset == 0 {
        return Err(WormsError::InvalidArgument(
            "offset is 1-based".to_string(),
        ));
    }
    Ok(offset)
}

fn kingdom_param(kingdom_aphia_id: Option<u64>) -> Vec<(&'static str, String)> {
    kingdom_aphia_id
        .map(|id| vec![("AphiaID", id.to_string())])
        .unwrap_or_default()
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}

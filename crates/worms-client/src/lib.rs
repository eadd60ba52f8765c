//! Rust client for the WoRMS (World Register of Marine Species) REST API
//!
//! This crate provides typed bindings to the public
//! [WoRMS REST service](https://www.marinespecies.org/rest/), covering taxon
//! records, classification, synonyms, vernacular names, distributions,
//! sources, external identifiers and attributes.
//!
//! # Example
//!
//! ```no_run
//! use worms_client::{ExternalIdentifierSource, WormsClient};
//!
//! # async fn example() -> Result<(), worms_client::WormsError> {
//! let client = WormsClient::new();
//!
//! // Look up a taxon by name
//! if let Some(aphia_id) = client.aphia_id_by_name("Solea solea", false).await? {
//!     let record = client.aphia_record_by_aphia_id(aphia_id).await?;
//!     println!("{:?}", record.and_then(|r| r.authority));
//!
//!     // Cross-reference to NCBI Taxonomy
//!     let ncbi = client
//!         .aphia_external_id_by_aphia_id(aphia_id, ExternalIdentifierSource::Ncbi)
//!         .await?;
//!     println!("NCBI: {:?}", ncbi);
//! }
//!
//! // Batched lookup keeps one entry per input name
//! let matches = client
//!     .aphia_records_by_match_names(&["Solea solea", "Aphanizomenon"], false)
//!     .await?;
//! assert_eq!(matches.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! ## Taxa
//! - `GET /AphiaRecordByAphiaID/{id}`
//! - `GET /AphiaNameByAphiaID/{id}`
//! - `GET /AphiaIDByName/{name}`
//! - `GET /AphiaRecordByExternalID/{id}`
//! - `GET /AphiaExternalIDByAphiaID/{id}`
//! - `GET /AphiaRecordsByName/{name}`
//! - `GET /AphiaRecordsByNames` (batched, 50 names per request)
//! - `GET /AphiaRecordsByMatchNames` (batched, 50 names per request)
//! - `GET /AphiaRecordsByAphiaIDs` (batched, 50 ids per request)
//! - `GET /AphiaRecordsByVernacular/{name}`
//! - `GET /AphiaRecordsByDate`
//! - `GET /AphiaRecordsByTaxonRankID/{id}`
//!
//! ## Linked entities
//! - `GET /AphiaClassificationByAphiaID/{id}`
//! - `GET /AphiaChildrenByAphiaID/{id}`
//! - `GET /AphiaSynonymsByAphiaID/{id}`
//! - `GET /AphiaVernacularsByAphiaID/{id}`
//! - `GET /AphiaDistributionsByAphiaID/{id}`
//! - `GET /AphiaSourcesByAphiaID/{id}`
//! - `GET /AphiaTaxonRanksByID/{id}`
//! - `GET /AphiaTaxonRanksByName/{rank}`
//!
//! ## Attributes
//! - `GET /AphiaAttributeKeysByID/{id}`
//! - `GET /AphiaAttributesByAphiaID/{id}`
//! - `GET /AphiaAttributeValuesByCategoryID/{id}`
//! - `GET /AphiaIDsByAttributeKeyID/{id}`
//!
//! Unknown ids and names come back as `None` or an empty `Vec`; only
//! transport failures, unexpected statuses and malformed bodies are errors.

mod client;
mod config;
mod error;
mod types;

pub use client::WormsClient;
pub use config::{WormsConfig, DEFAULT_BASE_URL};
pub use error::{Result, WormsError};
pub use types::{
    AphiaAttribute, AphiaAttributeKey, AphiaAttributeSet, AphiaAttributeValue, AphiaDistribution,
    AphiaRank, AphiaRecord, AphiaSource, AphiaSynonym, AphiaVernacular, Classification,
    ExternalIdentifierSource,
};

//! Data types for WoRMS API responses
//!
//! These structs mirror the JSON documents returned by the WoRMS REST service.
//! Field names on the wire mix camelCase, snake_case and upper-case ids, so
//! each field carries its own rename.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Third-party namespaces that WoRMS cross-references to AphiaIDs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExternalIdentifierSource {
    /// AlgaeBase species id
    Algaebase,
    /// Barcode of Life Data Systems
    Bold,
    /// Swedish species information centre
    Dyntaxa,
    /// FishBase species id
    Fishbase,
    /// IUCN Red List id
    Iucn,
    /// Life Science Identifier
    Lsid,
    /// NCBI Taxonomy id
    Ncbi,
    /// ITIS Taxonomic Serial Number
    Tsn,
    /// Global Invasive Species Database
    Gisd,
}

impl ExternalIdentifierSource {
    /// All known sources, in the order WoRMS documents them
    pub const ALL: [Self; 9] = [
        Self::Algaebase,
        Self::Bold,
        Self::Dyntaxa,
        Self::Fishbase,
        Self::Iucn,
        Self::Lsid,
        Self::Ncbi,
        Self::Tsn,
        Self::Gisd,
    ];

    /// Value of the `type` query parameter for this source
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Algaebase => "algaebase",
            Self::Bold => "bold",
            Self::Dyntaxa => "dyntaxa",
            Self::Fishbase => "fishbase",
            Self::Iucn => "iucn",
            Self::Lsid => "lsid",
            Self::Ncbi => "ncbi",
            Self::Tsn => "tsn",
            Self::Gisd => "gisd",
        }
    }
}

impl fmt::Display for ExternalIdentifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExternalIdentifierSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == lower)
            .ok_or_else(|| format!("unknown external identifier source: {}", s))
    }
}

/// Taxon record from `AphiaRecordByAphiaID` and every record-list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AphiaRecord {
    #[serde(rename = "AphiaID")]
    pub aphia_id: u64,
    pub url: Option<String>,
    #[serde(rename = "scientificname")]
    pub scientific_name: Option<String>,
    pub authority: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "unacceptreason")]
    pub unaccept_reason: Option<String>,
    #[serde(rename = "taxonRankID")]
    pub taxon_rank_id: Option<i32>,
    pub rank: Option<String>,
    #[serde(rename = "valid_AphiaID")]
    pub valid_aphia_id: Option<u64>,
    pub valid_name: Option<String>,
    pub valid_authority: Option<String>,
    #[serde(rename = "parentNameUsageID")]
    pub parent_name_usage_id: Option<u64>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub citation: Option<String>,
    pub lsid: Option<String>,
    #[serde(rename = "isMarine", default, deserialize_with = "deserialize_flag")]
    pub is_marine: Option<bool>,
    #[serde(rename = "isBrackish", default, deserialize_with = "deserialize_flag")]
    pub is_brackish: Option<bool>,
    #[serde(rename = "isFreshwater", default, deserialize_with = "deserialize_flag")]
    pub is_freshwater: Option<bool>,
    #[serde(rename = "isTerrestrial", default, deserialize_with = "deserialize_flag")]
    pub is_terrestrial: Option<bool>,
    #[serde(rename = "isExtinct", default, deserialize_with = "deserialize_flag")]
    pub is_extinct: Option<bool>,
    pub match_type: Option<String>,
    pub modified: Option<String>,
}

impl AphiaRecord {
    /// Whether WoRMS lists this name as the accepted one
    pub fn is_accepted(&self) -> bool {
        self.status.as_deref() == Some("accepted")
    }
}

/// Synonyms are delivered as ordinary Aphia records
pub type AphiaSynonym = AphiaRecord;

/// Environment flags arrive as `0`/`1`, as booleans, or as `null`
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = Option<bool>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("0, 1, a boolean or null")
        }

        fn visit_bool<E>(self, v: bool) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(v))
        }

        fn visit_u64<E>(self, v: u64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            match v {
                0 => Ok(Some(false)),
                1 => Ok(Some(true)),
                other => Err(de::Error::custom(format!("flag out of range: {}", other))),
            }
        }

        fn visit_i64<E>(self, v: i64) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            match u64::try_from(v) {
                Ok(v) => self.visit_u64(v),
                Err(_) => Err(de::Error::custom(format!("flag out of range: {}", v))),
            }
        }

        fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// One node of the ancestor chain from `AphiaClassificationByAphiaID`
///
/// The service nests the chain root-first: the returned node is the top of the
/// hierarchy (usually Biota) and each `child` is one rank further down, ending
/// at the requested taxon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "AphiaID")]
    pub aphia_id: u64,
    pub rank: Option<String>,
    #[serde(rename = "scientificname")]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub child: Option<Box<Classification>>,
}

impl Classification {
    /// Walk the chain from the root down to the requested taxon
    pub fn iter(&self) -> impl Iterator<Item = &Classification> {
        std::iter::successors(Some(self), |node| node.child.as_deref())
    }

    /// The deepest node, i.e. the taxon the classification was requested for
    pub fn leaf(&self) -> &Classification {
        self.iter().last().unwrap_or(self)
    }

    /// Find the node for `aphia_id` anywhere in the chain
    pub fn find(&self, aphia_id: u64) -> Option<&Classification> {
        self.iter().find(|node| node.aphia_id == aphia_id)
    }

    /// Immediate ancestor of `aphia_id`, or `None` for the root or an id not in the chain
    pub fn parent_of(&self, aphia_id: u64) -> Option<&Classification> {
        self.iter()
            .find(|node| node.child.as_ref().map(|c| c.aphia_id) == Some(aphia_id))
    }

    /// Number of ranks in the chain
    pub fn depth(&self) -> usize {
        self.iter().count()
    }
}

/// Attribute (trait measurement) attached to a taxon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AphiaAttribute {
    #[serde(rename = "AphiaID")]
    pub aphia_id: Option<u64>,
    #[serde(rename = "measurementTypeID")]
    pub measurement_type_id: u64,
    #[serde(rename = "measurementType")]
    pub measurement_type: Option<String>,
    #[serde(rename = "measurementValue")]
    pub measurement_value: Option<String>,
    pub source_id: Option<u64>,
    pub reference: Option<String>,
    #[serde(rename = "qualitystatus")]
    pub quality_status: Option<String>,
    /// Ancestor the attribute was inherited from; `0` or absent when set directly
    #[serde(rename = "AphiaID_Inherited")]
    pub aphia_id_inherited: Option<u64>,
    #[serde(rename = "CategoryID")]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub children: Vec<AphiaAttribute>,
}

impl AphiaAttribute {
    pub fn is_inherited(&self) -> bool {
        matches!(self.aphia_id_inherited, Some(id) if id != 0)
    }
}

/// Attribute definition from `AphiaAttributeKeysByID`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AphiaAttributeKey {
    #[serde(rename = "measurementTypeID")]
    pub measurement_type_id: u64,
    #[serde(rename = "measurementType")]
    pub measurement_type: Option<String>,
    pub input_id: Option<u64>,
    #[serde(rename = "CategoryID")]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub children: Vec<AphiaAttributeKey>,
}

/// Allowed value of an attribute category from `AphiaAttributeValuesByCategoryID`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AphiaAttributeValue {
    #[serde(rename = "measurementValueID")]
    pub measurement_value_id: u64,
    #[serde(rename = "measurementValue")]
    pub measurement_value: Option<String>,
    #[serde(rename = "measurementValueCode")]
    pub measurement_value_code: Option<String>,
    #[serde(default)]
    pub children: Vec<AphiaAttributeValue>,
}

/// Taxon and the attributes that matched, from `AphiaIDsByAttributeKeyID`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AphiaAttributeSet {
    #[serde(rename = "AphiaID")]
    pub aphia_id: u64,
    #[serde(rename = "Attributes", default)]
    pub attributes: Vec<AphiaAttribute>,
}

/// Locality record from `AphiaDistributionsByAphiaID`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AphiaDistribution {
    pub locality: Option<String>,
    #[serde(rename = "locationID")]
    pub location_id: Option<String>,
    pub higher_geography: Option<String>,
    #[serde(rename = "higherGeographyID")]
    pub higher_geography_id: Option<String>,
    pub record_status: Option<String>,
    pub type_status: Option<String>,
    pub establishment_means: Option<String>,
    pub invasiveness: Option<String>,
    pub occurrence: Option<String>,
    pub decimal_latitude: Option<f64>,
    pub decimal_longitude: Option<f64>,
    pub quality_status: Option<String>,
}

/// Bibliographic source from `AphiaSourcesByAphiaID`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AphiaSource {
    pub source_id: u64,
    #[serde(rename = "use")]
    pub r#use: Option<String>,
    pub reference: Option<String>,
    pub page: Option<String>,
    pub url: Option<String>,
    pub link: Option<String>,
    pub fulltext: Option<String>,
    pub doi: Option<String>,
}

/// Common name from `AphiaVernacularsByAphiaID`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AphiaVernacular {
    pub vernacular: String,
    pub language_code: Option<String>,
    pub language: Option<String>,
}

/// Taxonomic rank definition from `AphiaTaxonRanksByID` / `AphiaTaxonRanksByName`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AphiaRank {
    #[serde(rename = "taxonRankID")]
    pub taxon_rank_id: i32,
    #[serde(rename = "taxonRank")]
    pub taxon_rank: Option<String>,
    /// Kingdom the rank definition applies to
    #[serde(rename = "AphiaID")]
    pub aphia_id: Option<u64>,
}

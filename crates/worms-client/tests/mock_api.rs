//! Offline tests against a mock WoRMS server
//!
//! These tests cover:
//! - Request paths and query parameters per endpoint
//! - Mapping of 204/404 to absent results
//! - Error reporting for failed statuses and malformed bodies
//! - Connection failures
//! - Chunking and positional alignment of batched lookups

use chrono::{TimeZone, Utc};
use serde_json::json;
use std::error::Error;
use worms_client::{ExternalIdentifierSource, WormsClient, WormsError};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

fn record(aphia_id: u64, name: &str) -> serde_json::Value {
    json!({
        "AphiaID": aphia_id,
        "url": format!("https://www.marinespecies.org/aphia.php?p=taxdetails&id={}", aphia_id),
        "scientificname": name,
        "authority": null,
        "status": "accepted",
        "unacceptreason": null,
        "taxonRankID": 220,
        "rank": "Species",
        "valid_AphiaID": aphia_id,
        "valid_name": name,
        "valid_authority": null,
        "parentNameUsageID": null,
        "kingdom": "Animalia",
        "phylum": null,
        "class": null,
        "order": null,
        "family": null,
        "genus": null,
        "citation": null,
        "lsid": format!("urn:lsid:marinespecies.org:taxname:{}", aphia_id),
        "isMarine": 1,
        "isBrackish": 0,
        "isFreshwater": 0,
        "isTerrestrial": 0,
        "isExtinct": null,
        "match_type": "exact",
        "modified": "2008-01-15T17:27:08.177Z"
    })
}

async fn setup() -> (MockServer, WormsClient) {
    let server = MockServer::start().await;
    let client = WormsClient::with_base_url(&server.uri());
    (server, client)
}

/// Answers a batched name lookup with one group per `scientificnames[]`
/// parameter; only names listed in `known` get a record
struct NameGroups {
    known: Vec<(&'static str, u64)>,
}

impl Respond for NameGroups {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let groups: Vec<serde_json::Value> = request
            .url
            .query_pairs()
            .filter(|(key, _)| key == "scientificnames[]")
            .map(|(_, name)| {
                match self.known.iter().find(|(known, _)| name == *known) {
                    Some((known, id)) => json!([record(*id, known)]),
                    None => json!([]),
                }
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(groups)
    }
}

/// Answers a batched id lookup with one entry per `aphiaids[]` parameter;
/// ids not listed in `known` come back as `null`
struct IdRecords {
    known: Vec<u64>,
}

impl Respond for IdRecords {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let records: Vec<serde_json::Value> = request
            .url
            .query_pairs()
            .filter(|(key, _)| key == "aphiaids[]")
            .map(|(_, id)| match id.parse::<u64>() {
                Ok(id) if self.known.contains(&id) => record(id, "Known taxon"),
                _ => serde_json::Value::Null,
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(records)
    }
}

#[tokio::test]
async fn test_record_by_aphia_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordByAphiaID/127160"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(127160, "Solea solea")))
        .mount(&server)
        .await;

    let record = client.aphia_record_by_aphia_id(127160).await.unwrap().unwrap();
    assert_eq!(record.aphia_id, 127160);
    assert_eq!(record.scientific_name.as_deref(), Some("Solea solea"));
    assert_eq!(record.is_marine, Some(true));
}

#[tokio::test]
async fn test_no_content_is_absent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordByAphiaID/999999999"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert!(client.aphia_record_by_aphia_id(999999999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_not_found_is_absent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaNameByAphiaID/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client.aphia_name_by_aphia_id(42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_collection_no_content_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaSynonymsByAphiaID/1"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert!(client.aphia_synonyms_by_aphia_id(1, 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaVernacularsByAphiaID/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.aphia_vernaculars_by_aphia_id(2).await.unwrap_err();
    match err {
        WormsError::Status { status, url } => {
            assert_eq!(status.as_u16(), 500);
            assert!(url.ends_with("/AphiaVernacularsByAphiaID/2"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_reported() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaSourcesByAphiaID/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = client.aphia_sources_by_aphia_id(1).await.unwrap_err();
    assert!(matches!(err, WormsError::Json(_)));
}

#[tokio::test]
async fn test_id_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaIDByName/Solea%20solea"))
        .and(query_param("marine_only", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(127160))
        .mount(&server)
        .await;

    assert_eq!(
        client.aphia_id_by_name("Solea solea", false).await.unwrap(),
        Some(127160)
    );
}

#[tokio::test]
async fn test_id_by_ambiguous_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaIDByName/Aphia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(-999))
        .mount(&server)
        .await;

    assert_eq!(client.aphia_id_by_name("Aphia", true).await.unwrap(), None);
}

#[tokio::test]
async fn test_blank_name_rejected_without_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.aphia_records_by_name("  ", true, false, 1).await.unwrap_err();
    assert!(matches!(err, WormsError::InvalidArgument(_)));

    let err = client
        .aphia_records_by_match_names::<&str>(&[], false)
        .await
        .unwrap_err();
    assert!(matches!(err, WormsError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_records_by_name_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByName/Solea%20solea"))
        .and(query_param("like", "true"))
        .and(query_param("marine_only", "false"))
        .and(query_param("offset", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([record(127160, "Solea solea")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = client
        .aphia_records_by_name("Solea solea", true, false, 1)
        .await
        .unwrap();
    assert!(records.iter().any(|r| r.aphia_id == 127160));
}

#[tokio::test]
async fn test_external_id_lookups() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaExternalIDByAphiaID/127160"))
        .and(query_param("type", "ncbi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["90069"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordByExternalID/90069"))
        .and(query_param("type", "ncbi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record(127160, "Solea solea")))
        .mount(&server)
        .await;

    let ids = client
        .aphia_external_id_by_aphia_id(127160, ExternalIdentifierSource::Ncbi)
        .await
        .unwrap();
    assert_eq!(ids, vec!["90069".to_string()]);

    let record = client
        .aphia_record_by_external_id("90069", ExternalIdentifierSource::Ncbi)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.aphia_id, 127160);
}

#[tokio::test]
async fn test_records_by_date_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByDate"))
        .and(query_param("startdate", "2018-04-03T00:00:00+00:00"))
        .and(query_param("enddate", "2018-04-04T00:00:00+00:00"))
        .and(query_param("marine_only", "false"))
        .and(query_param("offset", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([record(1214714, "Example")])),
        )
        .mount(&server)
        .await;

    let to = Utc.with_ymd_and_hms(2018, 4, 4, 0, 0, 0).unwrap();
    let from = Utc.with_ymd_and_hms(2018, 4, 3, 0, 0, 0).unwrap();

    let records = client
        .aphia_records_by_date(from, to, false, 1)
        .await
        .unwrap();
    assert_eq!(records[0].aphia_id, 1214714);

    let err = client
        .aphia_records_by_date(to, from, false, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, WormsError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_classification() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaClassificationByAphiaID/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AphiaID": 1,
            "rank": "Superdomain",
            "scientificname": "Biota",
            "child": {
                "AphiaID": 2,
                "rank": "Kingdom",
                "scientificname": "Animalia",
                "child": null
            }
        })))
        .mount(&server)
        .await;

    let classification = client
        .aphia_classification_by_aphia_id(2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(classification.aphia_id, 1);
    assert_eq!(classification.leaf().aphia_id, 2);
    assert_eq!(classification.parent_of(2).map(|c| c.aphia_id), Some(1));
}

#[tokio::test]
async fn test_attribute_endpoints_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaAttributesByAphiaID/127160"))
        .and(query_param("include_inherited", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "AphiaID": 127160,
            "measurementTypeID": 23,
            "measurementType": "Species importance to society",
            "measurementValue": "Fisheries",
            "source_id": null,
            "reference": null,
            "qualitystatus": "checked",
            "AphiaID_Inherited": 0,
            "CategoryID": 13,
            "children": []
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/AphiaAttributeKeysByID/23"))
        .and(query_param("include_children", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "measurementTypeID": 23,
            "measurementType": "Species importance to society",
            "input_id": 0,
            "CategoryID": 13,
            "children": []
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/AphiaIDsByAttributeKeyID/23"))
        .and(query_param("offset", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "AphiaID": 127160,
            "Attributes": [{"AphiaID": 127160, "measurementTypeID": 23}]
        }])))
        .mount(&server)
        .await;

    let attributes = client.aphia_attributes_by_aphia_id(127160, true).await.unwrap();
    assert!(attributes
        .iter()
        .any(|a| a.aphia_id == Some(127160) && a.measurement_type_id == 23));

    let keys = client.aphia_attribute_keys_by_id(23, false).await.unwrap();
    assert!(keys
        .iter()
        .any(|k| k.measurement_type_id == 23 && k.category_id == Some(13)));

    let sets = client.aphia_ids_by_attribute_key_id(23, 1).await.unwrap();
    assert!(sets
        .iter()
        .any(|s| s.attributes.iter().any(|a| a.measurement_type_id == 23)));
}

#[tokio::test]
async fn test_match_names_alignment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByMatchNames"))
        .and(query_param("marine_only", "false"))
        .respond_with(NameGroups {
            known: vec![("Aphanizomenon", 146546)],
        })
        .expect(1)
        .mount(&server)
        .await;

    let results = client
        .aphia_records_by_match_names(&["Aphanizomenon", "something providing no result"], false)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
    assert!(results[0].is_some());
    assert!(results[1].is_none());
}

#[tokio::test]
async fn test_match_names_split_into_chunks() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByMatchNames"))
        .respond_with(NameGroups {
            known: vec![("Solea solea", 127160), ("Solea", 126132)],
        })
        .expect(2)
        .mount(&server)
        .await;

    let mut names = vec!["Solea solea".to_string()];
    for i in 0..50 {
        names.push(format!("something providing no result {}", i));
    }
    names.push("Solea".to_string());

    let results = client.aphia_records_by_match_names(&names, false).await.unwrap();

    assert_eq!(results.len(), 52);
    assert_eq!(results[0].as_ref().unwrap()[0].aphia_id, 127160);
    assert_eq!(results[51].as_ref().unwrap()[0].aphia_id, 126132);
    assert_eq!(results.iter().filter(|r| r.is_some()).count(), 2);
}

#[tokio::test]
async fn test_names_chunk_without_content_keeps_alignment() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByNames"))
        .and(query_param("like", "true"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let results = client
        .aphia_records_by_names(
            &["something providing no result", "something else providing no result"],
            true,
            false,
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Option::is_none));
}

#[tokio::test]
async fn test_records_by_aphia_ids() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByAphiaIDs"))
        .and(query_param("aphiaids[]", "127160"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([record(127160, "Solea solea"), null])),
        )
        .mount(&server)
        .await;

    let results = client.aphia_records_by_aphia_ids(&[127160, 0]).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().map(|r| r.aphia_id), Some(127160));
    assert!(results[1].is_none());
}

#[tokio::test]
async fn test_taxon_ranks_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaTaxonRanksByName/Species"))
        .and(query_param("AphiaID", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"taxonRankID": 220, "taxonRank": "Species", "AphiaID": 2}
        ])))
        .mount(&server)
        .await;

    let ranks = client.aphia_taxon_ranks_by_name("Species", Some(2)).await.unwrap();
    assert_eq!(ranks[0].taxon_rank_id, 220);
}

#[tokio::test]
async fn test_connection_failure_is_reported() {
    // nothing listens on the discard port
    let client = WormsClient::with_base_url("http://127.0.0.1:9");

    let err = client.aphia_record_by_aphia_id(127160).await.unwrap_err();
    assert!(matches!(err, WormsError::Http(_)));
    assert!(err.source().is_some());
}

#[tokio::test]
async fn test_id_by_name_unexpected_negative_answer() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaIDByName/Solea"))
        .respond_with(ResponseTemplate::new(200).set_body_json(-5))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.aphia_id_by_name("Solea", false).await.unwrap(), None);
}

#[tokio::test]
async fn test_records_by_aphia_ids_split_into_chunks() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByAphiaIDs"))
        .respond_with(IdRecords {
            known: vec![1, 50, 51],
        })
        .expect(2)
        .mount(&server)
        .await;

    let ids: Vec<u64> = (1..=53).collect();
    let results = client.aphia_records_by_aphia_ids(&ids).await.unwrap();

    assert_eq!(results.len(), 53);
    for (id, result) in ids.iter().zip(&results) {
        match id {
            1 | 50 | 51 => assert_eq!(result.as_ref().map(|r| r.aphia_id), Some(*id)),
            _ => assert!(result.is_none(), "id {} should have no record", id),
        }
    }
}

#[tokio::test]
async fn test_failing_chunk_fails_whole_batch() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByMatchNames"))
        .and(query_param("scientificnames[]", "Broken name"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/AphiaRecordsByMatchNames"))
        .respond_with(NameGroups {
            known: vec![("Solea solea", 127160)],
        })
        .expect(1)
        .mount(&server)
        .await;

    let mut names = vec!["Solea solea".to_string()];
    for i in 0..49 {
        names.push(format!("something providing no result {}", i));
    }
    names.push("Solea".to_string());
    names.push("Broken name".to_string());

    let err = client
        .aphia_records_by_match_names(&names, false)
        .await
        .unwrap_err();
    match err {
        WormsError::Status { status, .. } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status error, got {:?}", other),
    }
}

//! HTTP API tests
//!
//! Requests go through the full router (layers included) backed by the
//! in-memory store loaded from the standard fixtures.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use catalog_server::api;
use catalog_server::config::Config;
use catalog_server::ingest::BulkLoader;
use catalog_server::models::ProteinRecord;
use serde_json::Value;
use tower::ServiceExt;

use common::*;

async fn loaded_app() -> Router {
    let (_dir, paths) = fixture_dir();
    let (_, shared) = memory_store();
    BulkLoader::new(shared.clone()).load(&paths).await.unwrap();
    api::router(shared, &Config::default().cors)
}

fn empty_app() -> Router {
    let (_, shared) = memory_store();
    api::router(shared, &Config::default().cors)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: &impl serde::Serialize) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    send(app, request).await
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_on_both_paths() {
    let app = empty_app();

    for uri in ["/health", "/api/v1/health"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["status"], "healthy");
    }
}

// ============================================================================
// Proteins
// ============================================================================

#[tokio::test]
async fn test_create_protein() {
    init_test_tracing();
    let app = empty_app();
    let record = protein_record("P12345", 9606);

    let (status, body) = post_json(&app, "/api/v1/proteins", &record).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let created: ProteinRecord = serde_json::from_value(body["data"].clone()).unwrap();
    assert_eq!(created, record);
    assert!(body["data"].get("id").is_none());

    let (status, body) = get(&app, "/api/v1/proteins/P12345").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["organism"]["taxa_id"], 9606);
    assert_eq!(body["data"]["domains"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_duplicate_protein_is_conflict() {
    let app = loaded_app().await;

    let (status, body) = post_json(&app, "/api/v1/proteins", &protein_record("A0A016S8J7", 53326)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_invalid_protein_is_bad_request() {
    let app = empty_app();
    let mut record = protein_record("P12345", 9606);
    record.length = 0;

    let (status, body) = post_json(&app, "/api/v1/proteins", &record).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["rule"], "length_not_positive");
    assert_eq!(body["error"]["details"]["kind"], "protein");

    let (_, body) = get(&app, "/api/v1/proteins").await;
    assert_eq!(body["meta"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_get_protein_detail() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/proteins/A0A016S8J7").await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["protein_id"], "A0A016S8J7");
    assert_eq!(data["sequence"], "MVIGLSTLLALLCAQFSGAEA");
    assert_eq!(data["length"], 101);
    assert_eq!(data["organism"]["genus"], "Ancylostoma");
    assert_eq!(data["domains"][0]["pfam"]["domain_id"], "PF01650");
    assert_eq!(data["domains"][0]["start"], 40);
    assert_eq!(data["domains"][1]["pfam"]["domain_id"], "PF00001");
}

#[tokio::test]
async fn test_get_unknown_protein_is_not_found() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/proteins/NOPE").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_proteins_paginates() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/proteins?page=2&per_page=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let pagination = &body["meta"]["pagination"];
    assert_eq!(pagination["total"], FIXTURE_PROTEINS);
    assert_eq!(pagination["pages"], 2);
    assert_eq!(pagination["has_prev"], true);
    assert_eq!(pagination["has_next"], false);
}

#[tokio::test]
async fn test_list_rejects_bad_pagination() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/proteins?per_page=0").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = get(&app, "/api/v1/proteins?page=9223372036854775807&per_page=20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Coverage
// ============================================================================

#[tokio::test]
async fn test_coverage() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/coverage/A0A016S8J7").await;
    assert_eq!(status, StatusCode::OK);
    let expected = (54.0 + 30.0) / 101.0;
    let coverage = body["data"]["coverage"].as_f64().unwrap();
    assert!((coverage - expected).abs() < 1e-12);

    let (status, body) = get(&app, "/api/v1/coverage/A0A014PQC0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["coverage"], 0.06);
}

#[tokio::test]
async fn test_coverage_of_unknown_protein_is_not_found() {
    let app = loaded_app().await;

    let (status, _) = get(&app, "/api/v1/coverage/NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Organisms
// ============================================================================

#[tokio::test]
async fn test_list_organisms() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/organisms").await;

    assert_eq!(status, StatusCode::OK);
    let taxa: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["taxa_id"].as_i64().unwrap())
        .collect();
    assert_eq!(taxa, vec![53326, 1344]);
    assert_eq!(body["meta"]["pagination"]["total"], FIXTURE_ORGANISMS);
}

#[tokio::test]
async fn test_organism_proteins() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/organisms/53326/proteins").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["protein_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["A0A016S8J7", "A0A016S8J8"]);
}

#[tokio::test]
async fn test_organism_pfams_are_distinct() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/organisms/53326/pfams").await;

    assert_eq!(status, StatusCode::OK);
    let mut ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["domain_id"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["PF00001", "PF01650"]);
}

#[tokio::test]
async fn test_organism_lookups_reject_bad_taxa() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/organisms/9999/proteins").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = get(&app, "/api/v1/organisms/0/pfams").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Pfams and domains
// ============================================================================

#[tokio::test]
async fn test_pfam_detail() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/pfams/PF01650").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["domain_id"], "PF01650");
    assert_eq!(body["data"]["domain_description"], "PeptidaseC13family");

    let (status, _) = get(&app, "/api/v1/pfams/PF99999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pfam_domains() {
    let app = loaded_app().await;

    let (status, body) = get(&app, "/api/v1/pfams/PF00001/domains").await;

    assert_eq!(status, StatusCode::OK);
    let domains = body["data"].as_array().unwrap();
    assert_eq!(domains.len(), 2);
    assert!(domains.iter().all(|d| d["description"] == "GPCR rhodopsin-like"));
}

#[tokio::test]
async fn test_list_pfams_and_domains() {
    let app = loaded_app().await;

    let (_, body) = get(&app, "/api/v1/pfams?per_page=100").await;
    assert_eq!(body["meta"]["pagination"]["total"], FIXTURE_PFAMS);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = get(&app, "/api/v1/domains").await;
    assert_eq!(body["meta"]["pagination"]["total"], FIXTURE_DOMAINS);
    assert_eq!(body["data"][0]["start"], 40);
}

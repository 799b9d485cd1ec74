//! Request shapes of the resource methods: paths, query strings and bodies.

mod common;

use chrono::{TimeZone, Utc};
use common::*;
use contract_sdk::{
    ContractListParams, ContractUpdate, DateRange, NewComment, NewContract, NewTemplate, Patch,
    SortOrder, TemplateListParams, TemplateUpdate,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

#[tokio::test]
async fn test_list_contracts_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contracts"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .and(query_param("sortBy", "createdAt"))
        .and(query_param("sortOrder", "desc"))
        .and(query_param_is_missing("status"))
        .and(query_param_is_missing("type"))
        .respond_with(ok(json!({"items": [{"id": "c-1"}], "total": 1, "page": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .list_contracts(&ContractListParams::default())
        .await
        .unwrap();
    assert_eq!(page["items"][0]["id"], "c-1");
}

#[tokio::test]
async fn test_list_contracts_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contracts"))
        .and(query_param("status", "pending_approval"))
        .and(query_param("type", "nda"))
        .and(query_param("search", "acme corp"))
        .and(query_param("sortOrder", "asc"))
        .and(query_param("limit", "50"))
        .respond_with(ok(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let params = ContractListParams {
        limit: 50,
        status: Some("pending_approval".to_string()),
        contract_type: Some("nda".to_string()),
        search: Some("acme corp".to_string()),
        sort_order: SortOrder::Asc,
        ..Default::default()
    };
    client_for(&server).list_contracts(&params).await.unwrap();
}

#[tokio::test]
async fn test_create_contract_omits_absent_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contracts"))
        .and(body_json(json!({
            "title": "Supplier Agreement",
            "type": "purchase",
            "value": 25000.0,
            "currency": "EUR",
            "parties": [{"name": "Acme GmbH", "role": "supplier"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "c-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let contract = NewContract {
        value: Some(25_000.0),
        currency: Some("EUR".to_string()),
        parties: Some(vec![json!({"name": "Acme GmbH", "role": "supplier"})]),
        ..NewContract::new("Supplier Agreement", "purchase")
    };
    let created = client_for(&server).create_contract(&contract).await.unwrap();
    assert_eq!(created["id"], "c-1");
}

#[tokio::test]
async fn test_update_contract_sends_only_present_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/contracts/c-1"))
        .and(body_json(json!({"title": "Renamed", "description": null})))
        .respond_with(ok(json!({"id": "c-1", "title": "Renamed"})))
        .expect(1)
        .mount(&server)
        .await;

    let update = ContractUpdate {
        title: Patch::Set("Renamed".to_string()),
        description: Patch::Clear,
        ..Default::default()
    };
    client_for(&server)
        .update_contract("c-1", &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_contract_lifecycle_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contracts/c-1/versions"))
        .respond_with(ok(json!([{"version": 1}, {"version": 2}])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contracts/c-1/compare"))
        .and(body_json(json!({"version1": 1, "version2": 2})))
        .respond_with(ok(json!({"changes": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contracts/c-1/submit-approval"))
        .and(body_json(json!({"approvers": ["u-2", "u-3"], "message": "Please review"})))
        .respond_with(ok(json!({"status": "pending_approval"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contracts/c-1/approve"))
        .and(body_json(json!({})))
        .respond_with(ok(json!({"status": "approved"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contracts/c-1/reject"))
        .and(body_json(json!({"reason": "Liability cap missing"})))
        .respond_with(ok(json!({"status": "rejected"})))
        .expect(1)
        .mount(&server)
        .await;

    let signature = json!({
        "signatureType": "electronic",
        "signature": "data:image/png;base64,AAAA",
        "ipAddress": null
    });
    Mock::given(method("POST"))
        .and(path("/contracts/c-1/sign"))
        .and(body_json(signature.clone()))
        .respond_with(ok(json!({"status": "signed"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let versions = client.contract_versions("c-1").await.unwrap();
    assert_eq!(versions.as_array().map(Vec::len), Some(2));

    client.compare_contract_versions("c-1", 1, 2).await.unwrap();
    client
        .submit_for_approval("c-1", &["u-2", "u-3"], Some("Please review"))
        .await
        .unwrap();
    let approved = client.approve_contract("c-1", None).await.unwrap();
    assert_eq!(approved["status"], "approved");
    client
        .reject_contract("c-1", "Liability cap missing")
        .await
        .unwrap();
    let signed = client.sign_contract("c-1", &signature).await.unwrap();
    assert_eq!(signed["status"], "signed");
}

#[tokio::test]
async fn test_search_and_bulk_update() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contracts/search"))
        .and(query_param("q", "indemnity & liability"))
        .respond_with(ok(json!([{"id": "c-4"}])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contracts/bulk-update"))
        .and(body_json(json!({
            "contractIds": ["c-1", "c-2"],
            "updates": {"status": "archived", "tags": ["2025"]}
        })))
        .respond_with(ok(json!({"updated": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hits = client.search_contracts("indemnity & liability").await.unwrap();
    assert_eq!(hits[0]["id"], "c-4");

    let updates = ContractUpdate {
        status: Patch::Set("archived".to_string()),
        tags: Patch::Set(vec!["2025".to_string()]),
        ..Default::default()
    };
    let result = client
        .bulk_update_contracts(&["c-1", "c-2"], &updates)
        .await
        .unwrap();
    assert_eq!(result["updated"], 2);
}

#[tokio::test]
async fn test_comment_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/contracts/c-1/comments"))
        .respond_with(ok(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contracts/c-1/comments"))
        .and(body_json(json!({
            "content": "See clause 7",
            "parentId": "m-1",
            "mentions": ["u-9"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "m-2"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/contracts/c-1/comments/m-2"))
        .and(body_json(json!({"content": "See clause 8"})))
        .respond_with(ok(json!({"id": "m-2"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/contracts/c-1/comments/m-2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.list_comments("c-1").await.unwrap();

    let comment = NewComment {
        parent_id: Some("m-1".to_string()),
        mentions: Some(vec!["u-9".to_string()]),
        ..NewComment::new("See clause 7")
    };
    let created = client.add_comment("c-1", &comment).await.unwrap();
    assert_eq!(created["id"], "m-2");

    client
        .update_comment("c-1", "m-2", "See clause 8")
        .await
        .unwrap();
    client.delete_comment("c-1", "m-2").await.unwrap();
}

#[tokio::test]
async fn test_template_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/templates"))
        .and(query_param("isPublic", "true"))
        .and(query_param("category", "employment"))
        .respond_with(ok(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/templates"))
        .and(body_json(json!({
            "name": "Offer Letter",
            "category": "employment",
            "content": "Dear {{name}}",
            "isPublic": false,
            "tags": ["hr"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "t-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/templates/t-1"))
        .respond_with(ok(json!({"id": "t-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/templates/t-1"))
        .and(body_json(json!({"isPublic": true, "price": 19.0})))
        .respond_with(ok(json!({"id": "t-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/templates/t-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .list_templates(&TemplateListParams {
            is_public: Some(true),
            category: Some("employment".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let template = NewTemplate {
        tags: Some(vec!["hr".to_string()]),
        ..NewTemplate::new("Offer Letter", "employment", "Dear {{name}}")
    };
    let created = client.create_template(&template).await.unwrap();
    assert_eq!(created["id"], "t-1");

    client.get_template("t-1").await.unwrap();
    client
        .update_template(
            "t-1",
            &TemplateUpdate {
                is_public: Patch::Set(true),
                price: Patch::Set(19.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    client.delete_template("t-1").await.unwrap();
}

#[tokio::test]
async fn test_analytics_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/analytics/dashboard"))
        .and(query_param("startDate", "2026-01-01T00:00:00Z"))
        .and(query_param("endDate", "2026-06-30T00:00:00Z"))
        .respond_with(ok(json!({"totalContracts": 12})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/analytics/contracts/c-1"))
        .respond_with(ok(json!({"views": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let range = DateRange::new(
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 6, 30, 0, 0, 0).unwrap(),
    );
    let dashboard = client.dashboard_analytics(&range).await.unwrap();
    assert_eq!(dashboard["totalContracts"], 12);

    let stats = client.contract_analytics("c-1").await.unwrap();
    assert_eq!(stats["views"], 3);
}

use serde_json::json;
use uuid::Uuid;
use waypoint_core::{
    Coordinates, FavoriteIcon, HistoryError, Location, LocationHistoryStore, UserId,
};
use waypoint_resolver::HttpHistoryStore;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "6f1c2f0e-8d7b-4c4e-9a55-1c3f0b7d2e11";

fn user() -> UserId {
    UserId(Uuid::parse_str(USER).unwrap())
}

fn store(server: &MockServer) -> HttpHistoryStore {
    HttpHistoryStore::new(&server.uri(), Some("secret".to_string())).unwrap()
}

fn meta() -> serde_json::Value {
    json!({"request_id": "req-1", "timestamp": "2026-03-01T12:00:00Z"})
}

fn recent_json(address: &str, usage_count: u32) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "location": {
            "address": address,
            "coordinates": {"lat": 39.78, "lng": -89.65},
            "detailedAddress": {"city": "Springfield", "state": "IL"}
        },
        "usageCount": usage_count,
        "lastUsedAt": "2026-03-01T12:00:00Z"
    })
}

fn error_json(code: &str, message: &str) -> serde_json::Value {
    json!({"error": {"code": code, "message": message}, "meta": meta()})
}

fn work() -> Location {
    Location::new("100 Main St")
        .unwrap()
        .with_coordinates(Coordinates::new(39.78, -89.65).unwrap())
}

#[tokio::test]
async fn get_recents_sends_user_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/locations/recent"))
        .and(query_param("limit", "5"))
        .and(header("x-user-id", USER))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [recent_json("200 Main Ave", 3), recent_json("100 Main St", 1)],
            "meta": meta()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let recents = store(&server).get_recents(user(), 5).await.unwrap();

    assert_eq!(recents.len(), 2);
    assert_eq!(recents[0].location.address, "200 Main Ave");
    assert_eq!(recents[0].usage_count, 3);
    assert_eq!(
        recents[0].location.detailed_address.city.as_deref(),
        Some("Springfield")
    );
}

#[tokio::test]
async fn record_usage_posts_flat_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/locations/recent"))
        .and(body_partial_json(json!({
            "address": "100 Main St",
            "lat": 39.78,
            "lng": -89.65
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": recent_json("100 Main St", 2),
            "meta": meta()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entry = store(&server).record_usage(user(), &work()).await.unwrap();
    assert_eq!(entry.usage_count, 2);
}

#[tokio::test]
async fn add_favorite_conflict_is_duplicate_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/locations/favorites"))
        .and(body_partial_json(json!({"name": "Home", "address": "100 Main St"})))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(error_json("conflict", "a favorite named \"Home\" already exists")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server)
        .add_favorite(user(), " Home ", &work())
        .await
        .unwrap_err();
    assert_eq!(err, HistoryError::DuplicateName("Home".to_string()));
}

#[tokio::test]
async fn add_favorite_parses_created_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/locations/favorites"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "id": Uuid::new_v4(),
                "name": "Work",
                "icon": "office",
                "location": {"address": "100 Main St", "coordinates": null},
                "createdAt": "2026-03-01T12:00:00Z"
            },
            "meta": meta()
        })))
        .mount(&server)
        .await;

    let favorite = store(&server)
        .add_favorite(user(), "Work", &work())
        .await
        .unwrap();
    assert_eq!(favorite.icon, FavoriteIcon::Office);
    assert_eq!(favorite.label(), "Work (100 Main St)");
}

#[tokio::test]
async fn blank_favorite_name_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = store(&server)
        .add_favorite(user(), "  ", &work())
        .await
        .unwrap_err();
    assert_eq!(err, HistoryError::InvalidName);
}

#[tokio::test]
async fn server_name_rejection_is_keyed_on_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/locations/favorites"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(error_json("invalid_name", "name too long")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server)
        .add_favorite(user(), "Work", &work())
        .await
        .unwrap_err();
    assert_eq!(err, HistoryError::InvalidName);
}

#[tokio::test]
async fn other_bad_requests_are_invalid_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/locations/favorites"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_json(
            "validation_error",
            &HistoryError::InvalidName.to_string(),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server)
        .add_favorite(user(), "Work", &work())
        .await
        .unwrap_err();
    assert_eq!(err, HistoryError::InvalidLocation);
}

#[tokio::test]
async fn remove_missing_favorite_is_not_found() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    Mock::given(method("DELETE"))
        .and(path(format!("/api/v1/locations/favorites/{id}")))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(error_json("not_found", "favorite not found")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server).remove_favorite(user(), id).await.unwrap_err();
    assert_eq!(err, HistoryError::NotFound);
}

#[tokio::test]
async fn remove_favorite_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store(&server)
        .remove_favorite(user(), Uuid::new_v4())
        .await
        .unwrap();
}

#[tokio::test]
async fn short_search_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let found = store(&server).search_by_text(user(), " ma ").await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn search_returns_both_lists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/locations/search"))
        .and(query_param("q", "Main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"recent": [recent_json("200 Main Ave", 1)], "favorite": []},
            "meta": meta()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = store(&server).search_by_text(user(), " Main ").await.unwrap();
    assert_eq!(found.recent.len(), 1);
    assert!(found.favorite.is_empty());
}

#[tokio::test]
async fn server_errors_are_storage_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/locations/favorites"))
        .respond_with(ResponseTemplate::new(503).set_body_json(error_json(
            "storage_unavailable",
            "history storage unavailable",
        )))
        .mount(&server)
        .await;

    let err = store(&server).get_favorites(user()).await.unwrap_err();
    assert!(matches!(err, HistoryError::StorageUnavailable(reason) if reason.contains("503")));
}

#[tokio::test]
async fn malformed_body_is_storage_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = store(&server).get_favorites(user()).await.unwrap_err();
    assert!(matches!(err, HistoryError::StorageUnavailable(_)));
}

#[tokio::test]
async fn unreachable_server_is_storage_unavailable() {
    let store = HttpHistoryStore::new("http://127.0.0.1:9", None).unwrap();
    let err = store.ping().await.unwrap_err();
    assert!(matches!(err, HistoryError::StorageUnavailable(_)));
}

#[tokio::test]
async fn ping_hits_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"status": "ok", "storage": "ok"},
            "meta": meta()
        })))
        .expect(1)
        .mount(&server)
        .await;

    store(&server).ping().await.unwrap();
}

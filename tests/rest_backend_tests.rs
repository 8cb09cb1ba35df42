//! REST backend tests against a wiremock server
//!
//! The mock plays the auth, PostgREST and storage endpoints so the request
//! shapes (headers, filters, bodies) are checked without any network access.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crewdesk::backend::{BackendError, IdentityProvider, ObjectStorage, RecordStore, RestBackend};
use crewdesk::booking::{BookingId, BookingQuery, BookingUpdate, HistorySort, Stage, WorkStatus};

const ANON_KEY: &str = "anon-key";
const TOKEN: &str = "session-token";

struct BackendApiMock {
    server: MockServer,
}

impl BackendApiMock {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn client(&self, token: Option<&str>) -> RestBackend {
        RestBackend::new(
            &self.server.uri(),
            ANON_KEY,
            token.map(str::to_string),
            "work-photos",
            Duration::from_secs(5),
        )
        .unwrap()
    }
}

#[tokio::test]
async fn test_current_user_sends_session_headers() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "pro@example.com",
            "role": "authenticated"
        })))
        .expect(1)
        .mount(&mock.server)
        .await;

    let user = mock.client(Some(TOKEN)).current_user().await.unwrap().unwrap();
    assert_eq!(user.id, "user-1");
    assert_eq!(user.email.as_deref(), Some("pro@example.com"));
}

#[tokio::test]
async fn test_current_user_without_token_or_with_expired_session_is_none() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "JWT expired"})))
        .mount(&mock.server)
        .await;

    assert!(mock.client(None).current_user().await.unwrap().is_none());
    assert!(mock.client(Some(TOKEN)).current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn test_upload_posts_jpeg_to_bucket_path() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/work-photos/staff_uploads/pro@example.com/b1/start_1.jpg"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "work-photos/x"})))
        .expect(1)
        .mount(&mock.server)
        .await;

    let client = mock.client(Some(TOKEN));
    client
        .upload_object("staff_uploads/pro@example.com/b1/start_1.jpg", &[0xFF, 0xD8], "image/jpeg")
        .await
        .unwrap();
    assert_eq!(client.metrics().get_stats().uploads, 1);
    assert_eq!(
        client.public_url("staff_uploads/pro@example.com/b1/start_1.jpg"),
        format!(
            "{}/storage/v1/object/public/work-photos/staff_uploads/pro@example.com/b1/start_1.jpg",
            mock.server.uri()
        )
    );
}

#[tokio::test]
async fn test_upload_failure_surfaces_backend_message() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "statusCode": "403",
            "error": "Unauthorized",
            "message": "new row violates row-level security policy"
        })))
        .mount(&mock.server)
        .await;

    let err = mock
        .client(Some(TOKEN))
        .upload_object("a.jpg", &[1, 2, 3], "image/jpeg")
        .await
        .unwrap_err();
    match err {
        BackendError::Http { status, message, .. } => {
            assert_eq!(status, 400);
            assert_eq!(message, "new row violates row-level security policy");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_completion_patch_body_and_filter() {
    let mock = BackendApiMock::new().await;
    let ended_at = chrono::DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", "eq.b1"))
        .and(header("prefer", "return=minimal"))
        .and(body_json(json!({
            "work_ended_at": "2024-05-01T10:00:00Z",
            "work_status": "COMPLETED",
            "worked_duration": 3
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;

    mock.client(Some(TOKEN))
        .update_booking(&BookingId::new("b1"), &BookingUpdate::completed(3, ended_at))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_photo_update_replaces_whole_array() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(body_json(json!({"end_photo_url": ["https://cdn/1.jpg", "https://cdn/2.jpg"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;

    let urls = vec!["https://cdn/1.jpg".to_string(), "https://cdn/2.jpg".to_string()];
    mock.client(Some(TOKEN))
        .update_booking(&BookingId::new("b1"), &BookingUpdate::photo_urls(Stage::End, urls))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_history_query_filters_and_decodes_rows() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("assigned_staff_email", "eq.pro@example.com"))
        .and(query_param("work_status", "eq.COMPLETED"))
        .and(query_param("order", "customer_name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 17,
                "customer_name": "Ada",
                "startotp": 123456,
                "endotp": "654321",
                "start_photo_url": null,
                "end_photo_url": ["https://cdn/after.jpg"],
                "work_status": "COMPLETED",
                "worked_duration": 3725,
                "work_ended_at": "2024-05-01 10:00:00+00",
                "assigned_staff_email": "pro@example.com"
            }
        ])))
        .mount(&mock.server)
        .await;

    let rows = mock
        .client(Some(TOKEN))
        .fetch_bookings(&BookingQuery::completed("pro@example.com", HistorySort::Name, None))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id.as_str(), "17");
    assert_eq!(row.start_otp.as_deref(), Some("123456"));
    assert!(row.start_photo_urls.is_empty());
    assert_eq!(row.work_status, WorkStatus::Completed);
    assert_eq!(row.worked_duration_seconds, Some(3725));
    assert!(row.work_ended_at.is_some());
}

#[tokio::test]
async fn test_count_reads_content_range_total() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/bookings"))
        .and(header("prefer", "count=exact"))
        .and(query_param("is_viewed", "eq.false"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/4"))
        .mount(&mock.server)
        .await;

    let count = mock
        .client(Some(TOKEN))
        .count_bookings(&BookingQuery::unviewed("pro@example.com"))
        .await
        .unwrap();
    assert_eq!(count, 4);
}

#[tokio::test]
async fn test_mark_viewed_uses_in_filter() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", "in.(a,b)"))
        .and(body_json(json!({"is_viewed": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;

    mock.client(Some(TOKEN))
        .mark_viewed(&[BookingId::new("a"), BookingId::new("b")])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_availability_patches_staff_profile() {
    let mock = BackendApiMock::new().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/staff_profile"))
        .and(query_param("id", "eq.user-1"))
        .and(body_json(json!({"is_available": false})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock.server)
        .await;

    mock.client(Some(TOKEN)).set_availability("user-1", false).await.unwrap();
}

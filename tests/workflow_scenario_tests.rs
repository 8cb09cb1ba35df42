//! End-to-end workflow runs against the file-backed backend
//!
//! Each test seeds a temporary data directory, drives a full visit through
//! `ServiceCompletionWorkflow` and then inspects what landed on disk.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crewdesk::backend::{Backend, LocalBackend, RecordStore};
use crewdesk::booking::{Booking, BookingId, StaffIdentity, Stage, WorkStatus};
use crewdesk::camera::{Camera, CameraError, CaptureQuality, CapturedImage, PermissionStatus};
use crewdesk::workflow::{
    CodeCheck, ServiceCompletionWorkflow, TickSource, WorkflowError, WorkflowOptions, WorkflowStage,
};

/// Camera that always "takes" a tiny JPEG and numbers its shots
struct StubCamera {
    permission: PermissionStatus,
    shots: AtomicU32,
}

impl StubCamera {
    fn granted() -> Self {
        Self {
            permission: PermissionStatus::Granted,
            shots: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Camera for StubCamera {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn capture(&self, _quality: CaptureQuality) -> Result<Option<CapturedImage>, CameraError> {
        let shot = self.shots.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(CapturedImage {
            local_uri: format!("file:///device/shot-{shot}.jpg"),
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }))
    }
}

struct Fixture {
    _dir: TempDir,
    local: Arc<LocalBackend>,
}

impl Fixture {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let local = Arc::new(LocalBackend::new(
            dir.path(),
            "work-photos",
            Some(StaffIdentity {
                id: "user-1".into(),
                email: Some("pro@example.com".into()),
            }),
        ));
        let mut booking = Booking::new("b1", "123456", "654321");
        booking.assigned_staff_email = Some("pro@example.com".into());
        local.seed_bookings(vec![booking]).await.unwrap();
        Self { _dir: dir, local }
    }

    async fn workflow(&self, options: WorkflowOptions) -> ServiceCompletionWorkflow {
        let booking = self
            .local
            .fetch_booking(&BookingId::new("b1"))
            .await
            .unwrap()
            .unwrap();
        ServiceCompletionWorkflow::new(
            booking,
            Backend::from_shared(self.local.clone()),
            Arc::new(StubCamera::granted()),
            options,
        )
    }

    fn stored_row(&self) -> Value {
        let raw = std::fs::read(self.local.root().join("bookings.json")).unwrap();
        let rows: Vec<Value> = serde_json::from_slice(&raw).unwrap();
        rows.into_iter().find(|r| r["id"] == "b1").unwrap()
    }
}

#[tokio::test]
async fn test_full_visit_writes_completion_payload() {
    let fixture = Fixture::new().await;
    let mut wf = fixture.workflow(WorkflowOptions::default().manual_ticks()).await;

    assert_eq!(wf.submit_start_code("123456").unwrap(), CodeCheck::Verified);
    wf.capture_photo(Stage::Start).await.unwrap().unwrap();
    wf.start_work().await.unwrap();
    for _ in 0..3 {
        wf.tick();
    }
    assert_eq!(wf.stop_work().unwrap(), 3);
    wf.capture_photo(Stage::End).await.unwrap().unwrap();
    wf.submit_end_code("654321").unwrap();
    let report = wf.complete().await.unwrap();

    let payload = serde_json::to_value(&report.update).unwrap();
    let keys: Vec<&str> = payload.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 3);
    assert_eq!(payload["work_status"], "COMPLETED");
    assert_eq!(payload["worked_duration"], 3);
    assert!(payload["work_ended_at"].is_string());

    let row = fixture.stored_row();
    assert_eq!(row["work_status"], "COMPLETED");
    assert_eq!(row["worked_duration"], 3);
    assert!(row["work_started_at"].is_string());
    assert!(row["work_ended_at"].is_string());
    assert_eq!(row["start_photo_url"].as_array().unwrap().len(), 1);
    assert_eq!(row["end_photo_url"].as_array().unwrap().len(), 1);
    assert_eq!(wf.stage(), WorkflowStage::Completed);
}

#[tokio::test]
async fn test_photos_land_in_bucket_under_staff_path() {
    let fixture = Fixture::new().await;
    let mut wf = fixture.workflow(WorkflowOptions::default().manual_ticks()).await;

    wf.submit_start_code("123456").unwrap();
    let first = wf.capture_photo(Stage::Start).await.unwrap().unwrap();
    let second = wf.capture_photo(Stage::Start).await.unwrap().unwrap();

    for capture in [&first, &second] {
        let path = capture.public_url.trim_start_matches("file://");
        assert!(path.contains("objects/work-photos/staff_uploads/pro@example.com/b1/start_"));
        assert!(std::path::Path::new(path).exists());
    }

    let row = fixture.stored_row();
    let urls: Vec<&str> = row["start_photo_url"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(urls, vec![first.public_url.as_str(), second.public_url.as_str()]);
}

#[tokio::test]
async fn test_local_removal_does_not_touch_stored_urls() {
    let fixture = Fixture::new().await;
    let mut wf = fixture.workflow(WorkflowOptions::default().manual_ticks()).await;

    wf.submit_start_code("123456").unwrap();
    wf.capture_photo(Stage::Start).await.unwrap();
    wf.capture_photo(Stage::Start).await.unwrap();
    wf.capture_photo(Stage::Start).await.unwrap();

    let removed = wf.remove_photo(Stage::Start, 1).unwrap();
    assert_eq!(removed.local_uri, "file:///device/shot-2.jpg");
    let remaining: Vec<&str> = wf.photos(Stage::Start).iter().map(|p| p.local_uri.as_str()).collect();
    assert_eq!(remaining, vec!["file:///device/shot-1.jpg", "file:///device/shot-3.jpg"]);

    assert_eq!(fixture.stored_row()["start_photo_url"].as_array().unwrap().len(), 3);
    assert!(matches!(
        wf.remove_photo(Stage::Start, 5),
        Err(WorkflowError::PhotoIndex { index: 5, len: 2, .. })
    ));
}

#[tokio::test]
async fn test_abandoned_visit_keeps_only_start_time_and_photos() {
    let fixture = Fixture::new().await;
    {
        let mut wf = fixture.workflow(WorkflowOptions::default().manual_ticks()).await;
        wf.submit_start_code("123456").unwrap();
        wf.capture_photo(Stage::Start).await.unwrap();
        wf.start_work().await.unwrap();
        wf.tick();
    }

    let row = fixture.stored_row();
    assert!(row["work_started_at"].is_string());
    assert_eq!(row["start_photo_url"].as_array().unwrap().len(), 1);
    assert_eq!(row["work_status"], "PENDING");
    assert!(row["worked_duration"].is_null());

    let reopened = fixture.workflow(WorkflowOptions::default().manual_ticks()).await;
    assert_eq!(reopened.stage(), WorkflowStage::AwaitingStartCode);
    assert_eq!(reopened.booking().work_status, WorkStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_interval_timer_drives_elapsed_seconds() {
    let fixture = Fixture::new().await;
    let options = WorkflowOptions {
        tick_source: TickSource::Interval(Duration::from_secs(1)),
        ..WorkflowOptions::default()
    };
    let mut wf = fixture.workflow(options).await;

    wf.submit_start_code("123456").unwrap();
    wf.capture_photo(Stage::Start).await.unwrap();
    wf.start_work().await.unwrap();

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(wf.elapsed_display(), "00:00:03");
    assert_eq!(wf.stop_work().unwrap(), 3);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(wf.elapsed_seconds(), 3);
    assert!(!wf.snapshot().timer_running);
}

//! File-backed backend for offline use
//!
//! Tables are JSON arrays under the data directory (`bookings.json`,
//! `staff_profile.json`), uploaded objects land under `objects/`. Every table
//! access takes an advisory file lock so two processes sharing a data
//! directory cannot interleave a read-modify-write.

use async_trait::async_trait;
use fd_lock::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{BackendError, IdentityProvider, ObjectStorage, RecordStore};
use crate::booking::{Booking, BookingId, BookingQuery, BookingUpdate, StaffIdentity, StaffProfile};
use crate::config::BackendConfig;

const BOOKINGS_FILE: &str = "bookings.json";
const PROFILES_FILE: &str = "staff_profile.json";
const LOCK_FILE: &str = "tables.lock";

#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
    bucket: String,
    identity: Option<StaffIdentity>,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>, bucket: &str, identity: Option<StaffIdentity>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.to_string(),
            identity,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        let identity = config.local_staff_email.as_ref().map(|email| StaffIdentity {
            id: config.local_staff_id.clone().unwrap_or_else(|| email.clone()),
            email: Some(email.clone()),
        });
        Self::new(&config.data_dir, &config.photo_bucket, identity)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replace the bookings table, used to seed a data directory
    pub async fn seed_bookings(&self, bookings: Vec<Booking>) -> Result<(), BackendError> {
        let count = bookings.len();
        self.mutate_table(BOOKINGS_FILE, move |rows: &mut Vec<Booking>| {
            *rows = bookings;
            Ok(())
        })
        .await?;
        info!(count, root = %self.root.display(), "Seeded local bookings table");
        Ok(())
    }

    pub async fn seed_profiles(&self, profiles: Vec<StaffProfile>) -> Result<(), BackendError> {
        self.mutate_table(PROFILES_FILE, move |rows: &mut Vec<StaffProfile>| {
            *rows = profiles;
            Ok(())
        })
        .await
    }

    fn object_path(&self, path: &str) -> PathBuf {
        self.root.join("objects").join(&self.bucket).join(path)
    }

    async fn read_table<T>(&self, file: &'static str) -> Result<Vec<T>, BackendError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let root = self.root.clone();
        run_blocking(move || {
            let lock = open_lock(&root)?;
            let _guard = lock.read()?;
            load_rows(&root.join(file))
        })
        .await
    }

    async fn mutate_table<T, R, F>(&self, file: &'static str, mutate: F) -> Result<R, BackendError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        R: Send + 'static,
        F: FnOnce(&mut Vec<T>) -> Result<R, BackendError> + Send + 'static,
    {
        let root = self.root.clone();
        run_blocking(move || {
            let mut lock = open_lock(&root)?;
            let _guard = lock.write()?;
            let path = root.join(file);
            let mut rows = load_rows(&path)?;
            let result = mutate(&mut rows)?;
            store_rows(&path, &rows)?;
            Ok(result)
        })
        .await
    }
}

async fn run_blocking<R, F>(work: F) -> Result<R, BackendError>
where
    R: Send + 'static,
    F: FnOnce() -> Result<R, BackendError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BackendError::Io(std::io::Error::other(e)))?
}

fn open_lock(root: &Path) -> Result<RwLock<File>, BackendError> {
    fs::create_dir_all(root)?;
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(root.join(LOCK_FILE))?;
    Ok(RwLock::new(file))
}

fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, BackendError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw)?)
}

fn store_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), BackendError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(rows)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl IdentityProvider for LocalBackend {
    async fn current_user(&self) -> Result<Option<StaffIdentity>, BackendError> {
        Ok(self.identity.clone())
    }
}

#[async_trait]
impl ObjectStorage for LocalBackend {
    async fn upload_object(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<(), BackendError> {
        let target = self.object_path(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        debug!(path = %target.display(), bytes = bytes.len(), "Stored object locally");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("file://{}", self.object_path(path).display())
    }
}

#[async_trait]
impl RecordStore for LocalBackend {
    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BackendError> {
        let rows: Vec<Booking> = self.read_table(BOOKINGS_FILE).await?;
        Ok(rows.into_iter().find(|b| &b.id == id))
    }

    async fn fetch_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, BackendError> {
        let rows: Vec<Booking> = self.read_table(BOOKINGS_FILE).await?;
        Ok(query.select(&rows))
    }

    async fn count_bookings(&self, query: &BookingQuery) -> Result<u64, BackendError> {
        let rows: Vec<Booking> = self.read_table(BOOKINGS_FILE).await?;
        Ok(rows.iter().filter(|b| query.matches(b)).count() as u64)
    }

    async fn update_booking(&self, id: &BookingId, update: &BookingUpdate) -> Result<(), BackendError> {
        let id = id.clone();
        let update = update.clone();
        self.mutate_table(BOOKINGS_FILE, move |rows: &mut Vec<Booking>| {
            let booking = rows
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| BackendError::NotFound(format!("booking {id}")))?;
            booking.apply(&update);
            Ok(())
        })
        .await
    }

    async fn mark_viewed(&self, ids: &[BookingId]) -> Result<(), BackendError> {
        let ids = ids.to_vec();
        let viewed = BookingUpdate::viewed();
        self.mutate_table(BOOKINGS_FILE, move |rows: &mut Vec<Booking>| {
            for booking in rows.iter_mut().filter(|b| ids.contains(&b.id)) {
                booking.apply(&viewed);
            }
            Ok(())
        })
        .await
    }

    async fn fetch_staff_profile(&self, user_id: &str) -> Result<Option<StaffProfile>, BackendError> {
        let rows: Vec<StaffProfile> = self.read_table(PROFILES_FILE).await?;
        Ok(rows.into_iter().find(|p| p.id == user_id))
    }

    async fn set_availability(&self, user_id: &str, available: bool) -> Result<(), BackendError> {
        let user_id = user_id.to_string();
        self.mutate_table(PROFILES_FILE, move |rows: &mut Vec<StaffProfile>| {
            let profile = rows
                .iter_mut()
                .find(|p| p.id == user_id)
                .ok_or_else(|| BackendError::NotFound(format!("staff profile {user_id}")))?;
            profile.is_available = available;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{Stage, WorkStatus};
    use tempfile::TempDir;

    fn staff() -> StaffIdentity {
        StaffIdentity {
            id: "u1".into(),
            email: Some("me@x.com".into()),
        }
    }

    fn assigned(id: &str) -> Booking {
        let mut booking = Booking::new(id, "111111", "222222");
        booking.assigned_staff_email = Some("me@x.com".into());
        booking
    }

    #[tokio::test]
    async fn test_update_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path(), "work-photos", Some(staff()));
        backend.seed_bookings(vec![assigned("b1"), assigned("b2")]).await.unwrap();

        backend
            .update_booking(&BookingId::new("b1"), &BookingUpdate::photo_urls(Stage::Start, vec!["u".into()]))
            .await
            .unwrap();

        let reopened = LocalBackend::new(dir.path(), "work-photos", None);
        let b1 = reopened.fetch_booking(&BookingId::new("b1")).await.unwrap().unwrap();
        assert_eq!(b1.start_photo_urls, vec!["u".to_string()]);
        let b2 = reopened.fetch_booking(&BookingId::new("b2")).await.unwrap().unwrap();
        assert!(b2.start_photo_urls.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_booking_is_not_found() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path(), "work-photos", None);

        let err = backend
            .update_booking(&BookingId::new("nope"), &BookingUpdate::viewed())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_counts_and_mark_viewed() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path(), "work-photos", Some(staff()));
        let mut done = assigned("b3");
        done.work_status = WorkStatus::Completed;
        backend
            .seed_bookings(vec![assigned("b1"), assigned("b2"), done])
            .await
            .unwrap();

        assert_eq!(backend.count_bookings(&BookingQuery::unviewed("me@x.com")).await.unwrap(), 3);
        assert_eq!(backend.count_bookings(&BookingQuery::assigned("me@x.com")).await.unwrap(), 2);

        backend
            .mark_viewed(&[BookingId::new("b1"), BookingId::new("b3")])
            .await
            .unwrap();
        let unviewed = backend.fetch_bookings(&BookingQuery::unviewed("me@x.com")).await.unwrap();
        assert_eq!(unviewed.len(), 1);
        assert_eq!(unviewed[0].id.as_str(), "b2");
    }

    #[tokio::test]
    async fn test_upload_writes_object_under_bucket() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path(), "work-photos", None);

        backend
            .upload_object("staff_uploads/me@x.com/b1/start_1.jpg", b"jpeg", "image/jpeg")
            .await
            .unwrap();

        let stored = dir.path().join("objects/work-photos/staff_uploads/me@x.com/b1/start_1.jpg");
        assert_eq!(std::fs::read(&stored).unwrap(), b"jpeg");
        assert!(backend
            .public_url("staff_uploads/me@x.com/b1/start_1.jpg")
            .starts_with("file://"));
    }

    #[tokio::test]
    async fn test_availability_toggle() {
        let dir = TempDir::new().unwrap();
        let backend = LocalBackend::new(dir.path(), "work-photos", Some(staff()));
        backend
            .seed_profiles(vec![StaffProfile {
                id: "u1".into(),
                name: Some("Ravi".into()),
                email: Some("me@x.com".into()),
                phone: None,
                gender: None,
                avatar_url: None,
                is_available: false,
            }])
            .await
            .unwrap();

        backend.set_availability("u1", true).await.unwrap();
        let profile = backend.fetch_staff_profile("u1").await.unwrap().unwrap();
        assert!(profile.is_available);
        assert!(backend.set_availability("ghost", true).await.is_err());
    }
}

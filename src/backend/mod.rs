//! Remote collaborators consumed by the staff client
//!
//! Identity, object storage and the record store are all owned by the hosted
//! backend. Each concern is a trait so the workflow and directory code can be
//! driven against the REST backend, the local file backend, or mocks in tests.

pub mod local;
pub mod rest;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::booking::{Booking, BookingId, BookingQuery, BookingUpdate, StaffIdentity, StaffProfile};
use crate::config::{BackendConfig, BackendKind};

pub use local::LocalBackend;
pub use rest::RestBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{endpoint} failed with HTTP {status}: {message}")]
    Http {
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend misconfigured: {0}")]
    Config(String),
}

impl BackendError {
    /// The message the backend itself gave, suitable for an alert body
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Who is signed in on this device
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Currently authenticated staff member, `None` when signed out
    async fn current_user(&self) -> Result<Option<StaffIdentity>, BackendError>;
}

/// Bucket storage for job photos
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `path` in the photo bucket
    async fn upload_object(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), BackendError>;

    /// Public reference for an uploaded object
    fn public_url(&self, path: &str) -> String;
}

/// Table access for bookings and staff profiles
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BackendError>;

    async fn fetch_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, BackendError>;

    async fn count_bookings(&self, query: &BookingQuery) -> Result<u64, BackendError>;

    /// Partial update of one booking. Array columns are replaced whole.
    async fn update_booking(&self, id: &BookingId, update: &BookingUpdate) -> Result<(), BackendError>;

    async fn mark_viewed(&self, ids: &[BookingId]) -> Result<(), BackendError>;

    async fn fetch_staff_profile(&self, user_id: &str) -> Result<Option<StaffProfile>, BackendError>;

    async fn set_availability(&self, user_id: &str, available: bool) -> Result<(), BackendError>;
}

/// The three collaborators, usually backed by one client
#[derive(Clone)]
pub struct Backend {
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStorage>,
    pub records: Arc<dyn RecordStore>,
}

impl Backend {
    pub fn from_shared<T>(client: Arc<T>) -> Self
    where
        T: IdentityProvider + ObjectStorage + RecordStore + 'static,
    {
        Self {
            identity: client.clone(),
            storage: client.clone(),
            records: client,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        match config.kind {
            BackendKind::Rest => Ok(Self::from_shared(Arc::new(RestBackend::from_config(config)?))),
            BackendKind::Local => Ok(Self::from_shared(Arc::new(LocalBackend::from_config(config)))),
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("identity", &"Arc<dyn IdentityProvider>")
            .field("storage", &"Arc<dyn ObjectStorage>")
            .field("records", &"Arc<dyn RecordStore>")
            .finish()
    }
}

/// Storage path for a job photo: `staff_uploads/{email}/{booking}/{stage}_{millis}.jpg`
pub fn photo_object_path(staff_email: &str, booking_id: &BookingId, stage_tag: &str, timestamp_millis: i64) -> String {
    format!("staff_uploads/{staff_email}/{booking_id}/{stage_tag}_{timestamp_millis}.jpg")
}

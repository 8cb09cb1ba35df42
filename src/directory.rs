//! Job lists, badge counts and the staff profile
//!
//! Everything here is scoped to the signed-in staff member, so each call
//! resolves the identity first and fails with `MissingIdentity` when nobody is
//! signed in.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::backend::{Backend, BackendError};
use crate::booking::{BadgeCounts, Booking, BookingId, BookingQuery, HistorySort, StaffIdentity, StaffProfile};
use crate::config::{BackendConfig, BackendKind};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no signed-in staff member")]
    MissingIdentity,
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),
    #[error("no staff profile for user {0}")]
    ProfileNotFound(String),
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: BackendError,
    },
}

fn backend_err(operation: &'static str) -> impl FnOnce(BackendError) -> DirectoryError {
    move |source| DirectoryError::Backend { operation, source }
}

/// Profile row plus a resolved avatar link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: StaffProfile,
    pub avatar_link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingDirectory {
    backend: Backend,
    avatar_base: Option<String>,
}

impl BookingDirectory {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            avatar_base: None,
        }
    }

    /// Prefix for avatar paths stored relative to the avatar bucket
    pub fn with_avatar_base(mut self, base: impl Into<String>) -> Self {
        self.avatar_base = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    pub fn from_config(backend: Backend, config: &BackendConfig) -> Self {
        let directory = Self::new(backend);
        match config.kind {
            BackendKind::Rest if !config.url.trim().is_empty() => directory.with_avatar_base(format!(
                "{}/storage/v1/object/public/{}",
                config.url.trim_end_matches('/'),
                config.avatar_bucket
            )),
            _ => directory,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub async fn identity(&self) -> Result<StaffIdentity, DirectoryError> {
        self.backend
            .identity
            .current_user()
            .await
            .map_err(backend_err("looking up the signed-in user"))?
            .ok_or(DirectoryError::MissingIdentity)
    }

    async fn staff_email(&self) -> Result<String, DirectoryError> {
        self.identity()
            .await?
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or(DirectoryError::MissingIdentity)
    }

    /// Open jobs assigned to the signed-in staff member
    pub async fn assigned_jobs(&self) -> Result<Vec<Booking>, DirectoryError> {
        let email = self.staff_email().await?;
        let jobs = self
            .backend
            .records
            .fetch_bookings(&BookingQuery::assigned(&email))
            .await
            .map_err(backend_err("loading assigned jobs"))?;
        debug!(count = jobs.len(), "Loaded assigned jobs");
        Ok(jobs)
    }

    /// Jobs not opened yet, newest first. Listing them marks them viewed.
    pub async fn new_jobs(&self) -> Result<Vec<Booking>, DirectoryError> {
        let email = self.staff_email().await?;
        let jobs = self
            .backend
            .records
            .fetch_bookings(&BookingQuery::unviewed(&email))
            .await
            .map_err(backend_err("loading new jobs"))?;

        let ids: Vec<BookingId> = jobs.iter().map(|b| b.id.clone()).collect();
        if !ids.is_empty() {
            self.backend
                .records
                .mark_viewed(&ids)
                .await
                .map_err(backend_err("marking jobs viewed"))?;
            info!(count = ids.len(), "Marked new jobs as viewed");
        }
        Ok(jobs)
    }

    /// Completed jobs, optionally limited to the day the work ended
    pub async fn history(&self, sort: HistorySort, day: Option<NaiveDate>) -> Result<Vec<Booking>, DirectoryError> {
        let email = self.staff_email().await?;
        self.backend
            .records
            .fetch_bookings(&BookingQuery::completed(&email, sort, day))
            .await
            .map_err(backend_err("loading job history"))
    }

    pub async fn badge_counts(&self) -> Result<BadgeCounts, DirectoryError> {
        let email = self.staff_email().await?;
        let records = &self.backend.records;
        let unviewed = BookingQuery::unviewed(&email);
        let open = BookingQuery::assigned(&email);
        let done = BookingQuery::completed(&email, HistorySort::Recent, None);
        let (new, assigned, completed) = tokio::try_join!(
            records.count_bookings(&unviewed),
            records.count_bookings(&open),
            records.count_bookings(&done),
        )
        .map_err(backend_err("counting jobs"))?;
        Ok(BadgeCounts { new, assigned, completed })
    }

    /// Load one booking by id
    pub async fn booking(&self, id: &BookingId) -> Result<Booking, DirectoryError> {
        self.backend
            .records
            .fetch_booking(id)
            .await
            .map_err(backend_err("loading the booking"))?
            .ok_or_else(|| DirectoryError::BookingNotFound(id.clone()))
    }

    pub async fn profile(&self) -> Result<ProfileView, DirectoryError> {
        let identity = self.identity().await?;
        let profile = self
            .backend
            .records
            .fetch_staff_profile(&identity.id)
            .await
            .map_err(backend_err("loading the staff profile"))?
            .ok_or_else(|| DirectoryError::ProfileNotFound(identity.id.clone()))?;
        let avatar_link = profile.avatar_url.as_deref().and_then(|raw| self.resolve_avatar(raw));
        Ok(ProfileView { profile, avatar_link })
    }

    pub async fn set_availability(&self, available: bool) -> Result<(), DirectoryError> {
        let identity = self.identity().await?;
        self.backend
            .records
            .set_availability(&identity.id, available)
            .await
            .map_err(backend_err("updating availability"))?;
        info!(available, "Availability updated");
        Ok(())
    }

    fn resolve_avatar(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.contains("://") {
            return Some(raw.to_string());
        }
        match &self.avatar_base {
            Some(base) => Some(format!("{base}/{}", raw.trim_start_matches('/'))),
            None => Some(raw.to_string()),
        }
    }
}

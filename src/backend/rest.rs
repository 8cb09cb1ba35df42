//! REST client for the hosted backend
//!
//! Speaks the three HTTP surfaces the platform exposes: the auth user
//! endpoint, PostgREST table access under `/rest/v1`, and bucket storage under
//! `/storage/v1`. Every request carries the project key in `apikey` and the
//! staff member's session token as a bearer token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{BackendError, IdentityProvider, ObjectStorage, RecordStore};
use crate::booking::{
    day_bounds, Booking, BookingId, BookingOrder, BookingQuery, BookingUpdate, StaffIdentity, StaffProfile,
    StatusFilter, WorkStatus,
};
use crate::config::BackendConfig;
use crate::observability::BackendApiMetrics;

const BOOKINGS: &str = "bookings";
const STAFF_PROFILE: &str = "staff_profile";

pub struct RestBackend {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    photo_bucket: String,
    metrics: Arc<BackendApiMetrics>,
}

/// Error body shapes returned by the auth, storage and PostgREST services
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl RestBackend {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        access_token: Option<String>,
        photo_bucket: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token,
            photo_bucket: photo_bucket.to_string(),
            metrics: Arc::new(BackendApiMetrics::new()),
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        if config.url.trim().is_empty() {
            return Err(BackendError::Config("backend.url is not set".to_string()));
        }
        let anon_key = config
            .anon_key
            .as_deref()
            .ok_or_else(|| BackendError::Config("backend.anon_key is not set".to_string()))?;
        Self::new(
            &config.url,
            anon_key,
            config.access_token.clone(),
            &config.photo_bucket,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn metrics(&self) -> Arc<BackendApiMetrics> {
        self.metrics.clone()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", key);
        }
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {bearer}")) {
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        headers
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        self.metrics.record_request();
        debug!(endpoint, "Sending backend request");
        let response = request.headers(self.headers()).send().await.map_err(|e| {
            self.metrics.record_error(None);
            BackendError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        self.metrics.record_error(Some(status.as_u16()));
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error).or(b.msg))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    body.trim().to_string()
                }
            });
        warn!(endpoint, status = status.as_u16(), %message, "Backend request failed");
        Err(BackendError::Http {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn patch_rows<T: serde::Serialize + ?Sized>(
        &self,
        table: &str,
        filter: (&str, String),
        body: &T,
    ) -> Result<(), BackendError> {
        let request = self
            .http
            .patch(self.table_url(table))
            .query(&[filter])
            .header("Prefer", "return=minimal")
            .json(body);
        self.send(&format!("PATCH {table}"), request).await?;
        Ok(())
    }
}

/// PostgREST filter parameters for a booking query
pub fn booking_filter_params(query: &BookingQuery) -> Vec<(String, String)> {
    let mut params = vec![(
        "assigned_staff_email".to_string(),
        format!("eq.{}", query.staff_email),
    )];
    match query.status {
        StatusFilter::Any => {}
        StatusFilter::Completed => {
            params.push(("work_status".to_string(), format!("eq.{}", WorkStatus::Completed.as_str())))
        }
        StatusFilter::Open => {
            params.push(("work_status".to_string(), format!("neq.{}", WorkStatus::Completed.as_str())))
        }
    }
    if let Some(viewed) = query.viewed {
        params.push(("is_viewed".to_string(), format!("eq.{viewed}")));
    }
    if let Some(day) = query.ended_on {
        let (from, to) = day_bounds(day);
        params.push(("work_ended_at".to_string(), format!("gte.{from}")));
        params.push(("work_ended_at".to_string(), format!("lte.{to}")));
    }
    if let Some(order) = query.order {
        let clause = match order {
            BookingOrder::CreatedNewestFirst => "created_at.desc",
            BookingOrder::EndedNewestFirst => "work_ended_at.desc",
            BookingOrder::EndedOldestFirst => "work_ended_at.asc",
            BookingOrder::CustomerName => "customer_name.asc",
        };
        params.push(("order".to_string(), clause.to_string()));
    }
    params
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl IdentityProvider for RestBackend {
    async fn current_user(&self) -> Result<Option<StaffIdentity>, BackendError> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let request = self.http.get(format!("{}/auth/v1/user", self.base_url));
        match self.send("GET auth user", request).await {
            Ok(response) => Ok(Some(response.json::<StaffIdentity>().await?)),
            // An expired or revoked session means nobody is signed in
            Err(BackendError::Http { status: 401, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ObjectStorage for RestBackend {
    async fn upload_object(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), BackendError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.photo_bucket, path);
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec());
        self.send("POST storage object", request).await?;
        self.metrics.record_upload(bytes.len());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, self.photo_bucket, path)
    }
}

#[async_trait]
impl RecordStore for RestBackend {
    async fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, BackendError> {
        let request = self
            .http
            .get(self.table_url(BOOKINGS))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))]);
        let rows: Vec<Booking> = self.send("GET bookings", request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, BackendError> {
        let request = self
            .http
            .get(self.table_url(BOOKINGS))
            .query(&[("select", "*")])
            .query(&booking_filter_params(query));
        Ok(self.send("GET bookings", request).await?.json().await?)
    }

    async fn count_bookings(&self, query: &BookingQuery) -> Result<u64, BackendError> {
        let request = self
            .http
            .head(self.table_url(BOOKINGS))
            .query(&[("select", "*")])
            .query(&booking_filter_params(&query.unordered()))
            .header("Prefer", "count=exact");
        let response = self.send("HEAD bookings", request).await?;
        response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| BackendError::Decode("count response had no Content-Range total".to_string()))
    }

    async fn update_booking(&self, id: &BookingId, update: &BookingUpdate) -> Result<(), BackendError> {
        self.patch_rows(BOOKINGS, ("id", format!("eq.{id}")), update).await
    }

    async fn mark_viewed(&self, ids: &[BookingId]) -> Result<(), BackendError> {
        if ids.is_empty() {
            return Ok(());
        }
        let list = ids.iter().map(BookingId::as_str).collect::<Vec<_>>().join(",");
        self.patch_rows(BOOKINGS, ("id", format!("in.({list})")), &BookingUpdate::viewed())
            .await
    }

    async fn fetch_staff_profile(&self, user_id: &str) -> Result<Option<StaffProfile>, BackendError> {
        let request = self
            .http
            .get(self.table_url(STAFF_PROFILE))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{user_id}"))]);
        let rows: Vec<StaffProfile> = self.send("GET staff_profile", request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn set_availability(&self, user_id: &str, available: bool) -> Result<(), BackendError> {
        self.patch_rows(
            STAFF_PROFILE,
            ("id", format!("eq.{user_id}")),
            &serde_json::json!({ "is_available": available }),
        )
        .await
    }
}

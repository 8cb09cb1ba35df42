// Core booking records as stored by the backend

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque booking identifier. The backend may hand it out as text or as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl BookingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BookingId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(BookingId(text_or_number(deserializer)?))
    }
}

/// Which half of the before/after sequence an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Start,
    End,
}

impl Stage {
    /// Tag used in storage paths
    pub fn tag(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::End => "end",
        }
    }

    /// Human label for the photo set of this stage
    pub fn photo_label(&self) -> &'static str {
        match self {
            Stage::Start => "before",
            Stage::End => "after",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" | "before" => Ok(Stage::Start),
            "end" | "after" => Ok(Stage::End),
            other => Err(format!("unknown stage '{other}' (expected before/after)")),
        }
    }
}

/// Work status column. Null and unknown values read as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "Option<String>")]
pub enum WorkStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl From<Option<String>> for WorkStatus {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("COMPLETED") => WorkStatus::Completed,
            Some(s) if s.eq_ignore_ascii_case("IN_PROGRESS") => WorkStatus::InProgress,
            _ => WorkStatus::Pending,
        }
    }
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Pending => "PENDING",
            WorkStatus::InProgress => "IN_PROGRESS",
            WorkStatus::Completed => "COMPLETED",
        }
    }
}

/// A booking row as read from the `bookings` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub booking_time: Option<String>,
    #[serde(default)]
    pub assigned_staff_email: Option<String>,
    #[serde(rename = "startotp", default, deserialize_with = "optional_code")]
    pub start_otp: Option<String>,
    #[serde(rename = "endotp", default, deserialize_with = "optional_code")]
    pub end_otp: Option<String>,
    #[serde(rename = "start_photo_url", default, deserialize_with = "null_as_default")]
    pub start_photo_urls: Vec<String>,
    #[serde(rename = "end_photo_url", default, deserialize_with = "null_as_default")]
    pub end_photo_urls: Vec<String>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub work_started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub work_ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub work_status: WorkStatus,
    #[serde(rename = "worked_duration", default)]
    pub worked_duration_seconds: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_viewed: bool,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Minimal booking with the two expected codes set
    pub fn new(id: impl Into<String>, start_otp: &str, end_otp: &str) -> Self {
        Self {
            id: BookingId::new(id),
            customer_name: None,
            email: None,
            phone_number: None,
            full_address: None,
            booking_time: None,
            assigned_staff_email: None,
            start_otp: Some(start_otp.to_string()),
            end_otp: Some(end_otp.to_string()),
            start_photo_urls: Vec::new(),
            end_photo_urls: Vec::new(),
            work_started_at: None,
            work_ended_at: None,
            work_status: WorkStatus::Pending,
            worked_duration_seconds: None,
            is_viewed: false,
            created_at: None,
        }
    }

    pub fn expected_code(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Start => self.start_otp.as_deref(),
            Stage::End => self.end_otp.as_deref(),
        }
    }

    pub fn photo_urls(&self, stage: Stage) -> &[String] {
        match stage {
            Stage::Start => &self.start_photo_urls,
            Stage::End => &self.end_photo_urls,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.work_status == WorkStatus::Completed
    }

    pub fn display_name(&self) -> &str {
        self.customer_name.as_deref().unwrap_or("Customer")
    }

    /// `tel:` link for the customer, if a phone number is on file
    pub fn dial_link(&self) -> Option<String> {
        self.phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| format!("tel:{p}"))
    }

    /// Map search link for the job address
    pub fn maps_link(&self) -> Option<String> {
        let address = self.full_address.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
        reqwest::Url::parse_with_params(
            "https://www.google.com/maps/search/",
            &[("api", "1"), ("query", address)],
        )
        .ok()
        .map(String::from)
    }

    /// Merge a partial update into this record, the way the backend would
    pub fn apply(&mut self, update: &BookingUpdate) {
        if let Some(urls) = &update.start_photo_url {
            self.start_photo_urls = urls.clone();
        }
        if let Some(urls) = &update.end_photo_url {
            self.end_photo_urls = urls.clone();
        }
        if let Some(at) = update.work_started_at {
            self.work_started_at = Some(at);
        }
        if let Some(at) = update.work_ended_at {
            self.work_ended_at = Some(at);
        }
        if let Some(status) = update.work_status {
            self.work_status = status;
        }
        if let Some(seconds) = update.worked_duration {
            self.worked_duration_seconds = Some(seconds);
        }
        if let Some(viewed) = update.is_viewed {
            self.is_viewed = viewed;
        }
    }
}

/// Partial update for a booking row. Only the fields that are set get serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_photo_url: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_photo_url: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_status: Option<WorkStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worked_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_viewed: Option<bool>,
}

impl BookingUpdate {
    /// Replace the full photo URL array of one stage
    pub fn photo_urls(stage: Stage, urls: Vec<String>) -> Self {
        match stage {
            Stage::Start => Self {
                start_photo_url: Some(urls),
                ..Default::default()
            },
            Stage::End => Self {
                end_photo_url: Some(urls),
                ..Default::default()
            },
        }
    }

    pub fn work_started(at: DateTime<Utc>) -> Self {
        Self {
            work_started_at: Some(at),
            ..Default::default()
        }
    }

    pub fn completed(worked_seconds: u64, ended_at: DateTime<Utc>) -> Self {
        Self {
            work_status: Some(WorkStatus::Completed),
            worked_duration: Some(worked_seconds),
            work_ended_at: Some(ended_at),
            ..Default::default()
        }
    }

    pub fn viewed() -> Self {
        Self {
            is_viewed: Some(true),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Authenticated staff member as reported by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Row of the `staff_profile` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffProfile {
    pub id: String,
    #[serde(default, alias = "full_name")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_available: bool,
}

/// Badge counters shown on the staff home screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCounts {
    pub new: u64,
    pub assigned: u64,
    pub completed: u64,
}

/// Sort modes offered on the completion history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistorySort {
    /// Most recently finished first
    #[default]
    Recent,
    /// Oldest finished first
    Date,
    /// Customer name, alphabetical
    Name,
}

impl FromStr for HistorySort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recent" => Ok(HistorySort::Recent),
            "date" => Ok(HistorySort::Date),
            "name" => Ok(HistorySort::Name),
            other => Err(format!("unknown sort '{other}' (expected recent, date or name)")),
        }
    }
}

/// Render a duration in seconds as zero-padded `HH:MM:SS`
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Parse the timestamp shapes the backend produces (RFC 3339, Postgres text, or naive UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Day boundaries used by the history date filter
pub fn day_bounds(day: NaiveDate) -> (String, String) {
    (
        format!("{}T00:00:00", day.format("%Y-%m-%d")),
        format!("{}T23:59:59", day.format("%Y-%m-%d")),
    )
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Integer(i64),
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Integer(n) => n.to_string(),
    })
}

fn optional_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(|raw| match raw {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Integer(n) => n.to_string(),
    }))
}

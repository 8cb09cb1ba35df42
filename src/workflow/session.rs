use chrono::{DateTime, Utc};
use serde::Serialize;

use super::photos::{LocalPhoto, PhotoSet};
use super::state_machine::WorkflowStage;
use crate::booking::Stage;

/// Mutable per-session data the workflow machine operates on.
///
/// Created fresh when a job screen opens and dropped when it closes; nothing
/// here is persisted beyond what the engine writes to the booking record.
#[derive(Debug, Clone, Default)]
pub struct WorkflowSession {
    pub(crate) start_code_input: String,
    pub(crate) end_code_input: String,
    pub(crate) start_verified: bool,
    pub(crate) end_verified: bool,
    pub(crate) before_photos: PhotoSet,
    pub(crate) after_photos: PhotoSet,
    pub(crate) work_started_at: Option<DateTime<Utc>>,
    pub(crate) stopped_elapsed: Option<u64>,
    pub(crate) completed_at: Option<DateTime<Utc>>,
    next_photo_id: u64,
}

impl WorkflowSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code_input(&self, stage: Stage) -> &str {
        match stage {
            Stage::Start => &self.start_code_input,
            Stage::End => &self.end_code_input,
        }
    }

    pub(crate) fn set_code_input(&mut self, stage: Stage, input: &str) {
        let slot = match stage {
            Stage::Start => &mut self.start_code_input,
            Stage::End => &mut self.end_code_input,
        };
        *slot = input.to_string();
    }

    pub fn is_verified(&self, stage: Stage) -> bool {
        match stage {
            Stage::Start => self.start_verified,
            Stage::End => self.end_verified,
        }
    }

    pub fn photos(&self, stage: Stage) -> &PhotoSet {
        match stage {
            Stage::Start => &self.before_photos,
            Stage::End => &self.after_photos,
        }
    }

    pub(crate) fn photos_mut(&mut self, stage: Stage) -> &mut PhotoSet {
        match stage {
            Stage::Start => &mut self.before_photos,
            Stage::End => &mut self.after_photos,
        }
    }

    pub fn work_started_at(&self) -> Option<DateTime<Utc>> {
        self.work_started_at
    }

    /// Seconds recorded when work was stopped
    pub fn stopped_elapsed(&self) -> Option<u64> {
        self.stopped_elapsed
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub(crate) fn new_photo(&mut self, local_uri: String) -> LocalPhoto {
        self.next_photo_id += 1;
        LocalPhoto {
            id: self.next_photo_id,
            local_uri,
            captured_at: Utc::now(),
            remote_url: None,
        }
    }
}

/// Read-only view of a session for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub booking_id: String,
    pub stage: WorkflowStage,
    pub start_verified: bool,
    pub end_verified: bool,
    pub before_photos: Vec<String>,
    pub after_photos: Vec<String>,
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
    pub timer_running: bool,
    pub uploading: bool,
}

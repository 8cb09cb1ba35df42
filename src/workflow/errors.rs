use serde::Serialize;
use thiserror::Error;

use super::state_machine::{WorkflowAction, WorkflowStage};
use crate::backend::BackendError;
use crate::booking::Stage;
use crate::camera::CameraError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{action} is not available while the job is {stage}")]
    StageLocked {
        action: WorkflowAction,
        stage: WorkflowStage,
    },
    #[error("{} code does not match", .stage.tag())]
    CodeMismatch { stage: Stage },
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no signed-in staff member")]
    MissingIdentity,
    #[error("no {} photo at index {index} ({len} present)", .stage.photo_label())]
    PhotoIndex { stage: Stage, index: usize, len: usize },
    #[error("photo capture failed: {0}")]
    Camera(#[from] CameraError),
    #[error("photo upload failed: {0}")]
    Upload(#[source] BackendError),
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: BackendError,
    },
    #[error("customer phone number not available")]
    PhoneUnavailable,
    #[error("calling customers is turned off")]
    CallDisabled,
}

/// Title and body for a blocking alert shown to staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl WorkflowError {
    pub fn backend(operation: &'static str) -> impl FnOnce(BackendError) -> WorkflowError {
        move |source| WorkflowError::Backend { operation, source }
    }

    pub fn alert(&self) -> Alert {
        match self {
            WorkflowError::CodeMismatch { stage: Stage::Start } => {
                Alert::new("Invalid Start OTP", "The start code does not match. Ask the customer to check it.")
            }
            WorkflowError::CodeMismatch { stage: Stage::End } => {
                Alert::new("Invalid End OTP", "The end code does not match. Ask the customer to check it.")
            }
            WorkflowError::PermissionDenied => {
                Alert::new("Camera permission required", "Allow camera access to take job photos.")
            }
            WorkflowError::MissingIdentity => Alert::new("Not signed in", "Sign in again to continue."),
            WorkflowError::Upload(source) => Alert::new("Upload failed", source.user_message()),
            WorkflowError::Backend { source, .. } => Alert::new("Error", source.user_message()),
            WorkflowError::Camera(source) => Alert::new("Capture failed", source.to_string()),
            WorkflowError::PhoneUnavailable => Alert::new("Error", "Phone number not available"),
            other => Alert::new("Not available", other.to_string()),
        }
    }
}

use std::time::Duration;

use super::timer::TickSource;
use crate::camera::{CameraError, CaptureQuality};
use crate::config::WorkflowConfig;

/// Per-deployment switches for one engine.
///
/// The job screens only differ in these, so one engine serves all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOptions {
    pub capture_quality: CaptureQuality,
    pub tick_source: TickSource,
    pub show_call_button: bool,
    pub show_upload_overlay: bool,
    pub confirm_start: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            capture_quality: CaptureQuality::default(),
            tick_source: TickSource::default(),
            show_call_button: true,
            show_upload_overlay: true,
            confirm_start: true,
        }
    }
}

impl WorkflowOptions {
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, CameraError> {
        let tick_source = if config.tick_interval_ms == 0 {
            TickSource::Manual
        } else {
            TickSource::Interval(Duration::from_millis(config.tick_interval_ms))
        };
        Ok(Self {
            capture_quality: CaptureQuality::new(config.capture_quality)?,
            tick_source,
            show_call_button: config.show_call_button,
            show_upload_overlay: config.show_upload_overlay,
            confirm_start: config.confirm_start,
        })
    }

    /// Timer driven only by explicit ticks
    pub fn manual_ticks(mut self) -> Self {
        self.tick_source = TickSource::Manual;
        self
    }
}

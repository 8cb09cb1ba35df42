use chrono::{DateTime, Utc};
use serde::Serialize;
use statig::prelude::*;
use std::fmt;

use super::photos::LocalPhoto;
use super::session::WorkflowSession;
use crate::booking::Stage;

/// Facts the engine feeds into the machine once their side effects succeeded
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    StartCodeAccepted,
    PhotoAdded { stage: Stage, photo: LocalPhoto },
    PhotoRemoved { stage: Stage, index: usize },
    WorkStarted { at: DateTime<Utc> },
    WorkStopped { elapsed_seconds: u64 },
    EndCodeAccepted,
    Completed { at: DateTime<Utc> },
}

/// Where a job sits in the on-site flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    AwaitingStartCode,
    StartVerified,
    ReadyToStart,
    Running,
    Stopped,
    AwaitingEndCode,
    EndVerified,
    Completed,
}

/// User-facing operations that are gated by stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowAction {
    SubmitCode(Stage),
    CapturePhoto(Stage),
    RemovePhoto(Stage),
    StartWork,
    StopWork,
    Complete,
}

impl WorkflowStage {
    pub fn permits(self, action: WorkflowAction) -> bool {
        use WorkflowAction::*;
        use WorkflowStage::*;

        match action {
            SubmitCode(Stage::Start) => self != Completed,
            SubmitCode(Stage::End) => matches!(self, AwaitingEndCode | EndVerified),
            CapturePhoto(Stage::Start) | RemovePhoto(Stage::Start) => {
                matches!(self, StartVerified | ReadyToStart)
            }
            CapturePhoto(Stage::End) => matches!(self, Stopped | AwaitingEndCode | EndVerified),
            RemovePhoto(Stage::End) => matches!(self, AwaitingEndCode | EndVerified),
            StartWork => self == ReadyToStart,
            StopWork => self == Running,
            Complete => self == EndVerified,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WorkflowStage::Completed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStage::AwaitingStartCode => "awaiting start code",
            WorkflowStage::StartVerified => "start verified",
            WorkflowStage::ReadyToStart => "ready to start",
            WorkflowStage::Running => "running",
            WorkflowStage::Stopped => "stopped",
            WorkflowStage::AwaitingEndCode => "awaiting end code",
            WorkflowStage::EndVerified => "end verified",
            WorkflowStage::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowAction::SubmitCode(stage) => write!(f, "{} code entry", stage.tag()),
            WorkflowAction::CapturePhoto(stage) => write!(f, "{} photo capture", stage.photo_label()),
            WorkflowAction::RemovePhoto(stage) => write!(f, "{} photo removal", stage.photo_label()),
            WorkflowAction::StartWork => f.write_str("starting work"),
            WorkflowAction::StopWork => f.write_str("stopping work"),
            WorkflowAction::Complete => f.write_str("completing the job"),
        }
    }
}

/// Shared storage for the job's state machine; the session travels as context
#[derive(Debug, Default)]
pub struct WorkflowMachine {
    pub booking_id: String,
}

impl WorkflowMachine {
    pub fn new(booking_id: impl Into<String>) -> Self {
        Self {
            booking_id: booking_id.into(),
        }
    }

    fn add_photo(&self, context: &mut WorkflowSession, stage: Stage, photo: &LocalPhoto) {
        let index = context.photos_mut(stage).push(photo.clone());
        tracing::debug!(
            booking_id = %self.booking_id,
            stage = stage.photo_label(),
            index,
            "Photo added"
        );
    }

    /// Returns true when the set is empty afterwards
    fn drop_photo(&self, context: &mut WorkflowSession, stage: Stage, index: usize) -> bool {
        let photos = context.photos_mut(stage);
        if photos.remove(index).is_some() {
            tracing::debug!(
                booking_id = %self.booking_id,
                stage = stage.photo_label(),
                index,
                remaining = photos.len(),
                "Photo removed"
            );
        }
        photos.is_empty()
    }
}

#[state_machine(initial = "State::awaiting_start_code()")]
impl WorkflowMachine {
    #[state]
    fn awaiting_start_code(&mut self, context: &mut WorkflowSession, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::StartCodeAccepted => {
                context.start_verified = true;
                tracing::info!(booking_id = %self.booking_id, "Start code verified");
                Transition(State::start_verified())
            }
            _ => Handled,
        }
    }

    #[state]
    fn start_verified(&mut self, context: &mut WorkflowSession, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::PhotoAdded { stage: Stage::Start, photo } => {
                self.add_photo(context, Stage::Start, photo);
                Transition(State::ready_to_start())
            }
            _ => Handled,
        }
    }

    #[state]
    fn ready_to_start(&mut self, context: &mut WorkflowSession, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::PhotoAdded { stage: Stage::Start, photo } => {
                self.add_photo(context, Stage::Start, photo);
                Handled
            }
            WorkflowEvent::PhotoRemoved { stage: Stage::Start, index } => {
                if self.drop_photo(context, Stage::Start, *index) {
                    Transition(State::start_verified())
                } else {
                    Handled
                }
            }
            WorkflowEvent::WorkStarted { at } => {
                context.work_started_at = Some(*at);
                tracing::info!(booking_id = %self.booking_id, started_at = %at, "Work started");
                Transition(State::running())
            }
            _ => Handled,
        }
    }

    #[state]
    fn running(&mut self, context: &mut WorkflowSession, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::WorkStopped { elapsed_seconds } => {
                context.stopped_elapsed = Some(*elapsed_seconds);
                tracing::info!(booking_id = %self.booking_id, elapsed_seconds, "Work stopped");
                Transition(State::stopped())
            }
            _ => Handled,
        }
    }

    #[state]
    fn stopped(&mut self, context: &mut WorkflowSession, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::PhotoAdded { stage: Stage::End, photo } => {
                self.add_photo(context, Stage::End, photo);
                // a code verified earlier stays verified after the photos were cleared
                if context.end_verified {
                    Transition(State::end_verified())
                } else {
                    Transition(State::awaiting_end_code())
                }
            }
            _ => Handled,
        }
    }

    #[state]
    fn awaiting_end_code(&mut self, context: &mut WorkflowSession, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::PhotoAdded { stage: Stage::End, photo } => {
                self.add_photo(context, Stage::End, photo);
                Handled
            }
            WorkflowEvent::PhotoRemoved { stage: Stage::End, index } => {
                if self.drop_photo(context, Stage::End, *index) {
                    Transition(State::stopped())
                } else {
                    Handled
                }
            }
            WorkflowEvent::EndCodeAccepted => {
                context.end_verified = true;
                tracing::info!(booking_id = %self.booking_id, "End code verified");
                Transition(State::end_verified())
            }
            _ => Handled,
        }
    }

    #[state]
    fn end_verified(&mut self, context: &mut WorkflowSession, event: &WorkflowEvent) -> Outcome<State> {
        match event {
            WorkflowEvent::PhotoAdded { stage: Stage::End, photo } => {
                self.add_photo(context, Stage::End, photo);
                Handled
            }
            WorkflowEvent::PhotoRemoved { stage: Stage::End, index } => {
                if self.drop_photo(context, Stage::End, *index) {
                    Transition(State::stopped())
                } else {
                    Handled
                }
            }
            WorkflowEvent::Completed { at } => {
                context.completed_at = Some(*at);
                tracing::info!(booking_id = %self.booking_id, completed_at = %at, "Job completed");
                Transition(State::completed())
            }
            _ => Handled,
        }
    }

    #[state]
    fn completed(&mut self, event: &WorkflowEvent) -> Outcome<State> {
        tracing::debug!(booking_id = %self.booking_id, ?event, "Ignoring event on completed job");
        Handled
    }
}

impl From<&State> for WorkflowStage {
    fn from(state: &State) -> Self {
        match state {
            State::AwaitingStartCode { .. } => WorkflowStage::AwaitingStartCode,
            State::StartVerified { .. } => WorkflowStage::StartVerified,
            State::ReadyToStart { .. } => WorkflowStage::ReadyToStart,
            State::Running { .. } => WorkflowStage::Running,
            State::Stopped { .. } => WorkflowStage::Stopped,
            State::AwaitingEndCode { .. } => WorkflowStage::AwaitingEndCode,
            State::EndVerified { .. } => WorkflowStage::EndVerified,
            State::Completed { .. } => WorkflowStage::Completed,
        }
    }
}

use chrono::{DateTime, Utc};
use statig::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use super::errors::WorkflowError;
use super::options::WorkflowOptions;
use super::photos::LocalPhoto;
use super::session::{SessionSnapshot, WorkflowSession};
use super::state_machine::{WorkflowAction, WorkflowEvent, WorkflowMachine, WorkflowStage};
use super::timer::WorkTimer;
use crate::backend::{photo_object_path, Backend};
use crate::booking::{format_duration, Booking, BookingId, BookingUpdate, Stage};
use crate::camera::{Camera, PermissionStatus};
use crate::observability::{create_workflow_span, OperationTimer};
use crate::telemetry::generate_correlation_id;

/// Outcome of a code submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Verified,
    AlreadyVerified,
}

/// A photo that made it to storage and onto the booking record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCapture {
    pub stage: Stage,
    pub photo_id: u64,
    pub public_url: String,
}

/// What was written when the job was closed
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub booking_id: BookingId,
    pub worked_seconds: u64,
    pub ended_at: DateTime<Utc>,
    pub update: BookingUpdate,
}

/// Drives one on-site visit from the start code to completion.
///
/// Every user action is checked against the current [`WorkflowStage`] before
/// any side effect runs. State only advances after the remote write it depends
/// on has succeeded; photo appends are the one optimistic exception.
pub struct ServiceCompletionWorkflow {
    booking: Booking,
    backend: Backend,
    camera: Arc<dyn Camera>,
    options: WorkflowOptions,
    machine: StateMachine<WorkflowMachine>,
    session: WorkflowSession,
    timer: WorkTimer,
    uploading: Arc<AtomicBool>,
    span: tracing::Span,
}

impl ServiceCompletionWorkflow {
    pub fn new(booking: Booking, backend: Backend, camera: Arc<dyn Camera>, options: WorkflowOptions) -> Self {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span(booking.id.as_str(), &correlation_id);
        if booking.is_completed() {
            warn!(booking_id = %booking.id, "Opening workflow for a booking that is already completed");
        }
        Self {
            machine: WorkflowMachine::new(booking.id.as_str()).state_machine(),
            timer: WorkTimer::new(options.tick_source),
            session: WorkflowSession::new(),
            uploading: Arc::new(AtomicBool::new(false)),
            booking,
            backend,
            camera,
            options,
            span,
        }
    }

    pub fn booking(&self) -> &Booking {
        &self.booking
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    pub fn session(&self) -> &WorkflowSession {
        &self.session
    }

    pub fn stage(&self) -> WorkflowStage {
        WorkflowStage::from(self.machine.state())
    }

    pub fn permits(&self, action: WorkflowAction) -> bool {
        self.stage().permits(action)
    }

    pub fn photos(&self, stage: Stage) -> &[LocalPhoto] {
        self.session.photos(stage).as_slice()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds()
    }

    /// Elapsed work time as `HH:MM:SS`
    pub fn elapsed_display(&self) -> String {
        format_duration(self.elapsed_seconds())
    }

    /// Flag that is raised while a photo upload is in flight
    pub fn upload_indicator(&self) -> Arc<AtomicBool> {
        self.uploading.clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// Advance the work timer by one second. Only counts while running.
    pub fn tick(&self) -> u64 {
        self.timer.tick()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let urls = |stage: Stage| -> Vec<String> {
            self.session
                .photos(stage)
                .iter()
                .map(|p| p.remote_url.clone().unwrap_or_else(|| p.local_uri.clone()))
                .collect()
        };
        SessionSnapshot {
            booking_id: self.booking.id.to_string(),
            stage: self.stage(),
            start_verified: self.session.is_verified(Stage::Start),
            end_verified: self.session.is_verified(Stage::End),
            before_photos: urls(Stage::Start),
            after_photos: urls(Stage::End),
            elapsed_seconds: self.elapsed_seconds(),
            elapsed_display: self.elapsed_display(),
            timer_running: self.timer.is_running(),
            uploading: self.is_uploading(),
        }
    }

    fn ensure(&self, action: WorkflowAction) -> Result<(), WorkflowError> {
        let stage = self.stage();
        if stage.permits(action) {
            Ok(())
        } else {
            Err(WorkflowError::StageLocked { action, stage })
        }
    }

    fn dispatch(&mut self, event: WorkflowEvent) {
        self.machine.handle_with_context(&event, &mut self.session);
    }

    /// Compare `input` against the booking's code for `stage`
    pub fn submit_code(&mut self, stage: Stage, input: &str) -> Result<CodeCheck, WorkflowError> {
        let span = self.span.clone();
        let _enter = span.enter();
        self.ensure(WorkflowAction::SubmitCode(stage))?;
        self.session.set_code_input(stage, input);

        let matches = self.booking.expected_code(stage).is_some_and(|expected| expected == input);
        if !matches {
            warn!(stage = stage.tag(), "Code mismatch");
            return Err(WorkflowError::CodeMismatch { stage });
        }
        if self.session.is_verified(stage) {
            return Ok(CodeCheck::AlreadyVerified);
        }

        let event = match stage {
            Stage::Start => WorkflowEvent::StartCodeAccepted,
            Stage::End => WorkflowEvent::EndCodeAccepted,
        };
        self.dispatch(event);
        Ok(CodeCheck::Verified)
    }

    pub fn submit_start_code(&mut self, input: &str) -> Result<CodeCheck, WorkflowError> {
        self.submit_code(Stage::Start, input)
    }

    pub fn submit_end_code(&mut self, input: &str) -> Result<CodeCheck, WorkflowError> {
        self.submit_code(Stage::End, input)
    }

    /// Take a photo for `stage`, append it locally, then upload it and extend the
    /// booking's URL list. `Ok(None)` when the capture was cancelled.
    pub async fn capture_photo(&mut self, stage: Stage) -> Result<Option<PhotoCapture>, WorkflowError> {
        let span = self.span.clone();
        self.capture_photo_inner(stage).instrument(span).await
    }

    async fn capture_photo_inner(&mut self, stage: Stage) -> Result<Option<PhotoCapture>, WorkflowError> {
        self.ensure(WorkflowAction::CapturePhoto(stage))?;

        if self.camera.request_permission().await != PermissionStatus::Granted {
            warn!("Camera permission denied");
            return Err(WorkflowError::PermissionDenied);
        }
        let Some(image) = self.camera.capture(self.options.capture_quality).await? else {
            info!(stage = stage.photo_label(), "Capture cancelled");
            return Ok(None);
        };

        let photo = self.session.new_photo(image.local_uri);
        let photo_id = photo.id;
        self.dispatch(WorkflowEvent::PhotoAdded { stage, photo });

        self.uploading.store(true, Ordering::SeqCst);
        let result = self.upload_and_record(stage, photo_id, &image.jpeg).await;
        self.uploading.store(false, Ordering::SeqCst);

        let public_url = result?;
        Ok(Some(PhotoCapture {
            stage,
            photo_id,
            public_url,
        }))
    }

    async fn upload_and_record(&mut self, stage: Stage, photo_id: u64, jpeg: &[u8]) -> Result<String, WorkflowError> {
        let timer = OperationTimer::new("photo_upload");
        let email = self.staff_email().await?;
        let path = photo_object_path(&email, &self.booking.id, stage.tag(), Utc::now().timestamp_millis());

        self.backend
            .storage
            .upload_object(&path, jpeg, "image/jpeg")
            .await
            .map_err(|e| {
                warn!(path = %path, error = %e, "Photo upload failed");
                WorkflowError::Upload(e)
            })?;
        let public_url = self.backend.storage.public_url(&path);
        self.session.photos_mut(stage).mark_uploaded(photo_id, &public_url);

        let mut urls = self.booking.photo_urls(stage).to_vec();
        urls.push(public_url.clone());
        let update = BookingUpdate::photo_urls(stage, urls);
        self.backend
            .records
            .update_booking(&self.booking.id, &update)
            .await
            .map_err(WorkflowError::backend("saving the photo reference"))?;
        self.booking.apply(&update);

        info!(stage = stage.photo_label(), url = %public_url, "Photo uploaded");
        timer.finish();
        Ok(public_url)
    }

    async fn staff_email(&self) -> Result<String, WorkflowError> {
        let identity = self
            .backend
            .identity
            .current_user()
            .await
            .map_err(WorkflowError::backend("looking up the signed-in user"))?;
        identity
            .and_then(|user| user.email)
            .filter(|email| !email.trim().is_empty())
            .ok_or(WorkflowError::MissingIdentity)
    }

    /// Drop a photo from the local list. The uploaded object and record entry stay.
    pub fn remove_photo(&mut self, stage: Stage, index: usize) -> Result<LocalPhoto, WorkflowError> {
        let span = self.span.clone();
        let _enter = span.enter();
        self.ensure(WorkflowAction::RemovePhoto(stage))?;

        let photos = self.session.photos(stage);
        let removed = photos.get(index).cloned().ok_or(WorkflowError::PhotoIndex {
            stage,
            index,
            len: photos.len(),
        })?;
        self.dispatch(WorkflowEvent::PhotoRemoved { stage, index });
        Ok(removed)
    }

    /// Record the start time remotely, then start the timer
    pub async fn start_work(&mut self) -> Result<DateTime<Utc>, WorkflowError> {
        let span = self.span.clone();
        self.start_work_inner().instrument(span).await
    }

    async fn start_work_inner(&mut self) -> Result<DateTime<Utc>, WorkflowError> {
        self.ensure(WorkflowAction::StartWork)?;
        let started_at = Utc::now();
        let update = BookingUpdate::work_started(started_at);
        self.backend
            .records
            .update_booking(&self.booking.id, &update)
            .await
            .map_err(WorkflowError::backend("recording the work start"))?;
        self.booking.apply(&update);

        self.timer.start();
        self.dispatch(WorkflowEvent::WorkStarted { at: started_at });
        Ok(started_at)
    }

    /// Freeze the timer and return the worked seconds
    pub fn stop_work(&mut self) -> Result<u64, WorkflowError> {
        let span = self.span.clone();
        let _enter = span.enter();
        self.ensure(WorkflowAction::StopWork)?;
        let elapsed_seconds = self.timer.stop();
        self.dispatch(WorkflowEvent::WorkStopped { elapsed_seconds });
        Ok(elapsed_seconds)
    }

    /// Mark the booking completed with the frozen duration
    pub async fn complete(&mut self) -> Result<CompletionReport, WorkflowError> {
        let span = self.span.clone();
        self.complete_inner().instrument(span).await
    }

    async fn complete_inner(&mut self) -> Result<CompletionReport, WorkflowError> {
        self.ensure(WorkflowAction::Complete)?;
        let timer = OperationTimer::new("complete_job");
        let worked_seconds = self.timer.elapsed_seconds();
        let ended_at = Utc::now();
        let update = BookingUpdate::completed(worked_seconds, ended_at);

        self.backend
            .records
            .update_booking(&self.booking.id, &update)
            .await
            .map_err(WorkflowError::backend("completing the job"))?;
        self.booking.apply(&update);
        self.dispatch(WorkflowEvent::Completed { at: ended_at });

        info!(worked_seconds, duration = %format_duration(worked_seconds), "Job completed");
        timer.finish();
        Ok(CompletionReport {
            booking_id: self.booking.id.clone(),
            worked_seconds,
            ended_at,
            update,
        })
    }

    /// `tel:` link for the customer
    pub fn customer_dial_link(&self) -> Result<String, WorkflowError> {
        if !self.options.show_call_button {
            return Err(WorkflowError::CallDisabled);
        }
        self.booking.dial_link().ok_or(WorkflowError::PhoneUnavailable)
    }

    pub fn directions_link(&self) -> Option<String> {
        self.booking.maps_link()
    }
}

impl std::fmt::Debug for ServiceCompletionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCompletionWorkflow")
            .field("booking_id", &self.booking.id)
            .field("stage", &self.stage())
            .field("elapsed_seconds", &self.elapsed_seconds())
            .field("options", &self.options)
            .finish()
    }
}

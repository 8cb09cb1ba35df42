use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Backend API usage metrics
#[derive(Debug, Default)]
pub struct BackendApiMetrics {
    pub total_requests: AtomicU64,
    pub errors: AtomicU64,
    pub uploads: AtomicU64,
    pub uploaded_bytes: AtomicU64,
}

impl BackendApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self, status: Option<u16>) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        if status == Some(401) {
            warn!("Backend rejected the access token");
        }
    }

    pub fn record_upload(&self, bytes: usize) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        self.uploaded_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> BackendApiStats {
        BackendApiStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            uploaded_bytes: self.uploaded_bytes.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendApiStats {
    pub total_requests: u64,
    pub errors: u64,
    pub uploads: u64,
    pub uploaded_bytes: u64,
}

/// Span wrapping one run of the completion workflow for a booking
pub fn create_workflow_span(booking_id: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "service_workflow",
        booking.id = booking_id,
        correlation.id = correlation_id
    )
}

/// Time an operation and log its duration on completion
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}

// crewdesk library - staff-side job workflow for a home services platform
// This exposes the core components for the CLI, testing and integration

pub mod backend;
pub mod booking;
pub mod camera;
pub mod cli;
pub mod config;
pub mod directory;
pub mod observability;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use backend::{Backend, BackendError, IdentityProvider, LocalBackend, ObjectStorage, RecordStore, RestBackend};
pub use booking::{BadgeCounts, Booking, BookingId, BookingQuery, BookingUpdate, HistorySort, Stage, WorkStatus};
pub use camera::{Camera, CameraError, CaptureQuality, CapturedImage, FileCamera, PermissionStatus};
pub use config::{config, CrewdeskConfig};
pub use directory::{BookingDirectory, DirectoryError, ProfileView};
pub use observability::{create_workflow_span, BackendApiMetrics, OperationTimer};
pub use telemetry::{generate_correlation_id, init_telemetry};
pub use workflow::{
    Alert, CompletionReport, ServiceCompletionWorkflow, WorkflowAction, WorkflowError, WorkflowOptions, WorkflowStage,
};

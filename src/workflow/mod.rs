//! On-site service completion workflow
//!
//! A staff member arrives, enters the customer's start code, photographs the
//! job, runs the work timer, photographs the result and closes the booking
//! with the end code. [`ServiceCompletionWorkflow`] owns one such visit.

pub mod engine;
pub mod errors;
pub mod options;
pub mod photos;
pub mod session;
pub mod state_machine;
pub mod timer;

pub use engine::{CodeCheck, CompletionReport, PhotoCapture, ServiceCompletionWorkflow};
pub use errors::{Alert, WorkflowError};
pub use options::WorkflowOptions;
pub use photos::{LocalPhoto, PhotoSet};
pub use session::{SessionSnapshot, WorkflowSession};
pub use state_machine::{WorkflowAction, WorkflowEvent, WorkflowMachine, WorkflowStage};
pub use timer::{TickSource, TimerPhase, WorkTimer};

//! Generation workflows: request lifecycle, source uploads, and view state.
//!
//! A [`Workflow`](workflow::Workflow) composes one
//! [`RequestController`](controller::RequestController), an optional
//! [`UploadManager`](upload::UploadManager), and a shared
//! [`NotificationEmitter`](genstudio_events::NotificationEmitter). The
//! [`presenter`] turns a snapshot of all of that into a renderable
//! [`ViewModel`](presenter::ViewModel).

pub mod controller;
pub mod presenter;
pub mod preview;
pub mod prompt;
pub mod upload;
pub mod workflow;

pub use controller::{LifecycleState, RequestController, SubmitError};
pub use presenter::{present, ResultPane, ViewModel};
pub use workflow::Workflow;

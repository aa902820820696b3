pub mod config;
pub mod logging;

pub mod auth;
pub mod pace;
pub mod queue;
pub mod retry;

pub use queue::{QueueConfig, QueueStatus, RequestError, RequestQueue, SubmitOptions, Ticket};
pub use retry::{FailureKind, RemoteError};

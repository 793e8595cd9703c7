//! Resilient action execution
//!
//! Every interaction with the remote interface goes through
//! [`ResilientExecutor`], which tries a cached descriptor first, then the
//! direct semantic command, then an explicit locate-then-invoke fallback.
//! [`with_retry`] adds bounded linear backoff around any fallible step.

pub mod errors;
pub mod executor;
mod marking;
pub mod observer;
pub mod retry;
pub mod types;

pub use errors::{FlowError, Retryable};
pub use executor::ResilientExecutor;
pub use marking::with_marks;
pub use observer::{ExecutorObserver, NoopObserver};
pub use retry::{with_retry, RetryPolicy};
pub use types::{ActionOutcome, ActionPath, ActionRequest, ExecutorConfig};

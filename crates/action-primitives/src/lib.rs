//! Actuator port for driving a remote, semantically described UI
//!
//! This crate defines the single capability interface the orchestration
//! layer is allowed to assume about the live interface:
//! - direct natural-language actions (`act`)
//! - locate-then-invoke through opaque descriptors (`locate` / `invoke`)
//! - read-only state queries (location, element text)
//! - bounded waits and diagnostic candidate marking
//!
//! It also carries the error taxonomy shared by every actuator
//! implementation and a polling helper for "is this target visible yet?"
//! observations.

mod actuator;
pub mod errors;
pub mod types;
mod waiting;

pub use actuator::*;
pub use errors::*;
pub use types::*;
pub use waiting::*;

pub use pilot_core_types::{Descriptor, Fingerprint, Instruction, Location};

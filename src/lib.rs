//! assess-pilot: drives an online assessment portal through a resilient,
//! cache-backed action executor and an oracle-backed answer pipeline.

pub mod config;
pub mod driver;
pub mod errors;
pub mod metrics;
pub mod simulation;
pub mod workflow;

pub use config::{ConfigError, PilotConfig};
pub use driver::HttpActuator;
pub use errors::WorkflowError;
pub use simulation::{PortalSimulation, SimCall, SimulationConfig};
pub use workflow::{AssessmentSession, SessionReport, SessionSettings, WorkflowState};

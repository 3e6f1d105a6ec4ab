//! Application layer for the Mentor turn engine.
//!
//! Wires the orchestrator to a session registry and exposes the service
//! facade the host environment (HTTP routing, persistence - out of this
//! workspace's scope) consumes.

pub mod factory;
pub mod registry;
pub mod service;

pub use factory::{SessionFactory, SessionOptions};
pub use registry::SessionRegistry;
pub use service::TutorService;

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! navigation, history and scope subsystems produce:
//!     → tracing events with `scope`, `path`, `token` fields
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, text or JSON)
//!     → any `metrics` recorder the application installs
//! ```
//!
//! # Design Decisions
//! - Structured fields on every decision point
//! - Metrics are cheap (counter increments through the facade)

pub mod logging;
pub mod metrics;

//! Shared domain types for the karaoke job client.
//!
//! Holds the wire model exchanged with the job service (jobs, stages,
//! status reports), the pipeline stage vocabulary, and input validation
//! used before any request is made.

pub mod error;
pub mod job;
pub mod stages;
pub mod types;
pub mod validation;

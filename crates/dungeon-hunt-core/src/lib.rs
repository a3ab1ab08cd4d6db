//! Parallel hill-climbing hunt for the mana peak of a seeded dungeon field.
//!
//! A [`session::HuntSession`] builds a [`field::FieldGrid`] and a batch of
//! [`hunt::Hunt`]s from a [`config::HuntConfig`], then runs them serially or
//! through the [`coordinator::Coordinator`]. Both paths report the same
//! winner for the same seed.

pub mod config;
pub mod coordinator;
pub mod field;
pub mod hunt;
pub mod report;
pub mod session;
pub mod snapshot;

pub use config::{ConfigError, HuntConfig};
pub use coordinator::{Best, Coordinator, HuntOutcome, WorkerError};
pub use field::{Bounds, FieldGrid, Mana, RESOLUTION};
pub use hunt::Hunt;
pub use report::Report;
pub use session::{CompletedHunt, HuntSession, RunMode, SessionError};

//! Land-acquisition cost recalculation.
//!
//! The engine is organised bottom-up:
//!
//! - [`catalog`]: the rows every formula relies on
//! - [`sheet`]: the per-invocation working copy of both tables
//! - [`pipeline`]: named steps with declared reads and writes
//! - [`worksheets`]: the steps of each category
//! - [`engine`] and [`service`]: loading, evaluating and committing

pub mod catalog;
pub mod common;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod service;
pub mod sheet;
pub mod worksheets;

pub use common::{RateUnit, round_half_up};
pub use engine::{RecalculationReport, RecalculationRequest, Recalculator};
pub use error::{ErrorKind, RecalculationError};
pub use pipeline::{Dependency, Pipeline, Step};
pub use service::CostService;
pub use sheet::{CellKey, CostSheet};

//! Service layer: the availability engine.
//!
//! Each stage is a plain function or small struct over owned data, so the
//! stages can be tested in isolation and [`pipeline::Pipeline`] only wires
//! them together.

pub mod classifier;
pub mod gaps;
pub mod horizon;
pub mod normalizer;
pub mod pipeline;
pub mod report;

pub use classifier::EventClassifier;
pub use gaps::{compute_all, compute_day, DayAvailability};
pub use horizon::{Horizon, HORIZON_DAYS};
pub use normalizer::{AcceptedEntry, MalformedReason, NormalizationStats, NormalizedEntries, Normalizer};
pub use pipeline::Pipeline;
pub use report::{DayReport, Report, ReportAssembler, SlotReport};

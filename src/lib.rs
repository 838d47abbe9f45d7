pub mod annotation;
pub mod commands;
pub mod config;
pub mod error;
pub mod io;
pub mod matrix;
pub mod modality;
pub mod normalize;
pub mod overlap;
pub mod plot;
pub mod ranges;
pub mod reporting;
pub mod test_utilities;

/// A genomic position. All coordinates in this crate are 1-based and
/// closed, i.e. `[start, end]` with both endpoints inclusive.
pub type Position = u32;

pub mod prelude {
    pub use crate::config::{ChromNaming, PipelineConfig, UnassignedPolicy};
    pub use crate::error::MultiomeError;
    pub use crate::matrix::CountMatrix;
    pub use crate::ranges::{IntervalRecord, IntervalSet};
}

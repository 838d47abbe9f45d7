//! Input/output: compressed file handling and the 10x MEX directory loader.

pub mod file;
pub mod mex;

pub use file::{InputFile, OutputFile};
pub use mex::read_mex_dir;

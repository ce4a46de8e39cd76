//! Generation stages and the pipeline tying them together.

pub mod bundle;
pub mod pipeline;
pub mod splice;
pub mod wrap;

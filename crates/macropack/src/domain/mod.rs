//! Domain types shared by the generation stages.

pub mod errors;
pub mod literal;
pub mod model;

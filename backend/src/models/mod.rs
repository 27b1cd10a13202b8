//! Core data model: sky coordinates, bounding boxes and object summaries.

pub mod coordinates;
pub mod object;

pub use coordinates::*;
pub use object::*;

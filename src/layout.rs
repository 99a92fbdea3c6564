//! Diagram layout pipeline.
//!
//! Stages run strictly in sequence, each consuming the previous one's
//! output: selection, ordering and clustering, major stops, positions,
//! labels. [`LayoutEngine`] drives them.

pub mod clustering;
pub mod context;
mod engine;
pub mod labels;
pub mod major;
pub mod ordering;
pub mod positions;
pub mod selection;
pub mod types;

pub use context::LayoutContext;
pub use engine::LayoutEngine;

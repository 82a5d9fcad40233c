//! Bulk generation of a course tree from a compact spec.

pub mod builder;
pub mod context;
pub mod spec;

pub use builder::{BuildReport, LevelReport, TreeBuilder};
pub use context::BuildContext;
pub use spec::{PageTemplate, StructureSpec, StructureTotals};

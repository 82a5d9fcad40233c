pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{CourseService, PageUpdate};
pub use domain::catalog::PatternCatalog;
pub use domain::completion::{CompletionAggregator, CompletionReport, CompletionSummary};
pub use domain::enforce::{GrainTypeEnforcer, SlotRule};
pub use domain::model::{GrainContent, GrainType, PageType};
pub use domain::structure::{BuildContext, BuildReport, PageTemplate, StructureSpec, TreeBuilder};
pub use error::ContentError;
pub use storage::{ContentStore, MemoryContentStore, PostgresContentStore};

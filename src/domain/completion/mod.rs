pub mod aggregator;

pub use aggregator::{
    CompletionAggregator, CompletionReport, CompletionSummary, GrainProgress, LessonCompletion,
    ModuleCompletion, PageCompletion, Progress,
};

//! Grain patterns per page type.

pub mod patterns;

pub use patterns::PatternCatalog;

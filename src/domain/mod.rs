pub mod catalog;
pub mod completion;
pub mod enforce;
pub mod model;
pub mod structure;

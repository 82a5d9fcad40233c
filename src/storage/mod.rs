pub mod content;

pub use content::{ContentStore, MemoryContentStore, PostgresContentStore};

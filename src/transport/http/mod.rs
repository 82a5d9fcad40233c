pub mod router;
pub mod types;
pub mod handlers {
    pub mod common;
    pub mod completion;
    pub mod courses;
    pub mod grains;
    pub mod health;
    pub mod pages;
    pub mod patterns;
    pub mod structure;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;

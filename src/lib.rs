mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod report;
    pub mod schema;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod constants;
mod error;

mod cache {
    pub mod cache;
}

pub use authentication::*;
pub use cache::cache::*;
pub use constants::*;
pub use database::*;
pub use error::*;
pub use report::*;

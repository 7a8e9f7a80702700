pub mod error;
pub mod pagination;
pub mod snippet;
pub mod snippet_type;
pub mod user;

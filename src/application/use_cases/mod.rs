pub mod auth;
pub mod import;
pub mod maintenance;
pub mod snippets;

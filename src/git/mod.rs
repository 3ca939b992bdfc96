pub mod commands;
pub mod diff;
pub mod parser;
pub mod repository;
pub mod types;

pub use commands::GitCli;
pub use repository::Repository;

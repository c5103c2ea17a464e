pub mod config;
pub mod find;
pub mod navigate;
pub mod route;

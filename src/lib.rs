pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod render;

pub use cli::run;

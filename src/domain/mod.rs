pub mod classifier;
pub mod datetime;
pub mod filter;
pub mod models;
pub mod sorter;
pub mod task_form;

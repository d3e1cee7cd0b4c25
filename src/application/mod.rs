pub mod bootstrap;
pub mod commands;
pub mod session;
pub mod task_list;

pub mod access;
pub mod forms;
pub mod models;
pub mod snapshot;

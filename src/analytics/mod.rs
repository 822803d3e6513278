pub mod maintenance;
pub mod task_filter;

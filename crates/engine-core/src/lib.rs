pub mod error;
pub mod provision;
pub mod retry;
pub mod workload;

pub mod backend;
pub mod bulk;
pub mod control;
pub mod embedded;
pub mod error;

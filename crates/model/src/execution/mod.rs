pub mod operation;
pub mod query;
pub mod result;
pub mod totals;

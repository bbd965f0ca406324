pub mod collection;
pub mod partition_key;

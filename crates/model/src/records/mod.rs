pub mod document;
pub mod update;

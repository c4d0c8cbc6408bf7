//! Database access layer

pub mod documents;
pub mod owners;

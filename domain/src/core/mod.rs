//! Core domain primitives shared by every module

pub mod error;
pub mod value;

pub use error::DomainError;
pub use value::Value;

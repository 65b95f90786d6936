//! Data Transfer Objects for REST response serialization.

pub mod health_dto;

pub use health_dto::*;

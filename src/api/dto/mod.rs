//! Data Transfer Objects for the responses the proxy builds itself.
//!
//! Forwarded endpoints relay the upstream body untouched and have no DTO.

pub mod catalog_dto;

pub use catalog_dto::*;

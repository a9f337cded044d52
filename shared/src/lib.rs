//! Shared types and models for the Clinic Stock Management Platform
//!
//! This crate contains types shared between the backend and other components
//! of the system.

pub mod coerce;
pub mod models;
pub mod types;
pub mod validation;

pub use coerce::*;
pub use models::*;
pub use types::*;
pub use validation::*;

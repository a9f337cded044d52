//! HTTP middleware for the Clinic Stock Management Platform

mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};

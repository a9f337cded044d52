//! HTTP handlers for the Clinic Stock Management Platform

mod health;
mod purchases;
mod sales;
mod stock;
mod transfers;

pub use health::*;
pub use purchases::*;
pub use sales::*;
pub use stock::*;
pub use transfers::*;

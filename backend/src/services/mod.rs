//! Business logic services for the Clinic Stock Management Platform

pub mod alerts;
pub mod catalog;
pub mod deduction;
pub mod locations;
pub mod purchases;
pub mod sales;
pub mod settings;
pub mod stock;
pub mod transfers;

pub use alerts::AlertService;
pub use catalog::CatalogService;
pub use deduction::DeductionService;
pub use locations::LocationService;
pub use purchases::PurchaseService;
pub use sales::SaleService;
pub use settings::SettingsService;
pub use stock::StockService;
pub use transfers::TransferService;

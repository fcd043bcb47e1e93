//! `stockdash-app`: wires the session gate, inventory and display mode into
//! one dashboard state object for a presentation layer to drive.

pub mod config;
pub mod dashboard;

pub use config::AppConfig;
pub use dashboard::Dashboard;

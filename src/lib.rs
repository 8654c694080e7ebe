// src/lib.rs
pub mod config;
pub mod drivers;
pub mod export;
pub mod types;
pub use config::{DashboardConfig, PlotConfig};

//! Data layer: table model, loading, cleaning and aggregation.
//!
//! Architecture:
//! ```text
//!  .csv / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → AirQualityDataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ imputer   │  replace IQR outliers with the median, per column
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  quarterly means, correlation matrix
//!   └───────────┘
//! ```
//!
//! `pipeline` strings the stages together for the dashboard.

pub mod aggregate;
pub mod imputer;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod stats;

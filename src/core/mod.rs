//! Core module - Configuration, errors, and domain types

mod config;
mod error;
mod types;

pub use config::{ApiConfig, Config, ExportConfig, GeneralConfig, ReadingsConfig, BASE_URL_ENV};
pub use error::{Error, Result};
pub use types::{
    page_query, Alert, AlertFilter, AlertStats, AlertStatus, AlertType, AuthResponse,
    ConsumptionPoint, DashboardStats, DateFilter, Gasometer, GasometerFilter, GasometerForm,
    GasometerPatch, GasometerStatus, LoginCredentials, Page, Query, Reading, ReadingFilter,
    ReadingForm, ReadingPatch, User,
};

//! Resource services
//!
//! Thin typed wrappers over [`ApiClient`], one per REST resource. Each is a
//! borrowed view obtained from the client, e.g. `client.readings().list(..)`.

mod alerts;
mod auth;
mod dashboard;
mod gasometers;
mod readings;

pub use alerts::AlertService;
pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use gasometers::GasometerService;
pub use readings::ReadingService;

use crate::api::ApiClient;

impl ApiClient {
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn gasometers(&self) -> GasometerService<'_> {
        GasometerService::new(self)
    }

    pub fn readings(&self) -> ReadingService<'_> {
        ReadingService::new(self)
    }

    pub fn alerts(&self) -> AlertService<'_> {
        AlertService::new(self)
    }

    pub fn dashboard(&self) -> DashboardService<'_> {
        DashboardService::new(self)
    }
}

/// Path of one item of a collection
fn item_path(collection: &str, id: i64) -> String {
    format!("/{}/{}/", collection, id)
}

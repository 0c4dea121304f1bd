//! Live response source backed by the Google Sheets values API.

#[cfg(feature = "http")]
pub mod auth;
#[cfg(feature = "http")]
pub mod sheets;

#[cfg(all(test, feature = "http"))]
mod test_support;

#[cfg(feature = "http")]
pub use auth::{ServiceAccount, ServiceAccountKey};
#[cfg(feature = "http")]
pub use sheets::{Credentials, SheetsClient, SheetsError, table_from_values};

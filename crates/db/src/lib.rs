pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod source;

pub use connection::{connect, DbPool};
pub use fixtures::{FixtureError, SeedDataset, SeedResult, VerificationResult};
pub use source::SqlAnalyticsSource;

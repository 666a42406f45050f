/// Database connection and table creation
pub mod database;

/// Seed data (default profile, challenges, starter memories) from seeds.toml
pub mod seeds;

/// Runtime settings from environment variables
pub mod settings;

pub use seeds::SeedConfig;
pub use settings::AppSettings;

//! Project configuration (`.secrets.toml`).

pub mod settings;

pub use settings::Settings;

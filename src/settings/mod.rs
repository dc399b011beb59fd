//! Settings come from a TOML file with `AUTHGATE_*` environment overrides and
//! are loaded once at startup.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::BellsConfig;
pub use error::{BellsError, Result};
pub use events::ChatEvent;
pub use types::*;

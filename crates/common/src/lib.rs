pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, EmbedderKind};
pub use error::SemStoreError;
pub type Result<T> = std::result::Result<T, SemStoreError>;

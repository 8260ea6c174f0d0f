pub mod logging;
pub mod settings;
pub mod system;
pub mod validate;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use settings::{PulsarConfig, RuntimeSettings};
pub use system::SystemConfig;

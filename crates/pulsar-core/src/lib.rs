pub mod error;
pub mod rule;
pub mod snapshot;
pub mod temporal;
pub mod value;

pub use error::{CoreError, CoreReason, CoreResult};
pub use rule::{RuleOutcome, execute_rule};
pub use snapshot::Snapshot;
pub use temporal::{TemporalBuffer, TemporalStore};
pub use value::Value;

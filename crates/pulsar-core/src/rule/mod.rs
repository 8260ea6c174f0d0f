mod eval;
mod executor;

#[cfg(test)]
mod tests;

pub use eval::{EvalFault, eval_bool, eval_number};
pub use executor::{RuleOutcome, execute_rule};

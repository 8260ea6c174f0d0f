pub mod analyze;
pub mod ast;
pub mod checker;
pub mod compiler;
pub mod error;
pub mod explain;
pub mod expr;
pub mod manifest;
pub mod plan;
pub mod yaml_parser;

pub use compiler::{
    CompileFailure, CompileOutput, MANIFEST_FILE_NAME, PLAN_FILE_NAME, PlanOptions, compile,
    write_artifacts,
};
pub use manifest::Manifest;
pub use plan::ExecutionPlan;
pub use yaml_parser::{DslError, ParseWarning, load_rule_set, parse_rule_set};

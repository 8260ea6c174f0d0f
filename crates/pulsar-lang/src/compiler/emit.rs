use std::path::Path;

use orion_error::prelude::*;

use crate::error::{LangReason, LangResult};
use crate::manifest::Manifest;
use crate::plan::ExecutionPlan;

pub const PLAN_FILE_NAME: &str = "execution_plan.json";
pub const MANIFEST_FILE_NAME: &str = "rules.manifest.json";

/// Write the plan and manifest into `output_dir`, creating it if needed.
/// Encoding is pretty-printed JSON with struct-declaration key order, so
/// identical inputs produce byte-identical files.
pub fn write_artifacts(
    output_dir: &Path,
    plan: &ExecutionPlan,
    manifest: &Manifest,
) -> LangResult<()> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        StructError::from(LangReason::PlanEmit)
            .with_detail(format!("create {}: {e}", output_dir.display()))
    })?;

    write_json(&output_dir.join(PLAN_FILE_NAME), plan)?;
    write_json(&output_dir.join(MANIFEST_FILE_NAME), manifest)?;
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> LangResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| {
        StructError::from(LangReason::PlanEmit)
            .with_detail(format!("serialize {}: {e}", path.display()))
    })?;
    bytes.push(b'\n');
    std::fs::write(path, bytes).map_err(|e| {
        StructError::from(LangReason::PlanEmit)
            .with_detail(format!("write {}: {e}", path.display()))
    })
}

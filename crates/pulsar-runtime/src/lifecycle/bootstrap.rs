use std::path::Path;

use orion_error::prelude::*;

use pulsar_lang::manifest::Manifest;
use pulsar_lang::plan::ExecutionPlan;
use pulsar_lang::{MANIFEST_FILE_NAME, PLAN_FILE_NAME};

use crate::error::{RuntimeReason, RuntimeResult};

/// Load the frozen execution plan (and its manifest) from a compiler
/// output directory. A missing or corrupt plan is fatal: the runtime has
/// nothing to execute.
pub fn load_plan_dir(plan_dir: &Path) -> RuntimeResult<(ExecutionPlan, Manifest)> {
    let plan: ExecutionPlan = read_json(&plan_dir.join(PLAN_FILE_NAME))?;
    let manifest: Manifest = read_json(&plan_dir.join(MANIFEST_FILE_NAME))?;

    if manifest.header.total_rules != plan.rules.len() {
        return StructError::from(RuntimeReason::Bootstrap)
            .with_detail(format!(
                "manifest/plan mismatch in {}: manifest lists {} rules, plan has {}",
                plan_dir.display(),
                manifest.header.total_rules,
                plan.rules.len()
            ))
            .err();
    }

    ps_debug!(
        conf,
        rules = plan.rules.len(),
        layers = plan.layer_count,
        "plan loaded"
    );
    Ok((plan, manifest))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> RuntimeResult<T> {
    let bytes = std::fs::read(path).map_err(|e| {
        StructError::from(RuntimeReason::Bootstrap)
            .with_detail(format!("read {}: {e}", path.display()))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        StructError::from(RuntimeReason::Bootstrap)
            .with_detail(format!("parse {}: {e}", path.display()))
    })
}

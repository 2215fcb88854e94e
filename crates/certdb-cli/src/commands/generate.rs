use anyhow::bail;
use serde::Serialize;

use certdb_config::CertdbConfig;
use certdb_core::drafts::NewObjective;
use certdb_core::enums::InferenceStrategy;
use certdb_engine::inference::{GenerationContext, generate_with_floor};
use certdb_engine::validator::apply_validation;

use crate::cli::root_commands::GenerateArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;

#[derive(Debug, Serialize)]
struct GenerationPreview {
    strategy: InferenceStrategy,
    floor: f64,
    objectives: Vec<NewObjective>,
}

/// Run the cascade and the validator for one test description without
/// touching the store.
fn preview(args: &GenerateArgs, default_floor: f64) -> anyhow::Result<GenerationPreview> {
    let floor = args.floor.unwrap_or(default_floor);
    if !(0.0..=1.0).contains(&floor) {
        bail!("--floor must be within [0, 1], got {floor}");
    }
    let ctx = GenerationContext {
        subject_area: &args.subject,
        test_system: &args.system,
        test_name: &args.name,
    };
    let generation = generate_with_floor(&ctx, floor);
    let strategy = generation.strategy;
    let mut objectives = generation.into_drafts();
    for objective in &mut objectives {
        apply_validation(objective);
    }
    Ok(GenerationPreview {
        strategy,
        floor,
        objectives,
    })
}

/// Handle `certdb generate`.
pub fn handle(args: &GenerateArgs, config: &CertdbConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let preview = preview(args, config.run.confidence_floor)?;
    tracing::debug!(strategy = %preview.strategy, count = preview.objectives.len(), "generation preview");
    if flags.format == OutputFormat::Table {
        return output(&preview.objectives, flags.format);
    }
    output(&preview, flags.format)
}

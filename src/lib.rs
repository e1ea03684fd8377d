pub mod batch;
pub mod check;
pub mod config;
pub mod error;
pub mod fsutil;
pub mod materialize;
pub mod model;
pub mod project;
pub mod rename;
pub mod report;
pub mod rows;
pub mod workspace;

use std::path::{Path, PathBuf};

use crate::batch::{process_all, BatchSummary};
use crate::check::{check_mapping, check_values, require_valid_template, CheckResult};
use crate::config::Config;
use crate::error::Result;
use crate::report::Reporter;
use crate::rows::{load_header, load_rows, RowRecord};
use crate::workspace::Workspace;

pub struct GenerateOptions {
    /// Template folder path, or a template name under the workspace's `templates/`.
    pub template: String,
    pub config: Config,
    pub data: PathBuf,
    pub output: Option<PathBuf>,
    pub workspace: Workspace,
}

/// Everything needed to run a batch that has been validated but not yet written.
pub struct GenerationPlan {
    pub template_dir: PathBuf,
    pub template: CheckResult,
    pub config: Config,
    pub rows: Vec<RowRecord>,
    pub output_dir: PathBuf,
    /// Non-fatal findings from template, mapping and value checks.
    pub warnings: Vec<String>,
}

/// Validate the template, data and parameter mapping without writing anything.
pub fn plan_generation(options: GenerateOptions) -> Result<GenerationPlan> {
    let template_dir = options.workspace.resolve_template(&options.template)?;
    let template = require_valid_template(&template_dir)?;

    let header = load_header(&options.data)?;
    let rows = load_rows(&options.data)?;

    let mapping = check_mapping(&options.config, &header).into_result()?;

    let mut warnings = template.warnings.clone();
    if !mapping.extra.is_empty() {
        warnings.push(format!(
            "Columns not declared as parameters: {}",
            mapping.extra.join(", ")
        ));
    }
    warnings.extend(check_values(&options.config, &rows));

    let output_dir = resolve_output_dir(&options, &template.identifier);

    Ok(GenerationPlan {
        template_dir,
        template,
        config: options.config,
        rows,
        output_dir,
        warnings,
    })
}

/// `--output-dir`, then the config's `output.directory`, then
/// `outputs/<Template>_OUTPUTS` in the workspace.
fn resolve_output_dir(options: &GenerateOptions, template_id: &str) -> PathBuf {
    if let Some(out) = &options.output {
        return out.clone();
    }
    if let Some(dir) = &options.config.output.directory {
        return Path::new(dir).to_path_buf();
    }
    options.workspace.default_output_dir(template_id)
}

/// Run a planned batch.
pub fn execute_generation(plan: &GenerationPlan, reporter: &dyn Reporter) -> Result<BatchSummary> {
    process_all(&plan.template_dir, &plan.rows, &plan.output_dir, reporter)
}

/// Plan and run a batch in one go.
pub fn generate(options: GenerateOptions, reporter: &dyn Reporter) -> Result<BatchSummary> {
    let plan = plan_generation(options)?;
    for warning in &plan.warnings {
        reporter.warn(warning);
    }
    execute_generation(&plan, reporter)
}

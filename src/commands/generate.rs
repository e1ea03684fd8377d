use std::path::PathBuf;

use console::style;
use miette::Result;

use pbipgen::config::load_config;
use pbipgen::report::{ConsoleReporter, Reporter};
use pbipgen::workspace::Workspace;
use pbipgen::GenerateOptions;

pub fn run(
    template: String,
    config: PathBuf,
    data: PathBuf,
    output_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let config = load_config(&config)?;
    crate::init_tracing(verbose, config.logging.level.as_deref());

    let workspace = Workspace::new(".");
    let plan = pbipgen::plan_generation(GenerateOptions {
        template,
        config,
        data,
        output: output_dir,
        workspace,
    })?;

    println!(
        "{} {} ({})",
        style("Template").bold(),
        style(&plan.template.identifier).cyan(),
        plan.template.format
    );
    println!(
        "  {} row(s) from the data file, {} parameter(s) configured",
        plan.rows.len(),
        plan.config.parameters.len()
    );

    let reporter = ConsoleReporter::with_progress(verbose, plan.rows.len());
    for warning in &plan.warnings {
        reporter.warn(warning);
    }

    let summary = pbipgen::execute_generation(&plan, &reporter)?;

    if !summary.succeeded.is_empty() {
        let mut folders = summary.succeeded.clone();
        folders.sort();
        println!(
            "\n{} in {}:",
            style("Generated projects").bold(),
            style(plan.output_dir.display()).cyan()
        );
        for folder in &folders {
            println!("  {} {}", style("✓").green(), folder);
        }
    }

    if !summary.failures.is_empty() {
        println!("\n{}", style("Failed rows:").red().bold());
        for failure in &summary.failures {
            println!(
                "  {} row {} ({}): {}",
                style("✗").red(),
                failure.row,
                failure.identifier,
                failure.message
            );
        }
    }

    println!(
        "\n{} of {} project(s) generated",
        summary.success_count(),
        summary.total
    );

    if summary.success_count() == 0 {
        println!("{} No projects were generated", style("✗").red().bold());
        std::process::exit(1);
    }

    Ok(())
}

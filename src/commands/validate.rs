use std::path::{Path, PathBuf};

use console::style;
use miette::Result;

use pbipgen::check::{check_mapping, check_template, check_values};
use pbipgen::config::load_config;
use pbipgen::rows::{load_header, load_rows};
use pbipgen::workspace::Workspace;

use super::print_findings;

pub fn run(template: String, config: PathBuf, data: PathBuf, verbose: bool) -> Result<()> {
    let config = load_config(&config)?;
    crate::init_tracing(verbose, config.logging.level.as_deref());

    let template_dir = Workspace::new(".").resolve_template(&template)?;

    println!(
        "{} {}",
        style("Validating template at").bold(),
        style(template_dir.display()).cyan()
    );

    let result = check_template(&template_dir)?;
    let mut warnings = result.warnings.clone();
    let mut errors = result.errors.clone();

    println!("  Format: {}", result.format);
    println!("  Parameters in model: {}", result.parameters.len());
    println!("  Parameters configured: {}", config.parameters.len());

    check_data(&config, &data, &mut warnings, &mut errors);

    print_findings(&warnings, &errors);

    if !errors.is_empty() {
        println!(
            "\n{} Validation found {} error(s)",
            style("✗").red().bold(),
            errors.len()
        );
        std::process::exit(1);
    } else {
        println!("\n{} Everything is ready to generate!", style("✓").green().bold());
    }

    Ok(())
}

fn check_data(
    config: &pbipgen::config::Config,
    data: &Path,
    warnings: &mut Vec<String>,
    errors: &mut Vec<String>,
) {
    let header = match load_header(data) {
        Ok(header) => header,
        Err(e) => {
            errors.push(e.to_string());
            return;
        }
    };

    let mapping = check_mapping(config, &header);
    for name in &mapping.missing {
        errors.push(format!("Parameter '{name}' has no column in the data file"));
    }
    for column in &mapping.extra {
        warnings.push(format!("Column '{column}' is not a configured parameter"));
    }

    match load_rows(data) {
        Ok(rows) => {
            println!("  Data rows: {}", rows.len());
            warnings.extend(check_values(config, &rows));
        }
        Err(e) => errors.push(e.to_string()),
    }
}

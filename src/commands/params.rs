use console::style;
use miette::Result;

use pbipgen::check::check_template;
use pbipgen::workspace::Workspace;

use super::print_findings;

pub fn run(template: String) -> Result<()> {
    crate::init_tracing(false, None);

    let template_dir = Workspace::new(".").resolve_template(&template)?;
    let result = check_template(&template_dir)?;

    println!(
        "{} {} ({})",
        style("Template").bold(),
        style(&result.identifier).cyan(),
        result.format
    );

    if !result.parameters.is_empty() {
        let width = result.parameters.keys().map(String::len).max().unwrap_or(0);
        println!();
        for (name, value) in &result.parameters {
            println!("  {}  {}", style(format!("{name:width$}")).bold(), value);
        }
    }

    print_findings(&result.warnings, &result.errors);

    if !result.is_valid() {
        std::process::exit(1);
    }

    Ok(())
}

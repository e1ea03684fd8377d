pub mod generate;
pub mod list;
pub mod params;
pub mod validate;

use console::style;

fn print_findings(warnings: &[String], errors: &[String]) {
    if !warnings.is_empty() {
        println!("\n{}", style("Warnings:").yellow().bold());
        for w in warnings {
            println!("  {} {}", style("⚠").yellow(), w);
        }
    }

    if !errors.is_empty() {
        println!("\n{}", style("Errors:").red().bold());
        for e in errors {
            println!("  {} {}", style("✗").red(), e);
        }
    }
}

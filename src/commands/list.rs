use std::path::{Path, PathBuf};

use console::style;
use miette::Result;

use pbipgen::workspace::Workspace;

pub fn run(root: PathBuf) -> Result<()> {
    crate::init_tracing(false, None);

    let workspace = Workspace::new(root);

    print_section("Templates", &workspace.templates()?, workspace.root());
    print_section("Configs", &workspace.configs()?, workspace.root());
    print_section("Data files", &workspace.data_files()?, workspace.root());

    Ok(())
}

fn print_section(title: &str, entries: &[PathBuf], root: &Path) {
    println!(
        "{} ({})",
        style(title).bold(),
        entries.len()
    );
    if entries.is_empty() {
        println!("  {}", style("none").dim());
    }
    for entry in entries {
        let shown = entry.strip_prefix(root).unwrap_or(entry);
        println!("  {}", shown.display());
    }
    println!();
}

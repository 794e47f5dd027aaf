//! `tsrc init` command - Create a sourcing project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::core::{Config, Project};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

/// Run the init command
pub fn run(args: InitArgs) -> Result<()> {
    fs::create_dir_all(&args.path).into_diagnostic()?;
    let project = Project::init(&args.path).map_err(|e| miette::miette!("{}", e))?;

    let config = Config::default();
    let yaml = serde_yml::to_string(&config).into_diagnostic()?;
    fs::write(project.config_path(), yaml).into_diagnostic()?;

    for dir in [&config.vendors_dir, &config.customs_dir] {
        fs::create_dir_all(project.root().join(dir)).into_diagnostic()?;
    }

    println!(
        "{} Initialized tsrc project at {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );
    println!(
        "   Add vendor price lists under {}",
        style(config.vendors_path(&project).display()).yellow()
    );
    Ok(())
}

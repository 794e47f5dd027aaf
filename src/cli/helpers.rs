//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use std::path::Path;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::core::{Config, Project};
use crate::sourcing::{read_requirements, Catalog, CompositeOrder, SourcingProvider};

/// Locate the project from `-C` or the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(dir) => Project::discover_from(dir),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Project, effective configuration and vendor catalog
pub struct Workspace {
    pub project: Project,
    pub config: Config,
    pub catalog: Catalog,
}

impl Workspace {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = open_project(global)?;
        let config = Config::load(Some(&project))?;
        let catalog = Catalog::load(&project, &config)?;
        debug!(root = %project.root().display(), vendors = catalog.vendors().len(), "Opened workspace");
        Ok(Self {
            project,
            config,
            catalog,
        })
    }

    /// Order reference from the command line, or a fresh one
    pub fn order_ref(&self, given: Option<&str>) -> String {
        given
            .map(str::to_string)
            .unwrap_or_else(|| self.config.generate_order_ref())
    }

    /// Build a composite order for every requirement in a CSV file
    pub fn build_order(&self, requirements: &Path, order_ref: &str) -> Result<CompositeOrder<'_, Catalog>> {
        let requirements = read_requirements(requirements)?;
        if requirements.is_empty() {
            return Err(miette::miette!("No requirements found"));
        }

        let mut order = CompositeOrder::new(&self.catalog);
        for req in &requirements {
            order.add(&req.ident, req.required, req.shortage(), Some(order_ref));
        }
        Ok(order)
    }
}

/// Create a directory (and parents) for output files
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).into_diagnostic()
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

//! Project discovery - a sourcing project is any directory holding `.tsrc/`

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Marker directory at the project root
pub const PROJECT_DIR: &str = ".tsrc";

/// Errors locating or creating a project
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not a tsrc project (or any parent directory): {0}. Run 'tsrc init' first")]
    NotFound(PathBuf),

    #[error("Project already initialized at {0}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A sourcing project on disk
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Find the project containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Find the project containing `start`, walking up through parents
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self {
                    root: current.to_path_buf(),
                });
            }
            dir = current.parent();
        }
        Err(ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create the project marker directory under `root`
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        let marker = root.join(PROJECT_DIR);
        if marker.exists() {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }
        fs::create_dir_all(&marker)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the project configuration file
    pub fn config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("config.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_then_discover_from_subdir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        let sub = tmp.path().join("builds/rev-a");
        fs::create_dir_all(&sub).unwrap();

        let project = Project::discover_from(&sub).unwrap();
        assert_eq!(project.root(), tmp.path());
        assert!(project.config_path().ends_with(".tsrc/config.yaml"));
    }

    #[test]
    fn test_init_twice_fails() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        assert!(matches!(
            Project::init(tmp.path()),
            Err(ProjectError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_discover_outside_project_fails() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Project::discover_from(tmp.path()),
            Err(ProjectError::NotFound(_))
        ));
    }
}

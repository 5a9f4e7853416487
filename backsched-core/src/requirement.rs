use crate::config::job::Requirement;
use std::path::{Path, PathBuf};

pub trait Filesystem: Send + Sync {
    fn directory_exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn directory_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum Unmet {
    #[error("directory '{}' doesn't exist", .0.display())]
    MissingDirectory(PathBuf),
}

impl Requirement {
    pub fn check(&self, fs: &dyn Filesystem) -> Result<(), Unmet> {
        match self {
            Requirement::DirectoryExists { path } => {
                if fs.directory_exists(path) {
                    Ok(())
                } else {
                    Err(Unmet::MissingDirectory(path.clone()))
                }
            }
        }
    }
}

/// Checks all requirements in order, stopping at the first unmet one.
pub fn check_all(requirements: &[Requirement], fs: &dyn Filesystem) -> Result<(), Unmet> {
    requirements.iter().try_for_each(|r| r.check(fs))
}

//! Lineage hashes from a git working tree

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use trove_domain::{ChainError, LineageSource, LineageState};

/// Reads the short `HEAD` hash and the modified tracked files of a repository.
///
/// Untracked files do not make the state dirty. A directory outside any
/// repository resolves to a state without a hash.
#[derive(Debug, Clone)]
pub struct GitLineage {
    repo: PathBuf,
}

impl GitLineage {
    /// Lineage of the repository containing `repo`
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self { repo: repo.into() }
    }

    /// Directory git runs in
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn git(&self, args: &[&str]) -> trove_domain::Result<Option<String>> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo)
            .output()
            .map_err(|e| ChainError::Lineage(format!("could not run git in {}: {}", self.repo.display(), e)))?;
        if !output.status.success() {
            debug!(
                repo = %self.repo.display(),
                args = ?args,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git exited with failure"
            );
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

impl LineageSource for GitLineage {
    fn resolve(&self) -> trove_domain::Result<LineageState> {
        let hash = match self.git(&["rev-parse", "--short", "HEAD"])? {
            Some(out) => out.trim().to_string(),
            None => return Ok(LineageState::default()),
        };
        let status = self
            .git(&["status", "--porcelain", "--untracked-files=no"])?
            .unwrap_or_default();
        Ok(LineageState {
            hash: Some(hash),
            dirty_paths: parse_porcelain(&status),
        })
    }
}

/// Paths from `git status --porcelain` lines (`XY path` or `XY old -> new`)
fn parse_porcelain(status: &str) -> Vec<String> {
    status
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| {
            let path = &line[3..];
            match path.split_once(" -> ") {
                Some((_, renamed)) => renamed.to_string(),
                None => path.to_string(),
            }
        })
        .collect()
}

//! Project command implementation.

use crate::cli::{ProjectAction, ProjectArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::{Path, PathBuf};

/// Execute the project command, saving the config when it changes.
pub fn execute_project(
    args: ProjectArgs,
    config: &mut Config,
    config_path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ProjectAction::List => {
            println!("{}", formatter.format_projects(&config.projects)?);
        }
        ProjectAction::Add { name, path, force } => {
            let path = absolute(path);
            if !path.is_dir() {
                println!("{}", formatter.info(&format!("{} does not exist yet", path.display())));
            }
            config.add_project(name.clone(), path.clone(), force)?;
            config.save(config_path)?;
            println!(
                "{}",
                formatter.success(&format!("Registered project '{}' at {}", name, path.display()))
            );
        }
        ProjectAction::Remove { name } => {
            let removed = config.remove_project(&name)?;
            config.save(config_path)?;
            println!(
                "{}",
                formatter.success(&format!("Removed project '{}' ({})", name, removed.path.display()))
            );
        }
    }
    Ok(())
}

/// Make a path absolute without requiring it to exist
fn absolute(path: PathBuf) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

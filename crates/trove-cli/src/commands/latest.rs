//! Latest command implementation.

use super::{open_target, standard_codec};
use crate::cli::TargetArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the latest command.
pub fn execute_latest(args: TargetArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    println!("{}", render_latest(&args, config, formatter)?);
    Ok(())
}

/// Build the latest output.
pub fn render_latest(args: &TargetArgs, config: &Config, formatter: &Formatter) -> Result<String> {
    let node = open_target(args, config, &standard_codec())?;
    match node.latest() {
        Some(child) => formatter.format_node(child),
        None => Ok(formatter.info(&format!("No entries in {}", node.path().display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{sample_tree, target};
    use crate::config::OutputFormat;

    #[test]
    fn test_latest_picks_last_name() {
        let dir = sample_tree();
        let output = render_latest(
            &target(dir.path(), &["raw"]),
            &Config::default(),
            &Formatter::new(OutputFormat::Quiet, false),
        )
        .unwrap();
        assert!(output.ends_with("2.csv"));
    }

    #[test]
    fn test_latest_of_empty_folder_is_not_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = render_latest(
            &target(dir.path(), &[]),
            &Config::default(),
            &Formatter::new(OutputFormat::Table, false),
        )
        .unwrap();
        assert!(output.contains("No entries"));
    }
}

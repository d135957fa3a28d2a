//! Ls command implementation.

use super::{open_target, standard_codec};
use crate::cli::LsArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the ls command.
pub fn execute_ls(args: LsArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    println!("{}", render_ls(&args, config, formatter)?);
    Ok(())
}

/// Build the ls output.
pub fn render_ls(args: &LsArgs, config: &Config, formatter: &Formatter) -> Result<String> {
    let node = open_target(&args.target, config, &standard_codec())?;
    let full = args.full || config.settings.full_listing;
    formatter.format_listing(&node, &node.listing(full))
}

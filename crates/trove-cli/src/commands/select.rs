//! Select command implementation.

use super::{open_target, standard_codec};
use crate::cli::TargetArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the select command.
pub fn execute_select(args: TargetArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let node = open_target(&args, config, &standard_codec())?;
    println!("{}", formatter.format_node(&node)?);
    Ok(())
}

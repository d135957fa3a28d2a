//! Show command implementation.

use super::{open_target, standard_codec};
use crate::cli::ShowArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the show command.
pub fn execute_show(args: ShowArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    println!("{}", render_show(&args, config, formatter)?);
    Ok(())
}

/// Build the show output.
pub fn render_show(args: &ShowArgs, config: &Config, formatter: &Formatter) -> Result<String> {
    let codec = standard_codec();
    let node = open_target(&args.target, config, &codec)?;
    let value = node.load(codec.formats(), args.data_hint.as_deref())?;
    formatter.format_value(&value, args.limit)
}

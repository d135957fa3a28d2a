//! Describe command implementation.

use super::{open_target, standard_codec};
use crate::cli::DescribeArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use trove_domain::TransformRegistry;
use trove_store::LoadOptions;

/// Execute the describe command.
pub fn execute_describe(args: DescribeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    println!("{}", render_describe(&args, config, formatter)?);
    Ok(())
}

/// Build the describe output.
pub fn render_describe(args: &DescribeArgs, config: &Config, formatter: &Formatter) -> Result<String> {
    let codec = standard_codec();
    let node = open_target(&args.target, config, &codec)?;
    if !node.is_bundle() {
        return Err(CliError::InvalidInput(format!(
            "{} is not a bundle; describe needs a bundle directory",
            node.path().display()
        )));
    }

    if args.code {
        // Transforms are never resolved here, only their recorded text is shown.
        let chain = codec.load(node.path(), &TransformRegistry::new(), &LoadOptions::metadata_only())?;
        return Ok(chain.code_listing().trim_end().to_string());
    }
    formatter.format_bundle_info(&codec.info(node.path())?)
}

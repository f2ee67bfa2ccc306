//! fob-postbuild - declarations and UMD wrapping for a finished fob build.

use clap::Parser;
use fob_postbuild_cli::{cli, logger, run};
use miette::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    if args.no_color {
        miette::set_hook(Box::new(|_| {
            Box::new(miette::MietteHandlerOpts::new().color(false).build())
        }))?;
    }

    let outcome = run::execute(args).await?;
    info!(
        "Done: {} entry point(s) tracked, {} warning(s)",
        outcome.tracked, outcome.warnings
    );
    Ok(())
}

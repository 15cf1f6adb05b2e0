mod manifest;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use extra_files::additional_files::{Config, ExtraFilesConfig, Session};
use extra_files::{path_to_string_relative, print_bold, print_warning};

use crate::manifest::Manifest;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Copy or move additional album files along with imported tracks"
)]
struct Args {
    /// JSON manifest of copied and moved tracks. Read from stdin if not given.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    manifest: Option<PathBuf>,

    /// Use the given config file instead of the user config
    #[arg(short, long, name = "FILE", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Only print changes without copying or moving files
    #[arg(short, long)]
    print: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        extra_files::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        run(args)
    }
}

fn run(args: Args) -> Result<()> {
    let config = config_from_args(&args)?;
    if config.debug {
        println!("{config}");
    }

    let manifest_path = args
        .manifest
        .as_deref()
        .map(|path| extra_files::resolve_input_path(Some(path)))
        .transpose()?;
    let manifest = Manifest::read(manifest_path.as_deref())?;
    if manifest.is_empty() {
        print_warning!("No track operations in manifest");
        return Ok(());
    }

    let mut session = Session::new(&config);
    let recorded = manifest.record_into(&mut session);
    if config.verbose {
        let source = manifest_path.as_deref().map_or_else(|| "stdin".to_string(), path_to_string_relative);
        println!("Recorded {recorded} track operations from {source}");
    }

    let report = session.finish();
    if report.has_failures() {
        print_warning!("Finished with failures: {report}");
        anyhow::bail!("Some additional files could not be processed");
    }
    print_bold!("Finished: {report}");
    Ok(())
}

/// Combine the config file with command line overrides.
fn config_from_args(args: &Args) -> Result<Config> {
    let mut user_config = match &args.config {
        Some(path) => ExtraFilesConfig::from_path(path)?,
        None => ExtraFilesConfig::get_user_config()?,
    };
    user_config.debug |= args.debug;
    user_config.dryrun |= args.print;
    user_config.verbose |= args.verbose;
    Config::from_user_config(user_config)
}

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

mod commands;

/// Package every addon into a versioned release and update the package index
#[derive(Parser)]
#[command(name = "release")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Release version (e.g., 1.2.3); must match ^\d{1,4}(\.\d{1,4}(\.\d{1,6})?)?$
    #[arg(value_name = "VERSION")]
    release_version: String,

    /// Project root containing the addons directory (defaults to current directory)
    #[arg(long)]
    project_root: Option<String>,

    /// Log more detail to stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    if let Err(e) = commands::release::run(cli.release_version, cli.project_root) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

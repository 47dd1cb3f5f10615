//! Latency Prober - Main CLI Application
//!
//! Probes every target in parallel, ranks them by mean round-trip latency
//! and traces the network path to the slowest.

use clap::Parser;
use latency_prober::{
    app::App,
    cli::Cli,
    config::parser::load_config,
    error::{AppError, ErrorReporter, Result},
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        eprintln!("This is a bug; please report it together with the command line used.");
        process::exit(99);
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    if cli.should_show_topic_help() {
        println!("{}", cli.display_help());
        return;
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        eprintln!("{} v{}", PKG_NAME, VERSION);
        eprintln!("Debug mode enabled");
        eprintln!();
    }

    let config = load_config(cli)?;
    App::new(config).run().await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::NoTargetsSupplied => {
            eprintln!();
            eprintln!("Usage help:");
            eprintln!("  - Pass targets with --addresses 1.1.1.1,example.com");
            eprintln!("  - Or set TARGETS in the environment or a .env file");
            eprintln!("  - Run with --help-topic examples for more");
        }
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format");
            eprintln!("  - Targets must be IP addresses or hostnames");
            eprintln!("  - Run with --help-topic config for every supported variable");
        }
        AppError::Io(_) => {
            eprintln!();
            eprintln!("System troubleshooting:");
            eprintln!("  - Make sure 'ping' and 'traceroute' are installed and on your PATH");
            eprintln!("  - Some systems require extra privileges to send ICMP packets");
        }
        AppError::Internal(_) => {
            eprintln!();
            eprintln!("Rerun with --debug to capture more detail when reporting this issue.");
        }
        _ => {}
    }
}

mod cli;
mod logging;
mod state;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Init, Open, Seal, Version};

command_enum! {
    (Init, Init),
    (Seal, Seal),
    (Open, Open),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = cli::op::resolve_log_level(args.log_level.as_deref(), args.config_path.clone());
    let guard = match logging::init_logging(level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: {:#}", e);
            None
        }
    };

    let build = common::build_info!();
    tracing::debug!(
        version = build.version,
        repo_version = build.repo_version,
        build_profile = build.build_profile,
        "secrypt starting"
    );

    let ctx = cli::op::OpContext::new(args.config_path);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // flush the non-blocking writer before exiting
    drop(guard);
    std::process::exit(code);
}

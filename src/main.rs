use std::process;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use todo_svc::cli::commands::{Cli, Commands};
use todo_svc::cli;
use todo_svc::config::{self, Config, DEFAULT_LOG_FILTER, ENV_LOG};
use todo_svc::context::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli_args = Cli::parse();
    let json_output = cli_args.json;
    let home = config::resolve_home(cli_args.home.as_deref());
    let loaded = Config::load(&home);

    let log_filter = loaded.as_ref().map_or(DEFAULT_LOG_FILTER, |c| c.log_filter.as_str());
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(log_filter));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    // `init` must be able to run over a damaged config; it never rewrites it.
    let config = match (loaded, &cli_args.command) {
        (Ok(config), _) => config,
        (Err(e), Commands::Init) => {
            tracing::warn!(error = %e, "ignoring unreadable config");
            Config::default()
        }
        (Err(e), _) => process::exit(cli::report_error("config", &e, json_output)),
    };

    let ctx = Context::background();
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling in-flight work");
                ctx.cancel();
            }
        });
    }

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(&home, &config, json_output),
        Commands::Task(cmd) => cli::task::run(cmd, &ctx, &home, &config, json_output).await,
        Commands::Events => cli::events::run(&home, json_output).await,
    };

    process::exit(exit_code);
}

mod cli;
mod commands;

use dadddeck_api::output::render_error;
use dadddeck_api::{Config, DadDeckClient, RetryPolicy};
use log::{error, info};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let mut cmd = cli::build_cli();
    let matches = cmd.get_matches_mut();
    let log_level = matches.get_one::<String>("log-level").cloned();

    cli::init_logging(log_level.as_deref());

    if matches.get_flag("version") {
        println!("dadddeck {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }
    if matches.subcommand().is_none() {
        cmd.print_help()?;
        return Ok(ExitCode::from(2));
    }

    let client = match Config::from_env().and_then(DadDeckClient::new) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };
    info!("using API at {}", client.config().base_url);

    let ctx = commands::Ctx {
        client: &client,
        policy: RetryPolicy::default()
            .with_max_retries(matches.get_one::<u32>("max-retries").copied().unwrap_or(3)),
        include_rate: matches.get_flag("include-rate"),
    };

    let (out, code) = match commands::run(&ctx, &matches).await {
        Ok(v) => (v, ExitCode::SUCCESS),
        Err(e) => {
            error!("{}", e);
            (render_error(&e), ExitCode::FAILURE)
        }
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(code)
}

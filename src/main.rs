use clap::Parser;
use linkfetch::utils::error::ErrorCategory;
use linkfetch::utils::logger;
use linkfetch::{CliArgs, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    tracing::debug!("config: {:?}", config);
    tracing::info!(
        "max {} urls/request, {} requests, {} fetches/request, {}s fetch timeout",
        config.max_count_urls,
        config.max_requests,
        config.max_outcome_requests,
        config.max_outcome_timeout
    );

    let server = Server::new(config)?;
    if let Err(e) = server.start_with_shutdown(shutdown_signal()).await {
        tracing::error!("server error, stop app: {}", e);
        let code = match e.category() {
            ErrorCategory::Configuration => 2,
            _ => 1,
        };
        std::process::exit(code);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("interrupt signal");
}

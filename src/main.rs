//! houseprice: house price classification CLI and services

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use houseprice::cli::{self, Cli, Commands, GatewayArgs, ServeArgs};
use houseprice::server::{run_gateway, run_server, GatewayConfig, ServerConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("houseprice=info,tower_http=info")),
        )
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Preprocess(args) => cli::preprocess::run_preprocess(args),
        Commands::Train(args) => cli::train::run_train(args),
        Commands::Evaluate(args) => cli::evaluate::run_evaluate(args),
        Commands::Predict(args) => cli::predict::run_predict(args),
        Commands::Pipeline(args) => cli::pipeline::run_pipeline(args),
        Commands::Serve(args) => runtime()?.block_on(run_server(server_config(args))),
        Commands::Gateway(args) => runtime()?.block_on(run_gateway(gateway_config(args))),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// Environment defaults, overridden by any flag given
fn server_config(args: &ServeArgs) -> ServerConfig {
    let mut config = ServerConfig::default();
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if let Some(test_data) = &args.test_data {
        config.test_data_path = test_data.clone();
    }
    config
}

fn gateway_config(args: &GatewayArgs) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = &args.model_url {
        config.model_url = url.clone();
    }
    config
}

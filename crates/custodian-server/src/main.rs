//! `custodian` command-line tool

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use custodian_kernel::{init_tracing, InventoryConfig, StoreBackend};
use custodian_model::{QrCodec, RequesterContext, UserId};
use custodian_server::{serve, ResolverState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("custodian")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Asset inventory resolver and tools")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .global(true)
                .value_parser(["memory", "mock", "file"])
                .help("Store backend (overrides configuration)"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Snapshot file; selects the file backend"),
        )
        .arg(
            Arg::new("tenant")
                .long("tenant")
                .global(true)
                .help("Tenant to serve or inspect"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP asset resolver")
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .value_parser(value_parser!(SocketAddr))
                        .help("Listen address (overrides configuration)"),
                ),
        )
        .subcommand(
            Command::new("qr")
                .about("Print the QR payload for an asset")
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .required(true)
                        .help("Asset tag"),
                ),
        )
        .subcommand(
            Command::new("decode")
                .about("Decode a scanned payload to an asset id")
                .arg(Arg::new("payload").required(true).help("Payload text")),
        )
        .subcommand(Command::new("export").about("Print the tenant's assets as documents"))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<InventoryConfig> {
    let path = matches.get_one::<PathBuf>("config");
    let mut config = InventoryConfig::load(path.map(PathBuf::as_path))
        .with_context(|| format!("loading configuration from {path:?}"))?;

    if let Some(backend) = matches.get_one::<String>("backend") {
        config = config.with_backend(match backend.as_str() {
            "mock" => StoreBackend::Mock,
            "file" => StoreBackend::File,
            _ => StoreBackend::Memory,
        });
    }
    if let Some(store) = matches.get_one::<PathBuf>("store") {
        config = config.with_store_path(store.clone());
    }
    if let Some(tenant) = matches.get_one::<String>("tenant") {
        config = config.with_tenant(tenant.clone());
    }
    config.validate()?;
    Ok(config)
}

/// Operator session in the configured tenant
fn cli_requester(config: &InventoryConfig) -> RequesterContext {
    RequesterContext::user(config.resolver_tenant(), UserId::new("cli"), "cli")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"))?;
    let mut config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("serve", args)) => {
            if let Some(bind) = args.get_one::<SocketAddr>("bind") {
                config = config.with_bind(*bind);
            }
            let state = Arc::new(ResolverState::from_config(&config).await?);
            serve(state, config.resolver.bind, shutdown_signal()).await?;
        }
        Some(("qr", args)) => {
            let tag = args.get_one::<String>("tag").context("missing --tag")?;
            let handle = config.build_handle().await?;
            let requester = cli_requester(&config);
            let asset = handle.find_by_tag(&requester, tag).await?;
            let payload = handle.qr_payload(&requester, asset.id).await?;
            println!("{}", payload.to_text()?);
        }
        Some(("decode", args)) => {
            let payload = args
                .get_one::<String>("payload")
                .context("missing payload")?;
            let id = QrCodec::decode(payload)?;
            println!("{id}");
        }
        Some(("export", _)) => {
            let handle = config.build_handle().await?;
            let snapshot = handle.export_snapshot(&cli_requester(&config)).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}

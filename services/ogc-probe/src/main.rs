//! OGC capabilities probe.
//!
//! Negotiates a WMS or WMTS endpoint and prints, as JSON:
//! - the layers it advertises
//! - the map layer configuration derived for one of them
//! - a thumbnail GetMap URL for a WMS layer

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use capabilities::{Capabilities, CapabilitiesOptions, OverviewOptions};
use wms_protocol::ServiceType;

use config::{parse_key_value, Profile, RequestOverrides};

#[derive(Parser, Debug)]
#[command(name = "ogc-probe")]
#[command(about = "Probe OGC WMS/WMTS capabilities and derived layer parameters")]
struct Args {
    /// YAML profile with client settings, projections and request defaults
    #[arg(long, env = "OGC_PROBE_PROFILE")]
    profile: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the layers of a capabilities endpoint
    Layers {
        /// Endpoint URL, query parameters allowed
        url: String,

        /// Service type when the URL does not carry one (WMS or WMTS)
        #[arg(long)]
        service: Option<String>,
    },

    /// Derive the map layer configuration of one layer
    Config {
        url: String,
        layer: String,

        #[arg(long)]
        service: Option<String>,

        /// Preferred protocol version
        #[arg(long)]
        version: Option<String>,

        /// Preferred projection, repeatable in order of preference
        #[arg(long = "projection")]
        projections: Vec<String>,

        /// Fail instead of falling back when no preferred projection fits
        #[arg(long)]
        strict_projection: bool,

        /// Wanted extent in lon/lat: minx,miny,maxx,maxy
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,

        #[arg(long = "style")]
        styles: Vec<String>,

        #[arg(long = "format")]
        formats: Vec<String>,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// WMTS tile matrix set
        #[arg(long)]
        matrix_set: Option<String>,

        /// Extra request parameter, KEY=VALUE, repeatable
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// Build a thumbnail GetMap URL for a WMS layer
    Overview {
        url: String,
        layer: String,

        #[arg(long = "projection")]
        projections: Vec<String>,

        #[arg(long, default_value = "256")]
        width: u32,

        #[arg(long, default_value = "256")]
        height: u32,
    },
}

fn service_arg(service: Option<&str>) -> Result<Option<ServiceType>> {
    service
        .map(|s| s.parse::<ServiceType>())
        .transpose()
        .context("Invalid --service")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout stays valid JSON
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    info!("Starting OGC capabilities probe");

    let profile = Profile::load_optional(args.profile.as_deref())?;
    let client = Capabilities::new(&profile.client_config(), profile.registry())
        .context("Failed to create capabilities client")?;

    match args.command {
        Command::Layers { url, service } => {
            let mut options = CapabilitiesOptions::from_url(&url)?;
            if let Some(service) = service_arg(service.as_deref())? {
                options = options.with_service(service);
            }
            let layers = client.list_layers(&options.version_chain()).await?;
            info!(count = layers.len(), url = %url, "Listed layers");
            print_json(&layers, args.pretty)?;
        }

        Command::Config {
            url,
            layer,
            service,
            version,
            projections,
            strict_projection,
            bbox,
            styles,
            formats,
            width,
            height,
            matrix_set,
            params,
        } => {
            let overrides = RequestOverrides {
                url,
                layer,
                service,
                version,
                projections,
                strict_projection,
                bbox,
                styles,
                formats,
                width,
                height,
                matrix_set,
                params,
            };
            let request = profile.layer_request(&overrides.to_value())?;
            let configuration = client
                .layer_configuration(&request)
                .await
                .with_context(|| format!("Failed to configure layer {}", request.layer))?;
            info!(
                layer = %request.layer,
                projection = %configuration.projection.code,
                "Derived layer configuration"
            );
            print_json(&configuration, args.pretty)?;
        }

        Command::Overview {
            url,
            layer,
            projections,
            width,
            height,
        } => {
            let options = CapabilitiesOptions::from_url(&url)?.with_service(ServiceType::Wms);
            let overview = OverviewOptions {
                projections,
                width: Some(width),
                height: Some(height),
                ..Default::default()
            };
            let href = client
                .overview_url(&options.version_chain(), &layer, &overview)
                .await?;
            println!("{}", href);
        }
    }

    let stats = client.caches().responses.stats().await;
    info!(
        hits = stats.hits,
        misses = stats.misses,
        "Probe finished"
    );

    Ok(())
}

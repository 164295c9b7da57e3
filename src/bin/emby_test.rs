// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Emby server connection test tool

use clap::{Arg, ArgAction, Command};
use emby_latest_media::APP_VERSION;
use emby_latest_media::client::{EmbyClient, MediaServerApi, install_crypto_provider};
use emby_latest_media::configuration::{Settings, check_cfg_values, load_configuration};
use futures::future::join_all;
use std::str::FromStr;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    let cfg = parse_args_load_cfg()?;
    install_crypto_provider();
    let client = EmbyClient::new(&cfg.emby, cfg.sensor.episodes)?;

    let views = client.fetch_categories(&cfg.emby.user_id).await?;
    println!("{}: {} library views", client.host(), views.len());

    let supported: Vec<_> = views
        .iter()
        .filter_map(|view| view.kind().map(|kind| (view, kind)))
        .collect();
    for view in views.iter().filter(|view| view.kind().is_none()) {
        println!(
            "- {} ({}): unsupported collection type {:?}",
            view.name, view.id, view.collection_type
        );
    }

    let results = join_all(
        supported
            .iter()
            .map(|(view, _)| client.fetch_items(&view.id, cfg.sensor.max)),
    )
    .await;

    for ((view, kind), result) in supported.iter().zip(results) {
        match result {
            Ok(items) => {
                println!(
                    "- {} ({}) [{}]: {} latest items",
                    view.name,
                    view.id,
                    kind.label(),
                    items.len()
                );
                for item in items {
                    println!(
                        "    {:?} {}: {} {}",
                        item.media_type,
                        item.id,
                        item.series_name.as_deref().unwrap_or_default(),
                        item.name.as_deref().unwrap_or_default()
                    );
                }
            }
            Err(e) => println!("- {} ({}): request failed: {e}", view.name, view.id),
        }
    }

    Ok(())
}

fn parse_args_load_cfg() -> anyhow::Result<Settings> {
    let args = Command::new("emby-test")
        .author("Unfolded Circle ApS")
        .version(APP_VERSION)
        .about("Emby server communication test")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file"),
        )
        .arg(
            Arg::new("host")
                .short('H')
                .help("Emby server host name or address (overrides configuration)"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .help("Emby server port (overrides configuration)"),
        )
        .arg(
            Arg::new("api_key")
                .short('k')
                .help("Emby API key (overrides configuration)"),
        )
        .arg(
            Arg::new("user_id")
                .short('u')
                .help("User identifier for the library views (overrides configuration)"),
        )
        .arg(
            Arg::new("ssl")
                .long("ssl")
                .action(ArgAction::SetTrue)
                .help("Use https"),
        )
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let cfg_file = args.get_one::<String>("config").map(|c| c.as_str());
    let mut cfg = load_configuration(cfg_file)?;
    if let Some(host) = args.get_one::<String>("host") {
        cfg.emby.host = host.clone();
    }
    if let Some(port) = args.get_one::<String>("port") {
        cfg.emby.port = u16::from_str(port)?;
    }
    if let Some(api_key) = args.get_one::<String>("api_key") {
        cfg.emby.set_api_key(api_key);
    }
    if let Some(user_id) = args.get_one::<String>("user_id") {
        cfg.emby.user_id = user_id.clone();
    }
    if args.get_flag("ssl") {
        cfg.emby.ssl = true;
    }

    Ok(check_cfg_values(cfg)?)
}

// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

#![forbid(non_ascii_idents)]
#![deny(unsafe_code)]

use std::path::Path;
use std::rc::Rc;

use actix::{Actor, Context, Handler};
use clap::{Command, arg};
use emby_latest_media::client::{EmbyClient, install_crypto_provider};
use emby_latest_media::configuration::{DEF_CONFIG_FILE, get_configuration};
use emby_latest_media::sensor::{Entity, SensorSnapshot};
use emby_latest_media::{APP_VERSION, Controller, SensorUpdate, Subscribe, built_info, setup_sensors};
use log::{error, info, warn};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    let args = Command::new(built_info::PKG_NAME)
        .author("Unfolded Circle Aps")
        .version(APP_VERSION)
        .about("Latest added Emby media as sensor entities")
        .arg(arg!(-c --config <FILE> "Configuration file").required(false))
        .arg(arg!(--once "Refresh all sensors once, print their states and exit"))
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg_file = match args.get_one::<String>("config") {
        None => {
            if Path::new(DEF_CONFIG_FILE).exists() {
                info!("Loading default configuration file: {}", DEF_CONFIG_FILE);
                Some(DEF_CONFIG_FILE)
            } else {
                None
            }
        }
        Some(c) => Some(c.as_str()),
    };
    let cfg = get_configuration(cfg_file)?;
    info!("{} {}: {}", built_info::PKG_NAME, APP_VERSION, cfg.emby);

    install_crypto_provider();
    let client = Rc::new(EmbyClient::new(&cfg.emby, cfg.sensor.episodes)?);
    let mut sensors = setup_sensors(client, &cfg.emby.user_id, &cfg.sensor).await;
    if sensors.is_empty() {
        anyhow::bail!("No sensors available: check the Emby server connection and configuration");
    }

    if args.get_flag("once") {
        for sensor in sensors.iter_mut() {
            if let Err(e) = sensor.refresh().await {
                warn!("[{}] refresh failed: {e}", sensor.entity_id());
            }
            print_snapshot(&sensor.snapshot());
        }
        return Ok(());
    }

    let printer = SnapshotPrinter.start();
    let controller = Controller::new(sensors, cfg.sensor.scan_interval).start();
    controller.send(Subscribe(printer.recipient())).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}

fn print_snapshot(snapshot: &SensorSnapshot) {
    match serde_json::to_string(snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("[{}] can't serialize sensor state: {e}", snapshot.entity_id),
    }
}

/// Prints every published sensor state as a JSON line on stdout.
struct SnapshotPrinter;

impl Actor for SnapshotPrinter {
    type Context = Context<Self>;
}

impl Handler<SensorUpdate> for SnapshotPrinter {
    type Result = ();

    fn handle(&mut self, msg: SensorUpdate, _ctx: &mut Self::Context) {
        print_snapshot(&msg.0);
    }
}

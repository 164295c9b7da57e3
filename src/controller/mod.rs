// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Sensor scheduling with an Actix actor.
//!
//! The controller owns all sensor entities, refreshes them on a fixed interval and publishes the
//! new states to its subscribers.

mod handler;
mod messages;

pub use messages::*;

use crate::client::MediaServerApi;
use crate::sensor::{LatestMediaSensor, SensorSnapshot};
use actix::prelude::{Actor, Context, Recipient};
use actix::AsyncContext;
use log::{debug, info};
use std::time::Duration;

pub struct Controller<C: MediaServerApi + 'static> {
    /// Sensor entities. Empty while a refresh cycle is running.
    sensors: Vec<LatestMediaSensor<C>>,
    /// Sensor states of the last completed refresh cycle.
    snapshots: Vec<SensorSnapshot>,
    scan_interval: Duration,
    subscribers: Vec<Recipient<SensorUpdate>>,
    refreshing: bool,
}

impl<C: MediaServerApi + 'static> Controller<C> {
    pub fn new(sensors: Vec<LatestMediaSensor<C>>, scan_interval: Duration) -> Self {
        let snapshots = sensors.iter().map(|s| s.snapshot()).collect();
        Self {
            sensors,
            snapshots,
            scan_interval,
            subscribers: Vec::new(),
            refreshing: false,
        }
    }

    /// Send the current sensor states to all subscribers.
    fn publish(&self) {
        for subscriber in &self.subscribers {
            self.send_snapshots(subscriber);
        }
    }

    fn send_snapshots(&self, subscriber: &Recipient<SensorUpdate>) {
        for snapshot in &self.snapshots {
            subscriber.do_send(SensorUpdate(snapshot.clone()));
        }
    }
}

impl<C: MediaServerApi + 'static> Actor for Controller<C> {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "Starting {} sensors with scan interval {:?}",
            self.sensors.len(),
            self.scan_interval
        );
        // initial update before the first interval elapses
        ctx.notify(RefreshSensors);
        ctx.run_interval(self.scan_interval, |_act, ctx| {
            debug!("Scan interval elapsed");
            ctx.notify(RefreshSensors);
        });
    }
}

// Copyright (c) 2023 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handler for the sensor refresh cycle.

use crate::client::MediaServerApi;
use crate::controller::{Controller, RefreshSensors};
use crate::sensor::Entity;
use actix::{ActorFutureExt, Handler, ResponseActFuture, WrapFuture, fut};
use log::{debug, info, warn};

impl<C: MediaServerApi + 'static> Handler<RefreshSensors> for Controller<C> {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, _msg: RefreshSensors, _ctx: &mut Self::Context) -> Self::Result {
        if self.refreshing {
            debug!("Sensor refresh already in progress, ignoring request");
            return Box::pin(fut::ready(()));
        }
        self.refreshing = true;

        // sensors are moved into the future and handed back once all refreshes completed
        let mut sensors = std::mem::take(&mut self.sensors);

        Box::pin(
            async move {
                for sensor in sensors.iter_mut() {
                    if let Err(e) = sensor.refresh().await {
                        warn!("[{}] Refresh failed: {e}", sensor.entity_id());
                    }
                }
                sensors
            }
            .into_actor(self) // converts future to ActorFuture
            .map(|sensors, act, _ctx| {
                info!("Refreshed {} sensors", sensors.len());
                act.snapshots = sensors.iter().map(|s| s.snapshot()).collect();
                act.sensors = sensors;
                act.refreshing = false;
                act.publish();
            }),
        )
    }
}

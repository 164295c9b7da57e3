// Copyright (c) 2023 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix message handlers for sensor state subscribers.

use crate::client::MediaServerApi;
use crate::controller::{Controller, GetSensorStates, Subscribe};
use actix::{Handler, MessageResult};

impl<C: MediaServerApi + 'static> Handler<Subscribe> for Controller<C> {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _ctx: &mut Self::Context) -> Self::Result {
        self.send_snapshots(&msg.0);
        self.subscribers.push(msg.0);
    }
}

impl<C: MediaServerApi + 'static> Handler<GetSensorStates> for Controller<C> {
    type Result = MessageResult<GetSensorStates>;

    fn handle(&mut self, _msg: GetSensorStates, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.snapshots.clone())
    }
}

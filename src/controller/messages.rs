// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Actix actor message definitions used to communicate with the [`Controller`].

#[allow(unused_imports)] // used for doc links
use crate::controller::Controller;
use crate::sensor::SensorSnapshot;
use actix::prelude::{Message, Recipient};

/// Refresh all sensor entities.
///
/// Sent by the scan interval timer. A refresh request is ignored while a refresh cycle is still
/// running.
#[derive(Debug, Default, Message)]
#[rtype(result = "()")]
pub struct RefreshSensors;

/// Updated sensor state after a refresh cycle.
///
/// Sent to all subscribers, one message per sensor entity. Sending is best-effort only!
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct SensorUpdate(pub SensorSnapshot);

/// Subscribe to sensor updates.
///
/// The subscriber immediately receives the current state of all sensors.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe(pub Recipient<SensorUpdate>);

/// Retrieve the state of all sensors from the last completed refresh cycle.
#[derive(Debug, Default, Message)]
#[rtype(result = "Vec<SensorSnapshot>")]
pub struct GetSensorStates;

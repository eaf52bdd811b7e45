// Vario - a soaring information receiver for the Open Glider Network
// Copyright (C) 2026  The Vario Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use super::*;
use std::thread::{spawn, JoinHandle};
use sensor::ogn::vehicle_type_name;
use serde_json;
use ws;

pub struct WebSocket {
    ws_broadcaster: ws::Sender,
    _handle: JoinHandle<()>,
}

impl WebSocket {
    pub fn new(addr: String) -> Box<Self> {
        // spawn WS thread

        let socket = ws::WebSocket::new(|_| {
            move |_| {
                panic!("This server cannot receive messages, it only sends them.")
            }
        }).expect("Unable to create WebSocket");

        let ws_broadcaster = socket.broadcaster();

        let handle = spawn(move || { socket.listen(addr).expect("Unable to run WebSocket."); });
        debug!("spawned WebSocket thread");

        Box::new(Self {
                     _handle: handle,
                     ws_broadcaster,
                 })
    }

    fn broadcast(&self, js: serde_json::Value) {
        if let Err(e) = self.ws_broadcaster.send(js.to_string()) {
            error!("WebSocket broadcast failed: {}", e);
        }
    }
}

impl Protocol for WebSocket {
    fn run(&mut self, _handle: &mut dyn Pushable<Payload>, i: ChainedIter) {
        for r in i {
            match *r {
                Report::Aircraft(ref id, ref acft) => {
                    let mut js = serde_json::to_value(acft).unwrap();
                    js["type"] = "Aircraft".into();
                    js["id"] = id.clone().into();
                    js["vehicle_type_name"] = vehicle_type_name(acft.vehicle_type).into();

                    self.broadcast(js);
                }
                Report::Station(ref name, ref stat) => {
                    let mut js = serde_json::to_value(stat).unwrap();
                    js["type"] = "Station".into();
                    js["name"] = name.clone().into();

                    self.broadcast(js);
                }
                Report::Thermal(ref th) => {
                    let mut js = serde_json::to_value(th).unwrap();
                    js["type"] = "Thermal".into();

                    self.broadcast(js);
                }
            }
        }
    }
}

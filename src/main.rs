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

#[macro_use]
extern crate log;
extern crate chrono;
extern crate env_logger;
extern crate nom;
extern crate reqwest;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate ws;

#[macro_use]
mod utils;
mod processor;
mod protocol;
mod sensor;
mod transport;
mod vario;

use processor::Processor;
use sensor::ogn;
use vario::Vario;

fn main() {
    env_logger::init();

    let mut v = Vario::new(10); // 10 Hz

    v.link_sensor(Box::new(ogn::feed::OgnFeed::new(
        ogn::DEFAULT_HOST,
        ogn::DEFAULT_SERVICE,
        "", // no filter, worldwide
    )));

    v.link_processor(Box::new(processor::traffic::Traffic::new()) as Box<dyn Processor>);
    v.link_processor(Box::new(processor::station::Stations::new()) as Box<dyn Processor>);
    v.link_processor(processor::thermal::ThermalDetector::new());

    v.link_protocol(protocol::text::Text::new());
    v.link_protocol(protocol::websocket::WebSocket::new(
        "0.0.0.0:9001".to_string(),
    ));

    v.link_transport(transport::udp::UDP::new());

    v.run();
}

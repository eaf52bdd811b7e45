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

//! Delivers rendered text lines to consumers over UDP.

use super::*;
use std::io::ErrorKind;
use std::net::UdpSocket;

/// Consumers of the text stream
const CLIENTS: [&str; 1] = ["127.0.0.1:4353"];
// maximum UDP payload size without fragmentation in Ethernet environment
const UDP_MAX_SIZE: usize = 1472;

pub struct UDP {
    socket: UdpSocket,
}

impl UDP {
    pub fn new() -> Box<dyn Transport> {
        let socket = UdpSocket::bind("0.0.0.0:0").expect("can not bind UDP socket");
        socket
            .set_nonblocking(true)
            .expect("could not set socket to non blocking mode");

        Box::new(UDP { socket })
    }

    fn send_to_all_clients(&self, buffer: &[u8]) {
        for client in CLIENTS.iter() {
            if let Err(e) = self.socket.send_to(buffer, client) {
                match e.kind() {
                    ErrorKind::WouldBlock => warn!("UDP send overwhelming buffers"),
                    ErrorKind::ConnectionRefused => trace!("client {} not listening", client),
                    _ => error!("UDP send failed: {}", e),
                }
            }
        }
    }
}

impl Transport for UDP {
    fn run(&mut self, _handle: &mut dyn Handle, i: ChainedIter) {
        let mut buffer = Vec::with_capacity(UDP_MAX_SIZE);

        for p in i {
            if buffer.len() + p.payload.len() > UDP_MAX_SIZE {
                self.send_to_all_clients(&buffer);
                buffer.clear();
            }

            buffer.extend(p.payload.iter());
        }

        if !buffer.is_empty() {
            self.send_to_all_clients(&buffer);
        }
    }
}

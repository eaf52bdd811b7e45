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

//! The live OGN feed: APRS-IS connection, login and line reader.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{sleep, spawn, JoinHandle};
use std::time::Duration;

use super::aprs;
use super::ddb::DdbCache;
use super::{DEFAULT_DDB_QUERY_INTERVAL, DEFAULT_DDB_URL, DEFAULT_USERNAME};
use sensor::{Sensor, SensorData};
use vario::handle::Pushable;

const RECONNECT_DELAY: Duration = Duration::from_secs(30);

pub struct OgnFeed {
    ddb: DdbCache,
    rx: Receiver<String>,
    _handle: JoinHandle<()>,
}

impl OgnFeed {
    /// Connects to the given OGN host and starts reading the feed.
    /// The reader runs on its own thread and reconnects after a delay
    /// on socket errors; the feed is best effort.
    ///
    /// Filter syntax: r/lat/lon/range, e.g. r/47/8/500.  Empty for
    /// worldwide access.
    pub fn new(host: &str, service: &str, filter: &str) -> Self {
        let (tx, rx) = channel();
        let addr = format!("{}:{}", host, service);
        let filter = filter.to_string();

        let handle = spawn(move || reader_thread(&addr, &filter, &tx));

        OgnFeed {
            ddb: DdbCache::new(DEFAULT_DDB_QUERY_INTERVAL, Some(DEFAULT_DDB_URL)),
            rx,
            _handle: handle,
        }
    }
}

fn reader_thread(addr: &str, filter: &str, tx: &Sender<String>) {
    loop {
        match feed_lines(addr, filter, tx) {
            // the receiving side hung up, we are shutting down
            Ok(()) => return,
            Err(e) => {
                error!("OGN feed from {} failed: {}, reconnecting in {}s",
                       addr,
                       e,
                       RECONNECT_DELAY.as_secs());
                sleep(RECONNECT_DELAY);
            }
        }
    }
}

/// Connects, logs in and forwards lines until the socket or the
/// receiving side goes away.  Ok means the receiver hung up.
fn feed_lines(addr: &str, filter: &str, tx: &Sender<String>) -> io::Result<()> {
    let stream = TcpStream::connect(addr)?;
    login(&stream, DEFAULT_USERNAME, filter)?;
    info!("connected to OGN at {}", addr);

    let reader = BufReader::new(stream);
    for line in reader.lines() {
        if tx.send(line?).is_err() {
            return Ok(());
        }
    }

    Err(io::Error::new(io::ErrorKind::UnexpectedEof, "feed closed"))
}

/// Logs into APRS-IS.  Read-only clients use the -1 passcode; the
/// server banner and logresp arrive as comment lines on the feed.
fn login(mut stream: &TcpStream, username: &str, filter: &str) -> io::Result<()> {
    let mut line = format!("user {} pass -1 vers vario {}",
                           username,
                           env!("CARGO_PKG_VERSION"));
    if !filter.is_empty() {
        line.push_str(" filter ");
        line.push_str(filter);
    }
    line.push_str("\r\n");

    stream.write_all(line.as_bytes())?;
    stream.flush()
}

impl Sensor for OgnFeed {
    fn run(&mut self, h: &mut dyn Pushable<SensorData>) {
        let utc = h.get_utc().timestamp() as f64;

        for line in self.rx.try_iter() {
            if line.starts_with('#') {
                trace!("server: {}", line);
                continue;
            }

            if let Some((id, mut acft)) = aprs::parse_aprs_aircraft(&line, utc) {
                self.ddb.apply(&id, &mut acft);
                h.push_data(SensorData::Aircraft(id, acft));
            } else if let Some((name, stat)) = aprs::parse_aprs_station(&line, utc) {
                h.push_data(SensorData::Station(name, stat));
            } else {
                debug!("unparsed line: {}", line);
            }
        }
    }
}

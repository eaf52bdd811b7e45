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

//! The OGN Device Database: callsign, type and privacy policy per
//! device id, refreshed in the background.
//!
//! The DDB export is line oriented:
//!
//! ```text
//! #DEVICE_TYPE,DEVICE_ID,AIRCRAFT_MODEL,REGISTRATION,CN,TRACKED,IDENTIFIED
//! 'F','DD8E12','ASK 21','D-1234','X2','Y','Y'
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{spawn, JoinHandle};
use std::time::Duration;

use super::{AircraftRxInfo, IdType, VehicleData, unqualified_id, DEFAULT_DDB_URL};

/// Vehicle database type, keyed by the unqualified id, i.e. just the
/// 6 hex digits.
pub type VehicleDb = HashMap<String, VehicleData>;

#[derive(Debug)]
enum Error {
    Io(io::Error),
    Http(reqwest::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "{}", e),
            Error::Http(ref e) => write!(f, "{}", e),
        }
    }
}

/// Reads the registry document.  A source starting with "http" is
/// fetched over HTTP, anything else is read as a local file.
fn fetch_text(url: &str) -> Result<String, Error> {
    if url.starts_with("http") {
        let response = reqwest::blocking::get(url)?.error_for_status()?;
        Ok(response.text()?)
    } else {
        Ok(fs::read_to_string(url)?)
    }
}

/// One row of the DDB export.
fn parse_row(line: &str) -> Option<(String, VehicleData)> {
    let mut fields = line.split(',').map(|f| f.trim().trim_matches('\''));

    let device_type = fields.next()?;
    let device_id = fields.next()?;
    let model = fields.next()?;
    let registration = fields.next()?;
    let cn = fields.next()?;
    let tracked = fields.next()?;
    let identified = fields.next()?;

    if device_id.len() != 6 || !device_id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let data = VehicleData {
        name1: registration.to_string(),
        name2: cn.to_string(),
        model: model.to_string(),
        tracking: tracked == "Y",
        identify: identified == "Y",
        id_type: IdType::from_ddb(device_type),
    };

    Some((device_id.to_string(), data))
}

/// Parses a DDB export document.  Comment lines and malformed rows are
/// skipped.
pub fn parse_vehicle_database(text: &str) -> VehicleDb {
    let mut db = VehicleDb::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_row(line) {
            Some((id, data)) => {
                db.insert(id, data);
            }
            None => debug!("skipping malformed DDB row: {}", line),
        }
    }

    db
}

/// Gets the vehicle database from the OGN DDB with optional URL or
/// local file path.  Doesn't fail: errors are logged and yield an
/// empty database.
pub fn get_vehicle_database(url: &str) -> VehicleDb {
    match fetch_text(url) {
        Ok(text) => parse_vehicle_database(&text),
        Err(e) => {
            error!("vehicle database fetch from {} failed: {}", url, e);
            VehicleDb::new()
        }
    }
}

/// The active vehicle database plus its background refresh cycle.
///
/// Lookups and swaps share one mutex, held only for the duration of
/// the map operation; fetching and parsing happen outside of it into a
/// private database that is installed afterwards.  Dropping the cache
/// wakes, stops and joins the refresh thread.
pub struct DdbCache {
    vdb: Arc<Mutex<VehicleDb>>,
    stop: Option<Sender<()>>,
    query_thread: Option<JoinHandle<()>>,
}

impl DdbCache {
    /// If `query_interval` > 0 [s], starts a thread that re-queries
    /// the DDB at that interval.  If `initial_vdb` is given, it is
    /// loaded synchronously; a failed load logs and starts with an
    /// empty database, which is a valid state.
    pub fn new(query_interval: f64, initial_vdb: Option<&str>) -> Self {
        let vdb = Arc::new(Mutex::new(VehicleDb::new()));

        if let Some(source) = initial_vdb {
            let db = get_vehicle_database(source);
            if db.is_empty() {
                warn!("initial vehicle database from {} is empty, starting without one",
                      source);
            } else {
                info!("loaded {} vehicle database entries from {}", db.len(), source);
                *vdb.lock().unwrap() = db;
            }
        }

        let (stop, query_thread) = if query_interval > 0.0 {
            let (tx, rx) = channel();
            let interval = Duration::from_secs_f64(query_interval);
            let shared = vdb.clone();

            let handle = spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let db = get_vehicle_database(DEFAULT_DDB_URL);
                        if db.is_empty() {
                            warn!("DDB query returned no entries, keeping the previous database");
                        } else {
                            info!("installing {} vehicle database entries", db.len());
                            *shared.lock().unwrap() = db;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            });

            (Some(tx), Some(handle))
        } else {
            (None, None)
        };

        DdbCache {
            vdb,
            stop,
            query_thread,
        }
    }

    /// Force replacement of the vehicle database.  A no-op for an
    /// empty `new_db`, so a bad fetch can never downgrade a good
    /// registry.
    pub fn set_vdb(&self, new_db: VehicleDb) {
        if new_db.is_empty() {
            return;
        }
        *self.vdb.lock().unwrap() = new_db;
    }

    /// Sets callsign, type and privacy flags on the record from its
    /// id.  Ids the database does not know keep the decoder defaults.
    pub fn apply(&self, id: &str, acft: &mut AircraftRxInfo) {
        if let Some(entry) = self.vdb.lock().unwrap().get(unqualified_id(id)) {
            acft.data = entry.clone();
        }
    }

    pub fn len(&self) -> usize {
        self.vdb.lock().unwrap().len()
    }
}

impl Drop for DdbCache {
    fn drop(&mut self) {
        // disconnecting the channel wakes the thread at its next
        // recv_timeout
        self.stop.take();
        if let Some(handle) = self.query_thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\
#DEVICE_TYPE,DEVICE_ID,AIRCRAFT_MODEL,REGISTRATION,CN,TRACKED,IDENTIFIED
'F','DD8E12','ASK 21','D-1234','X2','Y','Y'
'I','3D28CB','LS 4','D-5678','2B','Y','N'
'O','000001','Paraglider','','','N','N'
this is not a row
'F','XYZ','bad id','','','Y','Y'
";

    #[test]
    fn test_parse_vehicle_database() {
        let db = parse_vehicle_database(EXPORT);
        assert_eq!(db.len(), 3);

        let entry = &db["DD8E12"];
        assert_eq!(entry.name1, "D-1234");
        assert_eq!(entry.name2, "X2");
        assert_eq!(entry.model, "ASK 21");
        assert!(entry.tracking);
        assert!(entry.identify);
        assert_eq!(entry.id_type, IdType::Flarm);

        let entry = &db["3D28CB"];
        assert_eq!(entry.id_type, IdType::Icao);
        assert!(entry.tracking);
        assert!(!entry.identify);

        let entry = &db["000001"];
        assert!(!entry.tracking);
    }

    #[test]
    fn test_apply_sets_vehicle_data() {
        let cache = DdbCache::new(0.0, None);
        cache.set_vdb(parse_vehicle_database(EXPORT));

        let mut acft = AircraftRxInfo::default();
        cache.apply("icao:3D28CB", &mut acft);
        assert_eq!(acft.data.name1, "D-5678");
        assert_eq!(acft.data.name2, "2B");
        assert!(!acft.data.identify);
    }

    #[test]
    fn test_apply_unknown_id_keeps_defaults() {
        let cache = DdbCache::new(0.0, None);
        cache.set_vdb(parse_vehicle_database(EXPORT));

        let mut acft = AircraftRxInfo::default();
        cache.apply("flarm:ABCDEF", &mut acft);
        assert_eq!(acft.data, VehicleData::default());
    }

    #[test]
    fn test_empty_replacement_is_a_noop() {
        let cache = DdbCache::new(0.0, None);
        cache.set_vdb(parse_vehicle_database(EXPORT));
        assert_eq!(cache.len(), 3);

        cache.set_vdb(VehicleDb::new());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_missing_file_yields_empty_database() {
        let db = get_vehicle_database("/nonexistent/ddb.txt");
        assert!(db.is_empty());
    }

    #[test]
    fn test_teardown_joins_refresh_thread() {
        // must return without waiting out the interval
        let cache = DdbCache::new(3600.0, None);
        drop(cache);
    }
}

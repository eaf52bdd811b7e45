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

//! Maintains the traffic situation around us and enforces the OGN
//! privacy policy, cf. http://wiki.glidernet.org/opt-in-opt-out

use super::*;
use std::collections::HashMap;
use std::time::Instant;
use sensor::ogn::hide_id;

const CLEANUP_FREQ: f32 = 0.1;
const MAX_STALE_SECS: u64 = 300;
/// Trailing id digits to redact for devices that opted out of
/// identification
const HIDE_DIGITS: usize = 4;

pub struct Traffic {
    situation: HashMap<String, (AircraftRxInfo, Instant)>,
    cleanup_counter: u32,
}

impl Traffic {
    pub fn new() -> Self {
        // 100 should be a good start
        Self {
            situation: HashMap::with_capacity(100),
            cleanup_counter: 0,
        }
    }
}

impl Processor for Traffic {
    fn run(&mut self, handle: &mut dyn Pushable<Report>, i: ChainedIter) {
        let clock = handle.get_clock();

        for e in i {
            match *e {
                SensorData::Aircraft(ref id, ref acft) => {
                    if !acft.process {
                        // theoretically, no-track packets never show
                        // up on the feed in the first place
                        warn!("discarding no-track packet received by {}",
                              acft.rx.received_by);
                        continue;
                    }

                    if !acft.data.tracking {
                        debug!("tracking disabled for {}",
                               hide_id(id, HIDE_DIGITS, '0'));
                        continue;
                    }

                    self.situation.insert(id.clone(), (acft.clone(), clock));

                    let public_id = if acft.data.identify {
                        id.clone()
                    } else {
                        hide_id(id, HIDE_DIGITS, '0')
                    };
                    handle.push_data(Report::Aircraft(public_id, acft.clone()));
                }
                _ => {}
            }
        }

        run_every!(CLEANUP_FREQ, self.cleanup_counter, handle, {
            debug!("clean up traffic map");

            self.situation
                .retain(|_, v| (clock - v.1).as_secs() < MAX_STALE_SECS);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor::ogn::IdType;
    use std::collections::VecDeque;
    use vario::handle::{BasicHandle, PushableHandle};

    fn aircraft(identify: bool, tracking: bool, process: bool) -> SensorData {
        let mut acft = AircraftRxInfo::default();
        acft.id_type = IdType::Icao;
        acft.data.identify = identify;
        acft.data.tracking = tracking;
        acft.process = process;
        SensorData::Aircraft("icao:3D28CB".to_string(), acft)
    }

    fn run_one(input: &[SensorData]) -> VecDeque<Report> {
        let mut p = Traffic::new();
        let mut q = VecDeque::new();
        let mut b = BasicHandle::new(10);
        {
            let mut h = PushableHandle::new(&mut b, &mut q);
            let empty: [SensorData; 0] = [];
            p.run(&mut h, input.iter().chain(empty.iter()));
        }
        q
    }

    #[test]
    fn test_identified_aircraft_keeps_its_id() {
        let q = run_one(&[aircraft(true, true, true)]);
        assert_eq!(q.len(), 1);
        match q[0] {
            Report::Aircraft(ref id, _) => assert_eq!(id, "icao:3D28CB"),
            _ => panic!("expected an aircraft report"),
        }
    }

    #[test]
    fn test_unidentified_aircraft_is_redacted() {
        let q = run_one(&[aircraft(false, true, true)]);
        assert_eq!(q.len(), 1);
        match q[0] {
            Report::Aircraft(ref id, _) => assert_eq!(id, "icao:3D0000"),
            _ => panic!("expected an aircraft report"),
        }
    }

    #[test]
    fn test_untracked_aircraft_is_dropped() {
        let q = run_one(&[aircraft(true, false, true)]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_no_track_packet_is_dropped() {
        let q = run_one(&[aircraft(true, true, false)]);
        assert!(q.is_empty());
    }
}

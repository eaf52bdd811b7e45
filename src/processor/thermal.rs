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

//! Thermal detection from tracked aircraft movement.
//!
//! Climbing aircraft mark rising air.  Detections are blended into a
//! sparse grid of one-byte cells that decays over time, compact enough
//! to cover a wide geographic area and to ship to renderers.

use super::*;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use sensor::ogn::{PositionTime, VEHICLE_TYPE_GLIDER};

/// Standard gravity [m/s^2]
const STANDARD_GRAVITY: f64 = 9.80665;

/// Tile edge length [degrees]; about 1.1 km north/south
const TILE_SIZE_DEG: f64 = 0.01;

/// Age the grid once a minute: a cell fades from fresh to gone in
/// about seven minutes without new observations
const AGE_FREQ: f32 = 1.0 / 60.0;
const CLEANUP_FREQ: f32 = 0.1;
/// Forget per-device history older than this [s]
const MAX_PREVIOUS_SECS: u64 = 300;

/// Parameters for thermal detection from tracked gliders
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct ThermalDetectorParams {
    /// Method.  0 == don't detect,
    /// 1 = single point, 2 = two points (potential altitude difference)
    pub method: i32,

    /// Thermal marker size [tiles]
    pub dot_size: i32,

    /// Maximum time delta between two points to consider for the PA
    /// difference method [s]
    pub max_time_delta: f64,

    /// Only consider aircraft slower than this speed [m/s].
    /// That would include most paragliders and hang gliders
    pub max_speed: f64,

    /// Minimum turn rate to detect a thermal [degrees/s], only for
    /// gliders
    pub min_turnrate_glider: f64,

    /// Minimum climb rate to consider [m/s]
    pub min_climbrate: f64,
}

impl Default for ThermalDetectorParams {
    fn default() -> ThermalDetectorParams {
        ThermalDetectorParams {
            method: 2,
            dot_size: 1,
            max_time_delta: 12.0,
            max_speed: 30.0,
            min_turnrate_glider: 6.0,
            min_climbrate: 0.5,
        }
    }
}

impl ThermalDetectorParams {
    /// Panics on out-of-range values: bad parameters are a caller
    /// bug, not bad input.
    pub fn validate(&self) {
        assert!(0 <= self.method && self.method <= 2,
                "thermal detection method must be 0, 1 or 2");
        assert!(self.dot_size >= 1, "dot_size must be >= 1");
        assert!(self.max_time_delta > 0.0, "max_time_delta must be > 0");
        assert!(self.max_speed > 0.0, "max_speed must be > 0");
        assert!(self.min_turnrate_glider > 0.0,
                "min_turnrate_glider must be > 0");
        assert!(self.min_climbrate > 0.0, "min_climbrate must be > 0");
    }
}

/// A detected thermal: position and time of the measurement, measured
/// aircraft climb rate [m/s].
#[derive(Debug, PartialEq, Copy, Clone, Serialize)]
pub struct Thermal {
    pub pt: PositionTime,
    pub climbrate: f64,
}

// Write data, format: time lat lon alt climbrate
impl fmt::Display for Thermal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "{:.0} {:.6} {:.6} {:.1} {:.2}",
               self.pt.time,
               self.pt.lat,
               self.pt.lon,
               self.pt.alt,
               self.climbrate)
    }
}

/// Returns a hash-comment line with the thermal output format, for
/// file consumers.
pub fn thermal_format_comment() -> &'static str {
    "# thermal: time lat lon alt climbrate"
}

/// Small footprint aggregator for one grid tile: a freshness counter
/// and a quantized climb rate in a single byte.
///
/// Validity lives in bits 5-7 (0 = no information, 7 = recent) and
/// strength in bits 0-4 (0..=31 in steps of 0.2 m/s).  Masked integer
/// storage rather than bit fields keeps the layout portable.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize)]
pub struct ThermalAggregator(u8);

impl ThermalAggregator {
    pub fn new() -> ThermalAggregator {
        ThermalAggregator(0)
    }

    pub fn validity(&self) -> u8 {
        self.0 >> 5
    }

    pub fn strength(&self) -> u8 {
        self.0 & 0x1f
    }

    fn set(&mut self, validity: u8, strength: u8) {
        self.0 = (validity & 0x07) << 5 | (strength & 0x1f);
    }

    /// Aggregated climb rate [m/s]
    pub fn climbrate(&self) -> f64 {
        f64::from(self.strength()) * 0.2
    }

    /// Display opacity: 0 for no information, 1 for fresh
    pub fn alpha(&self) -> f64 {
        f64::from(self.validity()) / 7.0
    }

    /// Blends an observation in and marks the cell fresh.  The blend
    /// weight follows the cell age: stale cells take the new value,
    /// fresh cells smooth it.
    pub fn update(&mut self, th: &Thermal) {
        let a = f64::from(self.validity()) / 7.0;
        let b = 1.0 - a;

        let th_strength = th.climbrate * 5.0;
        let new_strength = (a * f64::from(self.strength()) + b * th_strength)
            .max(0.0)
            .min(31.9999);

        self.set(7, new_strength as u8);
    }

    /// Ages the cell one step; returns whether it still holds
    /// information.
    pub fn age(&mut self) -> bool {
        let v = self.validity();
        if v > 0 {
            self.set(v - 1, self.strength());
        }
        self.validity() > 0
    }
}

/// Tile coordinate: latitude/longitude quantized to `TILE_SIZE_DEG`
pub type TileCoordinate = (i32, i32);

pub type ThermalTileset = HashMap<TileCoordinate, ThermalAggregator>;

pub fn tile_coordinate(lat: f64, lon: f64) -> TileCoordinate {
    ((lat / TILE_SIZE_DEG).floor() as i32, (lon / TILE_SIZE_DEG).floor() as i32)
}

/// Blends a thermal into the dot_size x dot_size block of tiles around
/// its position, creating tiles as needed.
pub fn update_tileset(params: &ThermalDetectorParams,
                      tiles: &mut ThermalTileset,
                      th: &Thermal) {
    let (lat0, lon0) = tile_coordinate(th.pt.lat, th.pt.lon);
    let offset = (params.dot_size - 1) / 2;

    for dlat in 0..params.dot_size {
        for dlon in 0..params.dot_size {
            let coord = (lat0 + dlat - offset, lon0 + dlon - offset);
            tiles.entry(coord)
                .or_insert_with(ThermalAggregator::new)
                .update(th);
        }
    }
}

/// True if the record passes the climb rate and flight profile gates.
fn thermal_conditions(params: &ThermalDetectorParams,
                      current: &AircraftRxInfo,
                      climbrate: f64)
                      -> bool {
    if climbrate < params.min_climbrate {
        return false;
    }

    let circling = current.vehicle_type == VEHICLE_TYPE_GLIDER
        && current.mot.turnrate.abs() >= params.min_turnrate_glider;

    // slow aircraft (paragliders, hang gliders) thermal without
    // meeting glider turn rates
    circling || current.mot.speed <= params.max_speed
}

/// Detects a thermal based on a single record; the climb rate is the
/// current vertical speed.  Returns None if no thermal is detected.
pub fn detect_thermal_single(params: &ThermalDetectorParams,
                             current: &AircraftRxInfo)
                             -> Option<Thermal> {
    if params.method == 0 {
        return None;
    }

    let climbrate = current.mot.vspeed;
    if thermal_conditions(params, current, climbrate) {
        Some(Thermal {
            pt: current.pta.pt,
            climbrate,
        })
    } else {
        None
    }
}

/// Detects a thermal based on the current and previous record of a
/// device.  Works by comparing potential altitudes
/// PA = A + v^2 / 2g, where v includes the vertical speed, so a glider
/// trading speed for altitude in a pull-up is not mistaken for climb.
///
/// With no previous record, with method 1, or with records further
/// apart than max_time_delta, falls back to the single point method on
/// the current record alone.
pub fn detect_thermal(params: &ThermalDetectorParams,
                      current: &AircraftRxInfo,
                      previous: Option<&AircraftRxInfo>)
                      -> Option<Thermal> {
    if params.method == 0 {
        return None;
    }

    let previous = match previous {
        Some(p) if params.method == 2 => p,
        _ => return detect_thermal_single(params, current),
    };

    let dt = current.pta.pt.time - previous.pta.pt.time;
    if dt <= 0.0 || dt > params.max_time_delta {
        return detect_thermal_single(params, current);
    }

    let climbrate = (potential_altitude(current) - potential_altitude(previous)) / dt;
    if thermal_conditions(params, current, climbrate) {
        Some(Thermal {
            pt: current.pta.pt,
            climbrate,
        })
    } else {
        None
    }
}

fn potential_altitude(acft: &AircraftRxInfo) -> f64 {
    let v2 = acft.mot.speed * acft.mot.speed + acft.mot.vspeed * acft.mot.vspeed;
    acft.pta.pt.alt + v2 / (2.0 * STANDARD_GRAVITY)
}

/// Detects thermals from the aircraft stream and aggregates them into
/// the tile grid.  Keeps the last record per device; the detection
/// functions themselves are stateless.
pub struct ThermalDetector {
    params: ThermalDetectorParams,
    tiles: ThermalTileset,
    previous: HashMap<String, (AircraftRxInfo, Instant)>,
    age_counter: u32,
    cleanup_counter: u32,
}

impl ThermalDetector {
    pub fn new() -> Box<ThermalDetector> {
        ThermalDetector::with_params(ThermalDetectorParams::default())
    }

    pub fn with_params(params: ThermalDetectorParams) -> Box<ThermalDetector> {
        params.validate();

        Box::new(ThermalDetector {
            params,
            tiles: ThermalTileset::new(),
            previous: HashMap::with_capacity(100),
            age_counter: 0,
            cleanup_counter: 0,
        })
    }

    /// The current aggregation grid, for renderers.
    pub fn tiles(&self) -> &ThermalTileset {
        &self.tiles
    }
}

impl Processor for ThermalDetector {
    fn run(&mut self, handle: &mut dyn Pushable<Report>, i: ChainedIter) {
        let clock = handle.get_clock();

        if self.params.method == 0 {
            return;
        }

        for e in i {
            match *e {
                SensorData::Aircraft(ref id, ref acft) => {
                    if !acft.process {
                        continue;
                    }

                    let detected = {
                        let previous = self.previous.get(id).map(|v| &v.0);
                        detect_thermal(&self.params, acft, previous)
                    };

                    if let Some(th) = detected {
                        update_tileset(&self.params, &mut self.tiles, &th);
                        handle.push_data(Report::Thermal(th));
                    }

                    self.previous.insert(id.clone(), (acft.clone(), clock));
                }
                _ => {}
            }
        }

        run_every!(AGE_FREQ, self.age_counter, handle, {
            self.tiles.retain(|_, cell| cell.age());
            debug!("aged thermal grid, {} live tiles", self.tiles.len());
        });

        run_every!(CLEANUP_FREQ, self.cleanup_counter, handle, {
            self.previous
                .retain(|_, v| (clock - v.1).as_secs() < MAX_PREVIOUS_SECS);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor::ogn::VEHICLE_TYPE_POWER_PLANE;

    fn glider(time: f64, alt: f64, speed: f64, vspeed: f64, turnrate: f64) -> AircraftRxInfo {
        let mut acft = AircraftRxInfo::default();
        acft.vehicle_type = VEHICLE_TYPE_GLIDER;
        acft.pta.pt = PositionTime {
            lat: 47.0005,
            lon: 8.0005,
            alt,
            time,
        };
        acft.mot.speed = speed;
        acft.mot.vspeed = vspeed;
        acft.mot.turnrate = turnrate;
        acft
    }

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_single_point_detects_circling_glider() {
        let params = ThermalDetectorParams::default();
        let acft = glider(0.0, 1000.0, 35.0, 2.0, 10.0);

        let th = detect_thermal_single(&params, &acft).unwrap();
        assert!(close(th.climbrate, 2.0, 1e-9));
        assert_eq!(th.pt, acft.pta.pt);
    }

    #[test]
    fn test_single_point_detects_slow_aircraft_without_turning() {
        let params = ThermalDetectorParams::default();
        let mut acft = glider(0.0, 1000.0, 12.0, 1.5, 0.0);
        acft.vehicle_type = VEHICLE_TYPE_POWER_PLANE;

        assert!(detect_thermal_single(&params, &acft).is_some());
    }

    #[test]
    fn test_single_point_rejects_fast_straight_flight() {
        let params = ThermalDetectorParams::default();
        // fast and not turning: lift is likely a line of energy, not a
        // usable thermal marker
        let acft = glider(0.0, 1000.0, 45.0, 2.0, 1.0);

        assert!(detect_thermal_single(&params, &acft).is_none());
    }

    #[test]
    fn test_single_point_rejects_weak_climb() {
        let params = ThermalDetectorParams::default();
        let acft = glider(0.0, 1000.0, 25.0, 0.2, 10.0);

        assert!(detect_thermal_single(&params, &acft).is_none());
    }

    #[test]
    fn test_two_point_reports_effective_climb() {
        let params = ThermalDetectorParams::default();
        let previous = glider(0.0, 1000.0, 25.0, 2.0, 10.0);
        let current = glider(5.0, 1010.0, 25.0, 2.0, 10.0);

        let th = detect_thermal(&params, &current, Some(&previous)).unwrap();
        // equal speeds, so the PA difference is the altitude difference
        assert!(close(th.climbrate, 2.0, 1e-6));
    }

    #[test]
    fn test_two_point_cancels_energy_trade() {
        let params = ThermalDetectorParams::default();

        // pull-up: 40 -> 20 m/s while climbing, potential altitude
        // stays the same
        let previous = glider(0.0, 1000.0, 40.0, 0.0, 10.0);
        let pa = 1000.0 + 1600.0 / (2.0 * STANDARD_GRAVITY);
        let current_alt = pa - (20.0 * 20.0 + 3.0 * 3.0) / (2.0 * STANDARD_GRAVITY);
        let current = glider(5.0, current_alt, 20.0, 3.0, 10.0);

        assert!(detect_thermal(&params, &current, Some(&previous)).is_none());
        // the single point method would have been fooled
        assert!(detect_thermal_single(&params, &current).is_some());
    }

    #[test]
    fn test_two_point_falls_back_on_stale_previous() {
        let params = ThermalDetectorParams::default();
        let previous = glider(0.0, 1000.0, 25.0, 2.0, 10.0);
        let current = glider(params.max_time_delta + 8.0, 1400.0, 25.0, 2.0, 10.0);

        assert_eq!(detect_thermal(&params, &current, Some(&previous)),
                   detect_thermal_single(&params, &current));
    }

    #[test]
    fn test_method_one_ignores_previous() {
        let mut params = ThermalDetectorParams::default();
        params.method = 1;
        let previous = glider(0.0, 1000.0, 25.0, 2.0, 10.0);
        let current = glider(5.0, 1010.0, 25.0, 2.0, 10.0);

        assert_eq!(detect_thermal(&params, &current, Some(&previous)),
                   detect_thermal_single(&params, &current));
    }

    #[test]
    fn test_method_zero_detects_nothing() {
        let mut params = ThermalDetectorParams::default();
        params.method = 0;
        let acft = glider(0.0, 1000.0, 25.0, 3.0, 10.0);

        assert!(detect_thermal(&params, &acft, None).is_none());
    }

    #[test]
    #[should_panic(expected = "dot_size")]
    fn test_invalid_params_panic() {
        let mut params = ThermalDetectorParams::default();
        params.dot_size = 0;
        params.validate();
    }

    fn thermal(climbrate: f64) -> Thermal {
        Thermal {
            pt: PositionTime {
                lat: 47.0005,
                lon: 8.0005,
                alt: 1200.0,
                time: 0.0,
            },
            climbrate,
        }
    }

    #[test]
    fn test_aggregator_takes_first_observation() {
        let mut ag = ThermalAggregator::new();
        assert_eq!(ag.validity(), 0);
        assert!(close(ag.alpha(), 0.0, 1e-9));

        ag.update(&thermal(2.0));
        assert_eq!(ag.validity(), 7);
        assert_eq!(ag.strength(), 10);
        assert!(close(ag.climbrate(), 2.0, 1e-9));
        assert!(close(ag.alpha(), 1.0, 1e-9));
    }

    #[test]
    fn test_aggregator_clamps_strength() {
        let mut ag = ThermalAggregator::new();
        ag.update(&thermal(50.0));
        assert_eq!(ag.strength(), 31);
        assert!(close(ag.climbrate(), 6.2, 1e-9));
    }

    #[test]
    fn test_aggregator_blends_by_age() {
        let mut ag = ThermalAggregator::new();
        ag.update(&thermal(2.0));

        // a fresh cell ignores the new value entirely
        ag.update(&thermal(0.0));
        assert_eq!(ag.strength(), 10);

        // three ticks old: 4/7 of the old value remains
        for _ in 0..3 {
            assert!(ag.age());
        }
        assert_eq!(ag.validity(), 4);
        ag.update(&thermal(0.0));
        assert_eq!(ag.strength(), (4.0 / 7.0 * 10.0) as u8);
        assert_eq!(ag.validity(), 7);
    }

    #[test]
    fn test_aggregator_ages_to_invalid() {
        let mut ag = ThermalAggregator::new();
        ag.update(&thermal(2.0));

        for _ in 0..6 {
            assert!(ag.age());
        }
        assert!(!ag.age());
        assert_eq!(ag.validity(), 0);
        assert!(close(ag.alpha(), 0.0, 1e-9));

        // aging an empty cell stays dead
        assert!(!ag.age());

        // but a new observation revives it
        ag.update(&thermal(1.0));
        assert_eq!(ag.validity(), 7);
        assert!(close(ag.climbrate(), 1.0, 1e-9));
    }

    #[test]
    fn test_update_tileset_creates_and_prunes_cells() {
        let params = ThermalDetectorParams::default();
        let mut tiles = ThermalTileset::new();

        update_tileset(&params, &mut tiles, &thermal(2.0));
        assert_eq!(tiles.len(), 1);
        let cell = tiles[&tile_coordinate(47.0005, 8.0005)];
        assert!(close(cell.climbrate(), 2.0, 1e-9));

        for _ in 0..7 {
            tiles.retain(|_, cell| cell.age());
        }
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_update_tileset_paints_dot_size_block() {
        let mut params = ThermalDetectorParams::default();
        params.dot_size = 3;
        let mut tiles = ThermalTileset::new();

        update_tileset(&params, &mut tiles, &thermal(2.0));
        assert_eq!(tiles.len(), 9);
    }

    #[test]
    fn test_detector_processor_reports_thermals() {
        use std::collections::VecDeque;
        use vario::handle::{BasicHandle, PushableHandle};

        let mut p = ThermalDetector::new();
        let first = SensorData::Aircraft("flarm:DF48A3".to_string(),
                                         glider(0.0, 1000.0, 25.0, 2.0, 10.0));
        let second = SensorData::Aircraft("flarm:DF48A3".to_string(),
                                          glider(5.0, 1010.0, 25.0, 2.0, 10.0));

        let mut q = VecDeque::new();
        let mut b = BasicHandle::new(10);
        {
            let mut h = PushableHandle::new(&mut b, &mut q);
            let input = [first, second];
            let empty: [SensorData; 0] = [];
            p.run(&mut h, input.iter().chain(empty.iter()));
        }

        // both records detect: the first single point, the second two
        // point
        assert_eq!(q.len(), 2);
        assert_eq!(p.tiles().len(), 1);
        match q[1] {
            Report::Thermal(ref th) => assert!(close(th.climbrate, 2.0, 1e-6)),
            _ => panic!("expected a thermal report"),
        }
    }
}

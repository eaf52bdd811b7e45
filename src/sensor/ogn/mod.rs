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

//! Open Glider Network data model and device identifier utilities.
//!
//! References:
//! - http://wiki.glidernet.org/wiki:subscribe-to-ogn-data
//! - http://wiki.glidernet.org/opt-in-opt-out
//! - http://www.aprs-is.net/q.aspx (qAS, qAC, qAR, ...)

pub mod aprs;
pub mod ddb;
pub mod feed;

use std::fmt;

/// The default host/service (port) to connect to OGN.  Port 10152
/// serves the full feed and does not require a filter.
pub const DEFAULT_HOST: &str = "aprs.glidernet.org";
pub const DEFAULT_SERVICE: &str = "10152";
/// Read-only clients log in as user "0" with the -1 passcode.
pub const DEFAULT_USERNAME: &str = "0";

pub const DEFAULT_DDB_URL: &str = "http://ddb.glidernet.org/download/";
/// Query the DDB every 600 seconds
pub const DEFAULT_DDB_QUERY_INTERVAL: f64 = 600.0;

// FLARM aircraft types, cf. the FLARM dataport manual
pub const VEHICLE_TYPE_GLIDER: u8 = 1;
pub const VEHICLE_TYPE_TOW_PLANE: u8 = 2;
pub const VEHICLE_TYPE_HELICOPTER: u8 = 3;
pub const VEHICLE_TYPE_PARACHUTE: u8 = 4;
pub const VEHICLE_TYPE_DROP_PLANE: u8 = 5;
pub const VEHICLE_TYPE_DELTA: u8 = 6;
pub const VEHICLE_TYPE_PARAGLIDER: u8 = 7;
pub const VEHICLE_TYPE_POWER_PLANE: u8 = 8;
pub const VEHICLE_TYPE_JET: u8 = 9;
pub const VEHICLE_TYPE_UFO: u8 = 10;
pub const VEHICLE_TYPE_BALLOON: u8 = 11;
pub const VEHICLE_TYPE_AIRSHIP: u8 = 12;
pub const VEHICLE_TYPE_UAV: u8 = 13;
// 14 not assigned
pub const VEHICLE_TYPE_STATIC: u8 = 15;

/// Human readable FLARM aircraft type, for display layers.
pub fn vehicle_type_name(vehicle_type: u8) -> &'static str {
    match vehicle_type {
        VEHICLE_TYPE_GLIDER => "glider",
        VEHICLE_TYPE_TOW_PLANE => "tow plane",
        VEHICLE_TYPE_HELICOPTER => "helicopter",
        VEHICLE_TYPE_PARACHUTE => "parachute",
        VEHICLE_TYPE_DROP_PLANE => "drop plane",
        VEHICLE_TYPE_DELTA => "hang glider",
        VEHICLE_TYPE_PARAGLIDER => "paraglider",
        VEHICLE_TYPE_POWER_PLANE => "power plane",
        VEHICLE_TYPE_JET => "jet",
        VEHICLE_TYPE_UFO => "ufo",
        VEHICLE_TYPE_BALLOON => "balloon",
        VEHICLE_TYPE_AIRSHIP => "airship",
        VEHICLE_TYPE_UAV => "uav",
        VEHICLE_TYPE_STATIC => "static",
        _ => "unknown",
    }
}

/// Device address type.  FLARM random hopping, still?!
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
pub enum IdType {
    Random,
    Icao,
    Flarm,
    Ogn,
}

impl IdType {
    /// Address type from the low two bits of the APRS id flag byte.
    pub fn from_flags(flags: u8) -> IdType {
        match flags & 0x03 {
            1 => IdType::Icao,
            2 => IdType::Flarm,
            3 => IdType::Ogn,
            _ => IdType::Random,
        }
    }

    /// Address type from the device type letter of the DDB export.
    /// Unknown letters map to `Random`.
    pub fn from_ddb(letter: &str) -> IdType {
        match letter {
            "I" => IdType::Icao,
            "F" => IdType::Flarm,
            "O" => IdType::Ogn,
            _ => IdType::Random,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match *self {
            IdType::Random => "random",
            IdType::Icao => "icao",
            IdType::Flarm => "flarm",
            IdType::Ogn => "ogn",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Returns flarm:<id>, icao:<id> etc. depending on the id type.
pub fn qualified_id(id: &str, id_type: IdType) -> String {
    format!("{}:{}", id_type.prefix(), id)
}

/// Returns <id> for flarm:<id>, etc.  An id without a qualifier is
/// returned unchanged.
pub fn unqualified_id(id: &str) -> &str {
    match id.find(':') {
        Some(pos) => &id[pos + 1..],
        None => id,
    }
}

/// Replaces the last `n` digits of the unqualified part of `id` by
/// `replacement`, e.g. flarm:DF48A3 becomes flarm:DF0000 for n = 4.
/// An `n` beyond the id length replaces the whole id.
pub fn hide_id(id: &str, n: usize, replacement: char) -> String {
    let start = id.find(':').map(|pos| pos + 1).unwrap_or(0);
    let (prefix, raw) = id.split_at(start);

    let digits = raw.chars().count();
    let keep = digits.saturating_sub(n);

    let mut out = String::with_capacity(id.len());
    out.push_str(prefix);
    out.extend(raw.chars().take(keep));
    for _ in keep..digits {
        out.push(replacement);
    }
    out
}

/// A 4D point: geographic position plus time of measurement.
#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize)]
pub struct PositionTime {
    /// Latitude [degrees], north positive
    pub lat: f64,
    /// Longitude [degrees], east positive
    pub lon: f64,
    /// Altitude above MSL [m]
    pub alt: f64,
    /// UTC seconds since 00:00 January 1, 1970
    pub time: f64,
}

/// A 4D position with an accuracy estimate.
#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize)]
pub struct Fix {
    pub pt: PositionTime,
    /// Horizontal accuracy [m], 0 if unknown
    pub accuracy: f64,
}

/// 3D movement and turn rate.
#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize)]
pub struct MotionAndTurnrate {
    /// Ground speed [m/s]
    pub speed: f64,
    /// Course over ground [degrees]
    pub course: f64,
    /// Vertical speed [m/s], up positive
    pub vspeed: f64,
    /// Turn rate [degrees/s], right turn positive
    pub turnrate: f64,
}

/// OGN receiver station information.
#[derive(Debug, PartialEq, Clone, Default, Serialize)]
pub struct StationInfo {
    /// Name of network, e.g. GLIDERN1, GLIDERN2
    pub network: String,

    pub pt: PositionTime,

    /// CPU load (0...1)
    pub cpu: f64,

    /// RAM [megabyte]
    pub ram_used: f64,
    pub ram_max: f64,

    /// NTP offset [ms] and drift [ppm]
    pub ntp_difference: f64,
    pub ntp_ppm: f64,

    /// Temperature [degrees C]
    pub temperature: f64,

    /// Software version x.y.z
    pub version: String,
}

/// Aircraft data, valid long-term.  Typically read from the DDB.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct VehicleData {
    /// First name, typically callsign
    pub name1: String,

    /// Second name, typically competition number (for gliders)
    pub name2: String,

    /// Vehicle make/model (textual)
    pub model: String,

    /// Track this device.  If false, the device must not show up on
    /// online tracking services.
    pub tracking: bool,

    /// Identify this device.  If false, the id is redacted before
    /// anything is displayed or persisted.
    pub identify: bool,

    /// ID type from the DDB, entered by users.
    /// WARNING: often wrong, the wire id type is authoritative.
    pub id_type: IdType,
}

impl Default for VehicleData {
    fn default() -> VehicleData {
        VehicleData {
            name1: String::new(),
            name2: String::new(),
            model: String::new(),
            tracking: true,
            identify: false,
            id_type: IdType::Random,
        }
    }
}

/// Tracker hardware and software version
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Versions {
    pub hardware: String,
    pub software: String,
}

impl Default for Versions {
    fn default() -> Versions {
        Versions {
            hardware: "-".to_string(),
            software: "-".to_string(),
        }
    }
}

/// Radio signal reception information
#[derive(Debug, PartialEq, Clone, Default, Serialize)]
pub struct RxInfo {
    /// Received by (station name)
    pub received_by: String,

    /// Received signal strength indication [dB]
    pub rssi: f64,

    /// Frequency deviation [kHz], sign as transmitted
    pub frequency_deviation: f64,

    /// Bit errors (0e, 1e, ... field)
    pub errors: u16,

    /// Is this a relayed packet?
    pub is_relayed: bool,
}

/// One received aircraft position report.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct AircraftRxInfo {
    /// Address type from the wire
    pub id_type: IdType,

    /// 1-15: FLARM aircraft types
    pub vehicle_type: u8,

    /// Negation of the FLARM no-track flag.  Theoretically no packets
    /// with this set to false show up on the feed; they still decode,
    /// and dropping them is the consumer's decision.
    pub process: bool,

    /// Stealth mode: don't show up on other mobile devices.  Not
    /// relevant for online tracking.
    pub stealth: bool,

    /// HW/SW versions
    pub ver: Versions,

    /// Callsign, type, tracking flags from the DDB
    pub data: VehicleData,

    /// 4D position and accuracy
    pub pta: Fix,

    pub mot: MotionAndTurnrate,

    /// Barometric altitude above 1013.25 hPa [m]
    pub baro_alt: f64,

    /// RX info
    pub rx: RxInfo,
}

impl Default for AircraftRxInfo {
    fn default() -> AircraftRxInfo {
        AircraftRxInfo {
            id_type: IdType::Random,
            vehicle_type: VEHICLE_TYPE_GLIDER,
            process: true,
            stealth: false,
            ver: Versions::default(),
            data: VehicleData::default(),
            pta: Fix::default(),
            mot: MotionAndTurnrate::default(),
            baro_alt: 0.0,
            rx: RxInfo::default(),
        }
    }
}

/// Callsign of an aircraft record, "-" when the DDB knows none.
pub fn callsign(info: &AircraftRxInfo) -> &str {
    if info.data.name1.is_empty() {
        "-"
    } else {
        &info.data.name1
    }
}

// Write data, format: network time lat lon alt
impl fmt::Display for StationInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "{} {:.0} {:.6} {:.6} {:.1}",
               self.network,
               self.pt.time,
               self.pt.lat,
               self.pt.lon,
               self.pt.alt)
    }
}

// Write data, format: received_by rssi frequency_deviation
impl fmt::Display for RxInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "{} {:.1} {:.1}",
               self.received_by,
               self.rssi,
               self.frequency_deviation)
    }
}

// Write data, format: id_type callsign time lat lon alt course speed
// vspeed turn_rate rx_info
impl fmt::Display for AircraftRxInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pt = &self.pta.pt;
        write!(f,
               "{} {} {:.0} {:.6} {:.6} {:.1} {:.0} {:.1} {:.2} {:.1} {}",
               self.id_type,
               callsign(self),
               pt.time,
               pt.lat,
               pt.lon,
               pt.alt,
               self.mot.course,
               self.mot.speed,
               self.mot.vspeed,
               self.mot.turnrate,
               self.rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_id_round_trip() {
        for &id_type in &[IdType::Random, IdType::Icao, IdType::Flarm, IdType::Ogn] {
            let q = qualified_id("DF48A3", id_type);
            assert!(q.starts_with(id_type.prefix()));
            assert_eq!(unqualified_id(&q), "DF48A3");
        }
    }

    #[test]
    fn test_unqualified_id_without_prefix() {
        assert_eq!(unqualified_id("DF48A3"), "DF48A3");
    }

    #[test]
    fn test_hide_id() {
        assert_eq!(hide_id("flarm:DF48A3", 4, '0'), "flarm:DF0000");
        assert_eq!(hide_id("DF48A3", 4, '0'), "DF0000");
        assert_eq!(hide_id("DF48A3", 0, '0'), "DF48A3");
        // n beyond the id length replaces the whole id
        assert_eq!(hide_id("flarm:DF48A3", 10, 'x'), "flarm:xxxxxx");
        assert_eq!(hide_id("", 4, '0'), "");
    }

    #[test]
    fn test_hide_id_preserves_leading_digits() {
        let id = "icao:3D28CB";
        for n in 0..8 {
            let hidden = hide_id(id, n, '0');
            let raw = unqualified_id(&hidden);
            assert_eq!(raw.len(), 6);
            let keep = 6_usize.saturating_sub(n);
            assert_eq!(&raw[..keep], &"3D28CB"[..keep]);
            assert!(raw[keep..].chars().all(|c| c == '0'));
        }
    }

    #[test]
    fn test_id_type_from_flags() {
        assert_eq!(IdType::from_flags(0x05), IdType::Icao);
        assert_eq!(IdType::from_flags(0x06), IdType::Flarm);
        assert_eq!(IdType::from_flags(0x07), IdType::Ogn);
        assert_eq!(IdType::from_flags(0x04), IdType::Random);
    }

    #[test]
    fn test_aircraft_display_columns() {
        let mut acft = AircraftRxInfo::default();
        acft.id_type = IdType::Icao;
        acft.data.name1 = "D-1234".to_string();
        acft.rx.received_by = "EDMC".to_string();
        let line = format!("{}", acft);
        assert!(line.starts_with("icao D-1234 "));
        assert!(line.ends_with("EDMC 0.0 0.0"));
    }
}

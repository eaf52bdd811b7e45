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

//! APRS line decoding for the OGN feed.
//!
//! Example aircraft packet:
//!
//! ```text
//! ICA3D28CB>APRS,qAS,EDMC:/175426h4829.84N/01014.30E'353/122/A=002467 id053D28CB -078fpm +0.4rot 6.0dB 0e +2.3kHz gps2x2
//! ```
//!
//! Example receiver station packet:
//!
//! ```text
//! LFLO>APRS,TCPIP*,qAC,GLIDERN2:/175435h4603.32NI00359.99E&/A=001020 CPU:0.6 RAM:340.6/492.2MB NTP:0.6ms/-30.5ppm +67.0C
//! ```
//!
//! The feed is noisy.  The fixed-position head of a line (addresses,
//! time, position, course/speed, altitude) is parsed strictly since it
//! feeds safety-relevant consumers; everything behind it is scanned as
//! whitespace separated tokens and unknown tokens are ignored.
//!
//! References:
//! - ftp://ftp.tapr.org/aprssig/aprsspec/spec/aprs101/APRS101.pdf
//! - http://wiki.glidernet.org/wiki:ogn-flavoured-aprs

use nom::IResult;
use nom::bytes::complete::{tag, take, take_until};
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{map_res, verify};
use nom::sequence::tuple;

use super::{AircraftRxInfo, Fix, IdType, MotionAndTurnrate, PositionTime, RxInfo, StationInfo,
            VehicleData, Versions, qualified_id};

fn two_digit(i: &str) -> IResult<&str, u32> {
    map_res(take(2_usize), |s: &str| s.parse())(i)
}

fn three_digit(i: &str) -> IResult<&str, u32> {
    map_res(take(3_usize), |s: &str| s.parse())(i)
}

/// MM.MM, minutes with hundredths
fn minutes(i: &str) -> IResult<&str, f64> {
    map_res(take(5_usize), |s: &str| s.parse())(i)
}

/// ddmm.mm plus hemisphere, to degrees (south negative)
fn latitude(i: &str) -> IResult<&str, f64> {
    let (i, deg) = two_digit(i)?;
    let (i, min) = minutes(i)?;
    let (i, hemisphere) = one_of("NS")(i)?;

    let lat = f64::from(deg) + min / 60.0;
    Ok((i, if hemisphere == 'S' { -lat } else { lat }))
}

/// dddmm.mm plus hemisphere, to degrees (west negative)
fn longitude(i: &str) -> IResult<&str, f64> {
    let (i, deg) = three_digit(i)?;
    let (i, min) = minutes(i)?;
    let (i, hemisphere) = one_of("EW")(i)?;

    let lon = f64::from(deg) + min / 60.0;
    Ok((i, if hemisphere == 'W' { -lon } else { lon }))
}

/// HHMMSSh wire time as seconds into the day
fn day_seconds(i: &str) -> IResult<&str, u32> {
    let (i, (h, m, s)) = verify(tuple((two_digit, two_digit, two_digit)),
                                |&(h, m, s)| h < 24 && m < 60 && s < 60)(i)?;
    let (i, _) = char('h')(i)?;
    Ok((i, h * 3600 + m * 60 + s))
}

/// Source callsign and via path, up to and including the ":/" payload
/// marker.
fn head(i: &str) -> IResult<&str, (&str, &str)> {
    let (i, source) = take_until(">")(i)?;
    let (i, _) = char('>')(i)?;
    let (i, path) = take_until(":")(i)?;
    let (i, _) = tag(":/")(i)?;
    Ok((i, (source, path)))
}

/// Time, position, course/speed and altitude of an aircraft packet.
fn aircraft_body(i: &str) -> IResult<&str, (u32, f64, f64, u32, u32, u32)> {
    let (i, seconds) = day_seconds(i)?;
    let (i, lat) = latitude(i)?;
    let (i, _symbol_table) = take(1_usize)(i)?;
    let (i, lon) = longitude(i)?;
    let (i, _symbol) = take(1_usize)(i)?;
    let (i, course) = three_digit(i)?;
    let (i, _) = char('/')(i)?;
    let (i, speed) = three_digit(i)?;
    let (i, _) = tag("/A=")(i)?;
    let (i, alt_ft) = map_res(digit1, |s: &str| s.parse())(i)?;
    Ok((i, (seconds, lat, lon, course, speed, alt_ft)))
}

/// Time, position and altitude of a station packet.
fn station_body(i: &str) -> IResult<&str, (u32, f64, f64, u32)> {
    let (i, seconds) = day_seconds(i)?;
    let (i, lat) = latitude(i)?;
    let (i, _symbol_table) = take(1_usize)(i)?;
    let (i, lon) = longitude(i)?;
    let (i, _symbol) = take(1_usize)(i)?;
    let (i, _) = tag("/A=")(i)?;
    let (i, alt_ft) = map_res(digit1, |s: &str| s.parse())(i)?;
    Ok((i, (seconds, lat, lon, alt_ft)))
}

/// The via-path hop following the given q construct, e.g. the
/// receiving station name after "qAS".
fn via_station<'a>(path: &'a str, construct: &str) -> Option<&'a str> {
    let mut hops = path.split(',');
    while let Some(hop) = hops.next() {
        if hop == construct {
            return hops.next().filter(|s| !s.is_empty());
        }
    }
    None
}

/// Combines the in-day wire time with the calendar date implied by the
/// reference instant.  A negative reference leaves the date at
/// January 1st, 1970.
fn wire_time(day_seconds: u32, utc: f64) -> f64 {
    if utc >= 0.0 {
        let day = (utc as i64).div_euclid(86_400);
        (day * 86_400 + i64::from(day_seconds)) as f64
    } else {
        f64::from(day_seconds)
    }
}

/// Parses an APRS line containing aircraft info, converting units as
/// appropriate.  Returns the qualified device id and the record, or
/// None if the line does not match; a failed parse leaves nothing
/// behind.
///
/// If `utc` is >= 0, it must be UTC seconds since 00:00 January 1,
/// 1970; the date implied by it is attached to the (time-of-day only)
/// HHMMSS field.  Otherwise the date stays at January 1st, 1970.
pub fn parse_aprs_aircraft(line: &str, utc: f64) -> Option<(String, AircraftRxInfo)> {
    let (rest, (_source, path)) = head(line).ok()?;
    let received_by = via_station(path, "qAS")?;
    let is_relayed = path.split(',').any(|hop| hop.ends_with('*'));

    let (tail, (seconds, lat, lon, course, speed_kt, alt_ft)) = aircraft_body(rest).ok()?;

    let mut flags_and_id: Option<(u8, &str)> = None;
    let mut mot = MotionAndTurnrate {
        speed: kt_to_mps!(speed_kt),
        course: f64::from(course),
        vspeed: 0.0,
        turnrate: 0.0,
    };
    let mut rx = RxInfo {
        received_by: received_by.to_string(),
        is_relayed,
        ..Default::default()
    };
    let mut ver = Versions::default();
    let mut baro_alt = 0.0;

    for token in tail.split_whitespace() {
        if let Some(rest) = token.strip_prefix("id") {
            if rest.len() == 8 && rest.chars().all(|c| c.is_ascii_hexdigit()) {
                let flags = u8::from_str_radix(&rest[..2], 16).ok()?;
                flags_and_id = Some((flags, &rest[2..]));
            }
        } else if let Some(v) = token.strip_suffix("fpm") {
            if let Ok(v) = v.parse::<f64>() {
                mot.vspeed = fpm_to_mps!(v);
            }
        } else if let Some(v) = token.strip_suffix("rot") {
            if let Ok(v) = v.parse::<f64>() {
                mot.turnrate = rot_to_degps!(v);
            }
        } else if let Some(v) = token.strip_suffix("dB") {
            if let Ok(v) = v.parse::<f64>() {
                rx.rssi = v;
            }
        } else if let Some(v) = token.strip_suffix("kHz") {
            if let Ok(v) = v.parse::<f64>() {
                rx.frequency_deviation = v;
            }
        } else if let Some(v) = token.strip_suffix('e') {
            if let Ok(v) = v.parse::<u16>() {
                rx.errors = v;
            }
        } else if let Some(v) = token.strip_prefix("FL") {
            if let Ok(v) = v.parse::<f64>() {
                // flight level, hundreds of feet above 1013.25 hPa
                baro_alt = ft_to_m!(v * 100.0);
            }
        } else if let Some(v) = token.strip_prefix('s') {
            if v.chars().next().map_or(false, |c| c.is_ascii_digit()) {
                ver.software = v.to_string();
            }
        } else if token.len() == 3 && token.starts_with('h')
                  && token[1..].chars().all(|c| c.is_ascii_hexdigit()) {
            ver.hardware = token[1..].to_string();
        }
    }

    let (flags, raw_id) = flags_and_id?;
    let id_type = IdType::from_flags(flags);

    let acft = AircraftRxInfo {
        id_type,
        vehicle_type: (flags >> 2) & 0x0f,
        process: flags & 0x40 == 0,
        stealth: flags & 0x80 != 0,
        ver,
        data: VehicleData::default(),
        pta: Fix {
            pt: PositionTime {
                lat,
                lon,
                alt: ft_to_m!(alt_ft),
                time: wire_time(seconds, utc),
            },
            accuracy: 0.0,
        },
        mot,
        baro_alt,
        rx,
    };

    Some((qualified_id(raw_id, id_type), acft))
}

/// Parses an APRS line containing receiver station info.  Returns the
/// station name and the record, or None if the line does not match.
/// Only name, network, position and time are mandatory; CPU, RAM, NTP
/// and temperature are taken when present.
///
/// See `parse_aprs_aircraft` for the `utc` parameter.
pub fn parse_aprs_station(line: &str, utc: f64) -> Option<(String, StationInfo)> {
    let (rest, (source, path)) = head(line).ok()?;
    let network = via_station(path, "qAC")?;

    let (tail, (seconds, lat, lon, alt_ft)) = station_body(rest).ok()?;

    let mut stat = StationInfo {
        network: network.to_string(),
        pt: PositionTime {
            lat,
            lon,
            alt: ft_to_m!(alt_ft),
            time: wire_time(seconds, utc),
        },
        ..Default::default()
    };

    for token in tail.split_whitespace() {
        if let Some(v) = token.strip_prefix("CPU:") {
            if let Ok(v) = v.parse() {
                stat.cpu = v;
            }
        } else if let Some(v) = token.strip_prefix("RAM:") {
            if let Some(v) = v.strip_suffix("MB") {
                let mut parts = v.splitn(2, '/');
                if let (Some(used), Some(max)) = (parts.next(), parts.next()) {
                    if let (Ok(used), Ok(max)) = (used.parse(), max.parse()) {
                        stat.ram_used = used;
                        stat.ram_max = max;
                    }
                }
            }
        } else if let Some(v) = token.strip_prefix("NTP:") {
            let mut parts = v.splitn(2, '/');
            if let (Some(diff), Some(ppm)) = (parts.next(), parts.next()) {
                if let (Some(diff), Some(ppm)) = (diff.strip_suffix("ms"), ppm.strip_suffix("ppm")) {
                    if let (Ok(diff), Ok(ppm)) = (diff.parse(), ppm.parse()) {
                        stat.ntp_difference = diff;
                        stat.ntp_ppm = ppm;
                    }
                }
            }
        } else if let Some(v) = token.strip_suffix('C') {
            if let Ok(v) = v.parse() {
                stat.temperature = v;
            }
        } else if let Some(v) = token.strip_prefix('v') {
            if v.chars().next().map_or(false, |c| c.is_ascii_digit()) {
                stat.version = v.to_string();
            }
        }
    }

    Some((source.to_string(), stat))
}

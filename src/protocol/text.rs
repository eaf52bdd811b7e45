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

//! Renders reports as their canonical single line text form.

use super::*;
use processor::thermal::thermal_format_comment;

pub struct Text {
    wrote_comment: bool,
}

impl Text {
    pub fn new() -> Box<Text> {
        Box::new(Text { wrote_comment: false })
    }

    fn line(s: String) -> Payload {
        let mut payload = s.into_bytes();
        payload.push(b'\n');
        Payload { payload }
    }
}

impl Protocol for Text {
    fn run(&mut self, handle: &mut dyn Pushable<Payload>, i: ChainedIter) {
        if !self.wrote_comment {
            self.wrote_comment = true;
            handle.push_data(Text::line(thermal_format_comment().to_string()));
        }

        for r in i {
            match *r {
                Report::Aircraft(ref id, ref acft) => {
                    handle.push_data(Text::line(format!("{} {}", id, acft)));
                }
                Report::Station(ref name, ref stat) => {
                    handle.push_data(Text::line(format!("{} {}", name, stat)));
                }
                Report::Thermal(ref th) => {
                    handle.push_data(Text::line(format!("{}", th)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use processor::thermal::Thermal;
    use sensor::ogn::PositionTime;
    use std::collections::VecDeque;
    use vario::handle::{BasicHandle, PushableHandle};

    #[test]
    fn test_comment_line_is_written_once_and_first() {
        let mut p = Text::new();
        let reports = [Report::Thermal(Thermal {
            pt: PositionTime {
                lat: 47.0,
                lon: 8.0,
                alt: 1200.0,
                time: 3600.0,
            },
            climbrate: 2.5,
        })];

        let mut q = VecDeque::new();
        let mut b = BasicHandle::new(10);
        {
            let mut h = PushableHandle::new(&mut b, &mut q);
            let empty: [Report; 0] = [];
            p.run(&mut h, reports.iter().chain(empty.iter()));
            p.run(&mut h, empty.iter().chain(empty.iter()));
        }

        assert_eq!(q.len(), 2);
        assert_eq!(q[0].payload,
                   format!("{}\n", thermal_format_comment()).into_bytes());
        assert_eq!(q[1].payload,
                   b"3600 47.000000 8.000000 1200.0 2.50\n".to_vec());
    }
}

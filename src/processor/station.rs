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

//! Forwards ground station reports to the output layers.

use super::*;

pub struct Stations {
    count: usize,
}

impl Stations {
    pub fn new() -> Self {
        Self { count: 0 }
    }
}

impl Processor for Stations {
    fn run(&mut self, handle: &mut dyn Pushable<Report>, i: ChainedIter) {
        for e in i {
            match *e {
                SensorData::Station(ref name, ref stat) => {
                    handle.push_data(Report::Station(name.clone(), stat.clone()));
                    self.count += 1;
                    trace!("station {} seen, {} reports so far", name, self.count);
                }
                _ => {} // do nothing
            }
        }
    }
}

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

use protocol::Payload;
use vario::handle::Handle;
use std::iter::Chain;
use std::slice::Iter;

pub mod udp;

type ChainedIter<'a> = Chain<Iter<'a, Payload>, Iter<'a, Payload>>;

/// A `Transport` delivers rendered payloads to consumers
pub trait Transport {
    /// Deliver payload `i` to the consumers of this transport
    fn run(&mut self, handle: &mut dyn Handle, i: ChainedIter);
}

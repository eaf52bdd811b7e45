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

#[macro_export]
macro_rules! ft_to_m {
    ($x:expr) => (($x as f64) * 0.3048_f64);
}

#[macro_export]
macro_rules! fpm_to_mps {
    ($x:expr) => (($x as f64) * 0.00508_f64);
}

#[macro_export]
macro_rules! kt_to_mps {
    ($x:expr) => (($x as f64) * 0.514444_f64);
}

// The wire carries turn rate in half turns per minute; one half turn
// per minute is 3 degrees per second.  Provisional, to be validated
// against live feed samples.
#[macro_export]
macro_rules! rot_to_degps {
    ($x:expr) => (($x as f64) * 3.0_f64);
}

#[macro_export]
macro_rules! run_every {
    ($hz:expr, $counter:expr, $handle:expr, $action:block) => {
        $counter += 1;
        if $counter >= ($handle.get_frequency() as f32 / $hz as f32) as u32 {
            $counter = 0;
            $action;
        }
    }
}

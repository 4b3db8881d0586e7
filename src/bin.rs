/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! The `oal` command-line player. Everything happens in [oal::main].

fn main() -> Result<(), String> {
    oal::main(std::env::args())
}

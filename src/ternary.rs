// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Expression-level ternary.  Rust's `if` already is an expression,
/// but `cargo fmt` spreads it over five lines, and the border rules of
/// the energy kernels and the seam tables read far better as a grid of
/// one-liners once this macro is understood.
#[macro_export]
macro_rules! cq {
    ($condition: expr, $_true: expr, $_false: expr) => {
        if $condition {
            $_true
        } else {
            $_false
        }
    };
}

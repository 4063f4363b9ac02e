// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Resource identifier allocation. */

use crate::error::{Error, Result};

/// Hands out resource identifiers in strictly increasing order.
///
/// The first identifier is 1. Identifiers are never reused and there is no
/// way to release or reserve one. The 16-bit identifier space holds 65535
/// values; once they are consumed the iterator ends and [Self::allocate]
/// fails with [Error::IdentifiersExhausted]. Nothing wraps around.
#[derive(Clone, Debug)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Obtain the next identifier.
    pub fn allocate(&mut self) -> Result<u16> {
        self.next().ok_or(Error::IdentifiersExhausted)
    }
}

impl Iterator for IdAllocator {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let id = u16::try_from(self.next).ok()?;
        self.next += 1;

        Some(id)
    }
}

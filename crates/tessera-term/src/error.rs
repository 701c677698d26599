// SPDX-License-Identifier: MIT
//
// Error type for sink operations.
//
// Only two things can go wrong between the renderer and a terminal: a
// write aimed outside the device's current viewport (the device shrank
// under us) and plain I/O failure. The renderer swallows the first one
// cell by cell; the second propagates to the host.

use std::io;

use crate::geometry::{Position, Size};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cursor move or write targeted a position the device does not have.
    #[error("position {position} is outside the {viewport} viewport")]
    OutOfBounds { position: Position, viewport: Size },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this is the recoverable out-of-viewport case.
    #[must_use]
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

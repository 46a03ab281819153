//! The padded local array: [`Tile`] owns the halo-inclusive buffer and
//! halo-aware indexing; [`Subarray`] is a borrowed view descriptor over one
//! of a `Tile`'s regions; [`Tile::swap_halo`] is the paired-exchange
//! orchestration that keeps halos consistent across the process grid.
//!
//! Grounded in `original_source/include/darray.hpp` (storage, indexing, halo
//! width selection), `subarray.hpp` (the SEND/RECV window table), and
//! `darray.hpp`'s `halo_swap()` declaration plus spec.md §4.5's pseudocode
//! for the exchange loop itself.

mod exchange;
mod subarray;
mod tile;

pub use subarray::Subarray;
pub use tile::{IndicesIter, Tile};

use halo_transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileError {
    #[error(
        "global array size {array_size} on axis {dim} is not divisible by grid size {grid_size}"
    )]
    DivisibilityError {
        dim: usize,
        array_size: i64,
        grid_size: i32,
    },

    #[error("halo width {halo} on axis {dim} is too large for local size {local_size}")]
    HaloTooLarge {
        dim: usize,
        halo: i64,
        local_size: i64,
    },

    #[error("index {index} on axis {dim} is out of the halo-inclusive range")]
    OutOfRange { dim: usize, index: i64 },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

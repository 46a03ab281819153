//! Halo exchange for dense N-dimensional arrays partitioned across a
//! Cartesian grid of processes.
//!
//! This crate is a thin facade over four smaller crates, each addressing
//! one seam of the design:
//!
//! - [`halo_spec`] — [`BoundaryTag`](halo_spec::BoundaryTag)/
//!   [`BoundarySpec`](halo_spec::BoundarySpec): naming a tile's halo
//!   regions.
//! - [`halo_layout`] — [`Layout`](halo_layout::Layout): this process's place
//!   in the Cartesian grid and its neighbours.
//! - [`halo_tile`] — [`Tile`](halo_tile::Tile)/[`Subarray`](halo_tile::Subarray):
//!   the padded local buffer, halo-aware indexing, and `swap_halo`.
//! - [`halo_transport`] — the [`Transport`](halo_transport::Transport) seam
//!   over the message-passing runtime, with the dependency-free
//!   [`SerialTransport`](halo_transport::serial::SerialTransport) and an
//!   optional real-MPI backend behind the `mpi` feature.
//!
//! Typical usage: build a `Transport`, bind it to a grid with
//! [`Layout::new`](halo_layout::Layout::new), build one or more `Tile`s over
//! that (shared, `Arc`-wrapped) layout, do local computation through the
//! tile's indexing, then call [`Tile::swap_halo`](halo_tile::Tile::swap_halo)
//! to bring the halos back in sync with the neighbours' interiors.

pub use halo_config as config;
pub use halo_layout::{Layout, LayoutError};
pub use halo_spec::{enumerate_boundaries, BoundarySpec, BoundaryTag, Intent, SpecError};
pub use halo_tile::{IndicesIter, Subarray, Tile, TileError};
pub use halo_transport::{serial, Transport, TransportError, NULL_RANK};

#[cfg(feature = "mpi")]
pub use halo_transport::mpi_backend;

use thiserror::Error;

/// Umbrella error covering every subsystem this facade wires together.
#[derive(Debug, Error)]
pub enum HaloError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Common imports for code that builds and exchanges halo tiles.
pub mod prelude {
    pub use crate::{
        enumerate_boundaries, BoundarySpec, BoundaryTag, HaloError, Intent, Layout, LayoutError,
        Subarray, Tile, TileError, Transport, TransportError, NULL_RANK,
    };
    pub use halo_config::BoundsCheck;
    pub use halo_transport::serial::{SerialTransport, SerialWorld};
}

//! Cartesian process grid layout.
//!
//! A [`Layout`] is a thin, cheaply-shared wrapper around a
//! [`halo_transport::Transport`]: it resolves this process's place in an
//! N-dimensional Cartesian grid once at construction (`rank`, `coords`) and
//! answers neighbour questions afterward, either locally (`has_neighbour_at`,
//! the boundary queries) or by asking the transport
//! (`rank_of_neighbour_at` — deliberately *not* cached; see
//! `original_source/include/topology.hpp`'s `_rank_of_neighbour_at_map` for
//! the cached alternative this crate declines).

use halo_config::BoundsCheck;
use halo_spec::{BoundarySpec, BoundaryTag};
use halo_transport::{Transport, TransportError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("grid size {grid_size:?} (product {product}) does not match communicator size {nprocs}")]
    InvalidGrid {
        grid_size: Vec<i32>,
        product: i64,
        nprocs: i32,
    },

    #[error("dimension {dim} out of range for a {n}-dimensional layout")]
    OutOfRange { dim: usize, n: usize },
}

/// This process's coordinates in, and rank within, an N-dimensional
/// Cartesian grid of processes, plus the transport used to reach the
/// others.
///
/// Cheap to share: `Tile`s hold an `Arc<Layout<N, Tr>>` rather than each
/// owning a copy, since many tiles (of different element types, in
/// principle) can live on the same grid.
pub struct Layout<const N: usize, Tr: Transport<N>> {
    transport: Tr,
    grid_size: [i32; N],
    periodic: [bool; N],
    coords: [i32; N],
    rank: i32,
    nprocs: i32,
    bounds_check: BoundsCheck,
}

impl<const N: usize, Tr: Transport<N>> Layout<N, Tr> {
    /// Bind `transport` to an N-dimensional Cartesian grid of `grid_size`
    /// with per-axis `periodic` wraparound.
    ///
    /// # Errors
    /// [`LayoutError::InvalidGrid`] if `grid_size`'s product does not equal
    /// the transport's communicator size (spec.md §7: an application-level
    /// precondition, not a transport failure); [`LayoutError::Transport`]
    /// for any other failure the transport reports while reshaping itself
    /// into a Cartesian communicator.
    pub fn new(
        transport: Tr,
        grid_size: [i32; N],
        periodic: [bool; N],
        bounds_check: BoundsCheck,
    ) -> Result<Self, LayoutError> {
        let nprocs = transport.comm_size();
        let product: i64 = grid_size.iter().map(|&g| g as i64).product();
        if product != nprocs as i64 {
            return Err(LayoutError::InvalidGrid {
                grid_size: grid_size.to_vec(),
                product,
                nprocs,
            });
        }
        let transport = transport.cart_create(grid_size, periodic)?;
        let rank = transport.comm_rank();
        let coords = transport.cart_coords(rank);

        debug!(
            target: "halo_layout",
            rank,
            nprocs,
            ?grid_size,
            ?periodic,
            ?coords,
            "layout_bound"
        );

        Ok(Self {
            transport,
            grid_size,
            periodic,
            coords,
            rank,
            nprocs,
            bounds_check,
        })
    }

    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    pub fn grid_size(&self) -> [i32; N] {
        self.grid_size
    }

    pub fn periodic(&self) -> [bool; N] {
        self.periodic
    }

    pub fn coords(&self) -> [i32; N] {
        self.coords
    }

    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn nprocs(&self) -> i32 {
        self.nprocs
    }

    /// Process count along `dim`.
    ///
    /// # Errors
    /// [`LayoutError::OutOfRange`] if `dim >= N`, checked only when
    /// `bounds_check.layout` is enabled.
    pub fn size(&self, dim: usize) -> Result<i32, LayoutError> {
        self.check_dim(dim)?;
        Ok(self.grid_size[dim])
    }

    /// Whether axis `dim` wraps around.
    ///
    /// # Errors
    /// [`LayoutError::OutOfRange`] if `dim >= N`, checked only when
    /// `bounds_check.layout` is enabled.
    pub fn is_periodic(&self, dim: usize) -> Result<bool, LayoutError> {
        self.check_dim(dim)?;
        Ok(self.periodic[dim])
    }

    /// Single-axis form of [`Layout::has_neighbour_at`]: whether a neighbour
    /// exists along `dim` in the direction `tag` names. `Center`/`Wildcard`
    /// return true unconditionally, the same as the whole-spec version.
    pub fn has_neighbour_at_axis(&self, tag: BoundaryTag, dim: usize) -> bool {
        match tag {
            BoundaryTag::Left => self.coords[dim] > 0 || self.periodic[dim],
            BoundaryTag::Right => self.coords[dim] < self.grid_size[dim] - 1 || self.periodic[dim],
            BoundaryTag::Center | BoundaryTag::Wildcard => true,
        }
    }

    /// Whether a neighbour exists in the direction(s) `spec` names, computed
    /// purely from this process's own `coords`/`grid_size`/`periodic` — no
    /// transport round trip.
    ///
    /// `Center`/`Wildcard` axes impose no constraint; a `Left`/`Right` axis
    /// requires either room to move in that direction or periodic
    /// wraparound (including the single-process-per-axis case, where the
    /// "neighbour" is the process itself).
    pub fn has_neighbour_at(&self, spec: &BoundarySpec<N>) -> bool {
        (0..N).all(|d| self.has_neighbour_at_axis(spec.tag(d), d))
    }

    /// Rank of the neighbour in the direction(s) `spec` names, or
    /// [`halo_transport::NULL_RANK`] if none exists. Asks the transport on
    /// every call; not cached (see module docs).
    pub fn rank_of_neighbour_at(&self, spec: &BoundarySpec<N>) -> i32 {
        let mut coords = self.coords;
        for d in 0..N {
            match spec.tag(d) {
                BoundaryTag::Left => coords[d] -= 1,
                BoundaryTag::Right => coords[d] += 1,
                BoundaryTag::Center | BoundaryTag::Wildcard => {}
            }
        }
        self.transport.cart_rank(coords)
    }

    fn check_dim(&self, dim: usize) -> Result<(), LayoutError> {
        if self.bounds_check.layout && dim >= N {
            return Err(LayoutError::OutOfRange { dim, n: N });
        }
        Ok(())
    }

    /// Whether this process sits on the grid's low edge along `dim`
    /// (independent of periodicity — a periodic axis still has a "low
    /// edge" in the Cartesian-coordinate sense, it's just not a halo-less
    /// boundary for exchange purposes).
    pub fn is_on_left_boundary(&self, dim: usize) -> Result<bool, LayoutError> {
        self.check_dim(dim)?;
        Ok(self.coords[dim] == 0)
    }

    /// Whether this process sits on the grid's high edge along `dim`.
    pub fn is_on_right_boundary(&self, dim: usize) -> Result<bool, LayoutError> {
        self.check_dim(dim)?;
        Ok(self.coords[dim] == self.grid_size[dim] - 1)
    }

    /// Whether this process sits on any edge of the grid.
    pub fn is_on_boundary(&self) -> bool {
        (0..N).any(|d| self.coords[d] == 0 || self.coords[d] == self.grid_size[d] - 1)
    }
}

/// Convenience alias for a `Layout` shared between several `Tile`s.
pub type SharedLayout<const N: usize, Tr> = Arc<Layout<N, Tr>>;

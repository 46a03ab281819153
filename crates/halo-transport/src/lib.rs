//! The `Transport` seam: everything a `Layout`/`Tile` needs from a
//! message-passing runtime, and nothing else.
//!
//! spec.md §6 draws this boundary around four primitives — a Cartesian
//! communicator constructor, coordinate/rank mapping, subarray
//! registration, and a blocking paired send+recv — modeled here on
//! `core-terminal::TerminalBackend`: a small trait plus one in-process
//! implementation usable without any real runtime ([`serial::SerialTransport`])
//! and, behind the `mpi` feature, a backend over the real `mpi` crate.

use thiserror::Error;

pub mod serial;

#[cfg(feature = "mpi")]
pub mod mpi_backend;

/// Sentinel rank meaning "no neighbour here": a non-periodic boundary edge.
/// Named after MPI's `MPI_PROC_NULL`; a send or recv addressed to it is a
/// no-op.
pub const NULL_RANK: i32 = -1;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cartesian grid of size {product} does not match communicator size {comm_size}")]
    GridMismatch { product: i64, comm_size: i32 },

    #[error("rank {rank} is out of range for a communicator of size {comm_size}")]
    RankOutOfRange { rank: i32, comm_size: i32 },

    #[error("failed to register subarray datatype: {0}")]
    RegistrationFailed(String),

    #[error("send/recv failed: {0}")]
    ExchangeFailed(String),
}

/// A Cartesian-grid-shaped communicator, abstracted over the runtime that
/// actually moves bytes between processes.
///
/// `N` is the grid's dimensionality, fixed at compile time like everywhere
/// else in this crate family. Implementors are cheap to clone-by-value or
/// are themselves already a lightweight handle (`SerialTransport` is an
/// `Arc` clone away from its loopback mailbox; `MpiTransport` wraps an
/// `mpi::Communicator`).
pub trait Transport<const N: usize>: Sized {
    /// Opaque handle to a registered subarray window, analogous to an
    /// `MPI_Datatype` produced by `MPI_Type_create_subarray`.
    type SubarrayHandle: Clone;

    /// Size of the plain (pre-Cartesian) communicator this transport was
    /// built from.
    fn comm_size(&self) -> i32;

    /// This process's rank within that plain communicator.
    fn comm_rank(&self) -> i32;

    /// Reshape a plain communicator into a Cartesian one of `grid_size`
    /// with the given per-axis periodicity. Mirrors `MPI_Cart_create`.
    ///
    /// # Errors
    /// [`TransportError::GridMismatch`] if `grid_size`'s product does not
    /// equal [`Transport::comm_size`].
    fn cart_create(self, grid_size: [i32; N], periodic: [bool; N]) -> Result<Self, TransportError>;

    /// Coordinates of `rank` in this Cartesian communicator.
    fn cart_coords(&self, rank: i32) -> [i32; N];

    /// Rank at `coords`, or [`NULL_RANK`] if `coords` falls outside the grid
    /// on a non-periodic axis.
    fn cart_rank(&self, coords: [i32; N]) -> i32;

    /// Register a strided rectangular window (`size` at `origin`, within a
    /// buffer shaped `parent_size`) as a reusable send/recv datatype for
    /// elements of type `T`.
    fn register_subarray<T>(
        &self,
        parent_size: [i64; N],
        size: [i64; N],
        origin: [i64; N],
    ) -> Result<Self::SubarrayHandle, TransportError>;

    /// Release a handle returned by [`Transport::register_subarray`].
    fn free_subarray(&self, handle: Self::SubarrayHandle);

    /// Simultaneously send the window of `buf` described by `send_handle` to
    /// `dst`, and receive into the (disjoint) window described by
    /// `recv_handle` from `src`, matching on `tag`. Either side is skipped
    /// when its rank is [`NULL_RANK`].
    ///
    /// Both windows address the *same* buffer, exactly as `MPI_Sendrecv`
    /// is used in the original — one pointer, two derived datatypes
    /// describing non-overlapping regions (interior vs. halo). Taking a
    /// single `&mut [T]` here rather than separate send/recv slices is what
    /// lets this be expressed safely: callers never need two live borrows
    /// of one `Tile`'s buffer. Implementations must read every value the
    /// send window needs before writing anything through the recv window.
    /// Mirrors `MPI_Sendrecv`: a single atomic primitive, not two
    /// independent calls, so it cannot deadlock on a symmetric exchange.
    fn sendrecv<T: Copy + Send + 'static>(
        &self,
        buf: &mut [T],
        send_handle: &Self::SubarrayHandle,
        dst: i32,
        recv_handle: &Self::SubarrayHandle,
        src: i32,
        tag: i32,
    ) -> Result<(), TransportError>;
}

/// Column-major strides for a buffer of shape `size` (first axis fastest),
/// shared by every backend that needs to pack/unpack a strided subarray
/// window out of/into a linear buffer.
pub(crate) fn column_major_strides<const N: usize>(parent_size: [i64; N]) -> [i64; N] {
    let mut strides = [1i64; N];
    let mut acc = 1i64;
    for d in 0..N {
        strides[d] = acc;
        acc *= parent_size[d];
    }
    strides
}

/// Enumerate the linear offsets (into a `parent_size`-shaped, column-major
/// buffer) covered by a `size`-shaped window at `origin`, in column-major
/// (first-axis-fastest) order.
pub(crate) fn window_offsets<const N: usize>(
    parent_size: [i64; N],
    size: [i64; N],
    origin: [i64; N],
) -> Vec<i64> {
    let strides = column_major_strides(parent_size);
    let total: i64 = size.iter().product();
    let mut out = Vec::with_capacity(total.max(0) as usize);
    let mut idx = [0i64; N];
    for _ in 0..total {
        let mut offset = 0i64;
        for d in 0..N {
            offset += (origin[d] + idx[d]) * strides[d];
        }
        out.push(offset);
        for d in 0..N {
            idx[d] += 1;
            if idx[d] < size[d] {
                break;
            }
            idx[d] = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_first_axis_fastest() {
        assert_eq!(column_major_strides([4i64, 3, 2]), [1, 4, 12]);
    }

    #[test]
    fn window_offsets_cover_full_buffer_in_order() {
        let offsets = window_offsets([2i64, 2], [2, 2], [0, 0]);
        assert_eq!(offsets, vec![0, 1, 2, 3]);
    }

    #[test]
    fn window_offsets_respect_origin() {
        let offsets = window_offsets([4i64, 3], [2, 1], [1, 2]);
        // column d=0 stride 1, d=1 stride 4; origin (1,2) -> base 1 + 8 = 9
        assert_eq!(offsets, vec![9, 10]);
    }
}

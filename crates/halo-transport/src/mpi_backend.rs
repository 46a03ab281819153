//! Real-MPI backend, gated behind the `mpi` feature.
//!
//! Grounded directly in the C++ original's `mpiwrapper.hpp`: the same four
//! calls (`MPI_Cart_create`, `MPI_Cart_coords`/`MPI_Cart_rank`,
//! `MPI_Type_create_subarray`, `MPI_Sendrecv`), expressed through the `mpi`
//! crate's raw `ffi` module since its safe `Communicator` API does not yet
//! cover Cartesian topologies or derived subarray datatypes. Each unsafe
//! block states the invariant it relies on, in `core-model`'s style.

use crate::{Transport, TransportError, NULL_RANK};
use mpi::ffi;
use mpi::traits::*;
use std::mem::size_of;
use std::os::raw::c_int;

/// A registered subarray datatype, built over an `MPI_BYTE`-contiguous
/// element type so it works for any `T`. Frees itself on drop.
pub struct MpiSubarrayHandle {
    datatype: ffi::MPI_Datatype,
}

// SAFETY: `MPI_Datatype` is an opaque handle (an integer on most MPI
// implementations); no thread-local or non-Send state is reachable through
// it. MPI itself requires explicit synchronization around blocking calls
// that use it, which `MpiTransport::sendrecv` provides.
unsafe impl Send for MpiSubarrayHandle {}

impl Drop for MpiSubarrayHandle {
    fn drop(&mut self) {
        // SAFETY: `self.datatype` was created by `MPI_Type_create_subarray`
        // and committed exactly once in `register_subarray`; dropping a
        // handle frees it exactly once.
        unsafe {
            ffi::MPI_Type_free(&mut self.datatype);
        }
    }
}

/// A Cartesian communicator backed by a real MPI runtime.
///
/// Built from `mpi::initialize()`'s `SystemCommunicator` (or any
/// communicator implementing [`mpi::traits::Communicator`]) via
/// [`Transport::cart_create`].
pub struct MpiTransport<const N: usize> {
    /// The plain communicator this was constructed from (commonly
    /// `MPI_COMM_WORLD`). Not owned: callers keep the `Universe`/
    /// `SystemCommunicator` alive for the transport's lifetime.
    plain: ffi::MPI_Comm,
    /// The Cartesian communicator, once `cart_create` has run.
    cart: Option<ffi::MPI_Comm>,
    grid_size: [i32; N],
    periodic: [bool; N],
}

impl<const N: usize> MpiTransport<N> {
    /// Wrap an existing communicator (e.g. `world.as_raw()` from a
    /// `SystemCommunicator`) as a not-yet-Cartesian transport.
    pub fn new(comm: &impl Communicator) -> Self {
        Self {
            plain: comm.as_raw(),
            cart: None,
            grid_size: [0; N],
            periodic: [false; N],
        }
    }

    fn cart_comm(&self) -> ffi::MPI_Comm {
        self.cart.expect("MpiTransport used before cart_create")
    }
}

impl<const N: usize> Drop for MpiTransport<N> {
    fn drop(&mut self) {
        if let Some(mut cart) = self.cart.take() {
            // SAFETY: `cart` was created by `MPI_Cart_create` in
            // `cart_create` and is owned by this transport alone.
            unsafe {
                ffi::MPI_Comm_free(&mut cart);
            }
        }
    }
}

impl<const N: usize> Transport<N> for MpiTransport<N> {
    type SubarrayHandle = MpiSubarrayHandle;

    fn comm_size(&self) -> i32 {
        let mut size: c_int = 0;
        // SAFETY: `self.plain` is a valid communicator handle for this
        // transport's lifetime.
        unsafe {
            ffi::MPI_Comm_size(self.plain, &mut size);
        }
        size
    }

    fn comm_rank(&self) -> i32 {
        let mut rank: c_int = 0;
        // SAFETY: see `comm_size`.
        unsafe {
            ffi::MPI_Comm_rank(self.plain, &mut rank);
        }
        rank
    }

    fn cart_create(mut self, grid_size: [i32; N], periodic: [bool; N]) -> Result<Self, TransportError> {
        let product: i64 = grid_size.iter().map(|&g| g as i64).product();
        let comm_size = self.comm_size();
        if product != comm_size as i64 {
            return Err(TransportError::GridMismatch {
                product,
                comm_size,
            });
        }
        let dims: Vec<c_int> = grid_size.iter().map(|&g| g as c_int).collect();
        let periods: Vec<c_int> = periodic.iter().map(|&p| p as c_int).collect();
        let mut cart: ffi::MPI_Comm = std::ptr::null_mut();
        // SAFETY: `dims`/`periods` have length `N` matching `ndims`;
        // `reorder = 0` preserves the caller's rank-to-process mapping,
        // matching `Layout`'s invariant that `rank` is the single source of
        // truth for this process's place in the grid.
        let rc = unsafe {
            ffi::MPI_Cart_create(
                self.plain,
                N as c_int,
                dims.as_ptr(),
                periods.as_ptr(),
                0,
                &mut cart,
            )
        };
        if rc != 0 {
            return Err(TransportError::RegistrationFailed(format!(
                "MPI_Cart_create failed with code {rc}"
            )));
        }
        self.cart = Some(cart);
        self.grid_size = grid_size;
        self.periodic = periodic;
        Ok(self)
    }

    fn cart_coords(&self, rank: i32) -> [i32; N] {
        let mut coords = [0 as c_int; N];
        // SAFETY: `rank` is a valid rank in `self.cart_comm()`; `coords`
        // has length `N` matching the communicator's Cartesian dimension.
        unsafe {
            ffi::MPI_Cart_coords(self.cart_comm(), rank, N as c_int, coords.as_mut_ptr());
        }
        coords
    }

    fn cart_rank(&self, coords: [i32; N]) -> i32 {
        for d in 0..N {
            if !self.periodic[d] && (coords[d] < 0 || coords[d] >= self.grid_size[d]) {
                return NULL_RANK;
            }
        }
        let mut rank: c_int = 0;
        // SAFETY: out-of-range coordinates on non-periodic axes were
        // rejected above; `MPI_Cart_rank` wraps periodic axes itself.
        unsafe {
            ffi::MPI_Cart_rank(self.cart_comm(), coords.as_ptr(), &mut rank);
        }
        rank
    }

    fn register_subarray<T>(
        &self,
        parent_size: [i64; N],
        size: [i64; N],
        origin: [i64; N],
    ) -> Result<Self::SubarrayHandle, TransportError> {
        let sizes: Vec<c_int> = parent_size.iter().map(|&s| s as c_int).collect();
        let subsizes: Vec<c_int> = size.iter().map(|&s| s as c_int).collect();
        let starts: Vec<c_int> = origin.iter().map(|&s| s as c_int).collect();

        // Build a contiguous "one element of T" datatype out of raw bytes so
        // this works for any `T: Copy`, matching the trait's generic
        // `sendrecv<T>` rather than a fixed numeric element type.
        let mut elem_type: ffi::MPI_Datatype = std::ptr::null_mut();
        // SAFETY: `RSMPI_BYTE` is a predefined MPI datatype, valid for the
        // whole program's lifetime.
        let rc = unsafe {
            ffi::MPI_Type_contiguous(size_of::<T>() as c_int, ffi::RSMPI_BYTE, &mut elem_type)
        };
        if rc != 0 {
            return Err(TransportError::RegistrationFailed(format!(
                "MPI_Type_contiguous failed with code {rc}"
            )));
        }
        // SAFETY: `elem_type` was just produced and is not yet committed.
        let rc = unsafe { ffi::MPI_Type_commit(&mut elem_type) };
        if rc != 0 {
            return Err(TransportError::RegistrationFailed(format!(
                "MPI_Type_commit failed with code {rc}"
            )));
        }

        let mut datatype: ffi::MPI_Datatype = std::ptr::null_mut();
        // SAFETY: `sizes`/`subsizes`/`starts` each have length `N` matching
        // `ndims`; `MPI_ORDER_FORTRAN` selects first-axis-fastest (column
        // major) layout, matching this crate family's storage order.
        let rc = unsafe {
            ffi::MPI_Type_create_subarray(
                N as c_int,
                sizes.as_ptr(),
                subsizes.as_ptr(),
                starts.as_ptr(),
                ffi::RSMPI_ORDER_FORTRAN,
                elem_type,
                &mut datatype,
            )
        };
        if rc != 0 {
            return Err(TransportError::RegistrationFailed(format!(
                "MPI_Type_create_subarray failed with code {rc}"
            )));
        }
        // SAFETY: `datatype` was just produced and is not yet committed.
        let rc = unsafe { ffi::MPI_Type_commit(&mut datatype) };
        if rc != 0 {
            return Err(TransportError::RegistrationFailed(format!(
                "MPI_Type_commit failed with code {rc}"
            )));
        }
        // SAFETY: `elem_type` was committed locally above and is no longer
        // needed once `datatype` (which holds its own reference) exists.
        unsafe {
            ffi::MPI_Type_free(&mut elem_type);
        }

        Ok(MpiSubarrayHandle { datatype })
    }

    fn free_subarray(&self, _handle: Self::SubarrayHandle) {
        // Dropping the handle runs `MpiSubarrayHandle::drop`.
    }

    fn sendrecv<T: Copy + Send + 'static>(
        &self,
        buf: &mut [T],
        send_handle: &Self::SubarrayHandle,
        dst: i32,
        recv_handle: &Self::SubarrayHandle,
        src: i32,
        tag: i32,
    ) -> Result<(), TransportError> {
        let mut status = ffi::MPI_Status::default();
        let ptr = buf.as_mut_ptr();
        // SAFETY: `buf` outlives this call; `send_handle`/`recv_handle`'s
        // datatypes describe strided, non-overlapping windows within it,
        // per `register_subarray`'s contract (interior vs. halo never
        // overlap). Passing the same base pointer as both send and recv
        // argument, distinguished only by datatype, is exactly how the
        // original `mpiwrapper.hpp::sendrecv` calls `MPI_Sendrecv` too.
        // `MPI_Sendrecv` is a single atomic primitive, which is why a
        // symmetric exchange here cannot deadlock.
        let rc = unsafe {
            ffi::MPI_Sendrecv(
                ptr as *const _,
                1,
                send_handle.datatype,
                dst,
                tag,
                ptr as *mut _,
                1,
                recv_handle.datatype,
                src,
                tag,
                self.cart_comm(),
                &mut status,
            )
        };
        if rc != 0 {
            return Err(TransportError::ExchangeFailed(format!(
                "MPI_Sendrecv failed with code {rc}"
            )));
        }
        Ok(())
    }
}

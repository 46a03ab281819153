//! In-process loopback transport: simulates a Cartesian communicator of
//! several ranks as one [`SerialWorld`] shared by one OS thread per rank,
//! with a condvar-guarded mailbox standing in for the network. No real
//! message-passing runtime is required, which is what makes this the
//! default transport for this crate family's own test suite.
//!
//! Mirrors `core-terminal`'s pattern of a trait plus a dependency-free
//! reference implementation (there, `CrosstermBackend`; here,
//! `SerialTransport`) usable without any external system.

use crate::{window_offsets, Transport, TransportError, NULL_RANK};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use tracing::{debug, trace};

type MailboxKey = (i32, i32, i32);

/// Shared state for a simulated Cartesian communicator of `nprocs`
/// processes, each represented by a [`SerialTransport`] living on its own
/// thread.
pub struct SerialWorld {
    nprocs: i32,
    mailbox: Mutex<HashMap<MailboxKey, Box<dyn Any + Send>>>,
    condvar: Condvar,
}

impl SerialWorld {
    /// Build a world of `nprocs` simulated processes.
    pub fn new(nprocs: i32) -> Arc<Self> {
        Arc::new(Self {
            nprocs,
            mailbox: Mutex::new(HashMap::new()),
            condvar: Condvar::new(),
        })
    }

    pub fn nprocs(&self) -> i32 {
        self.nprocs
    }

    /// A plain (pre-`cart_create`) transport handle bound to `rank`.
    ///
    /// Call this once per simulated process, typically from inside the
    /// thread closure that will drive that process's `Layout`/`Tile`.
    pub fn transport<const N: usize>(self: &Arc<Self>, rank: i32) -> SerialTransport<N> {
        SerialTransport {
            world: Arc::clone(self),
            rank,
            cartesian: None,
        }
    }
}

#[derive(Clone, Copy)]
struct Cartesian<const N: usize> {
    grid_size: [i32; N],
    periodic: [bool; N],
}

/// One process's view of a [`SerialWorld`].
///
/// Cheap to clone once Cartesian-bound (an `Arc` clone plus two small
/// arrays); cloning is intentionally not derived, since two clones sharing
/// one `rank` would both answer to the same mailbox slot and defeat the
/// point of simulating distinct processes.
pub struct SerialTransport<const N: usize> {
    world: Arc<SerialWorld>,
    rank: i32,
    cartesian: Option<Cartesian<N>>,
}

#[derive(Clone)]
pub struct SerialSubarrayHandle {
    offsets: Vec<i64>,
}

impl<const N: usize> SerialTransport<N> {
    fn cartesian(&self) -> &Cartesian<N> {
        self.cartesian
            .as_ref()
            .expect("SerialTransport used before cart_create")
    }

    fn unravel(rank: i32, grid_size: [i32; N]) -> [i32; N] {
        let mut coords = [0i32; N];
        let mut r = rank;
        for d in (0..N).rev() {
            coords[d] = r % grid_size[d];
            r /= grid_size[d];
        }
        coords
    }

    fn ravel(coords: [i32; N], grid_size: [i32; N]) -> i32 {
        let mut r = 0i32;
        for d in 0..N {
            r = r * grid_size[d] + coords[d];
        }
        r
    }
}

impl<const N: usize> Transport<N> for SerialTransport<N> {
    type SubarrayHandle = SerialSubarrayHandle;

    fn comm_size(&self) -> i32 {
        self.world.nprocs
    }

    fn comm_rank(&self) -> i32 {
        self.rank
    }

    fn cart_create(mut self, grid_size: [i32; N], periodic: [bool; N]) -> Result<Self, TransportError> {
        let product: i64 = grid_size.iter().map(|&g| g as i64).product();
        if product != self.world.nprocs as i64 {
            return Err(TransportError::GridMismatch {
                product,
                comm_size: self.world.nprocs,
            });
        }
        self.cartesian = Some(Cartesian { grid_size, periodic });
        debug!(
            rank = self.rank,
            ?grid_size,
            ?periodic,
            "serial_transport_cart_create"
        );
        Ok(self)
    }

    fn cart_coords(&self, rank: i32) -> [i32; N] {
        Self::unravel(rank, self.cartesian().grid_size)
    }

    fn cart_rank(&self, coords: [i32; N]) -> i32 {
        let cart = self.cartesian();
        let mut wrapped = coords;
        for d in 0..N {
            let size = cart.grid_size[d];
            if wrapped[d] < 0 || wrapped[d] >= size {
                if cart.periodic[d] {
                    wrapped[d] = wrapped[d].rem_euclid(size);
                } else {
                    return NULL_RANK;
                }
            }
        }
        Self::ravel(wrapped, cart.grid_size)
    }

    fn register_subarray<T>(
        &self,
        parent_size: [i64; N],
        size: [i64; N],
        origin: [i64; N],
    ) -> Result<Self::SubarrayHandle, TransportError> {
        Ok(SerialSubarrayHandle {
            offsets: window_offsets(parent_size, size, origin),
        })
    }

    fn free_subarray(&self, _handle: Self::SubarrayHandle) {}

    fn sendrecv<T: Copy + Send + 'static>(
        &self,
        buf: &mut [T],
        send_handle: &Self::SubarrayHandle,
        dst: i32,
        recv_handle: &Self::SubarrayHandle,
        src: i32,
        tag: i32,
    ) -> Result<(), TransportError> {
        trace!(rank = self.rank, dst, src, tag, "serial_transport_sendrecv");

        // Read the whole send window before anything is written, so this
        // is correct even though `send_handle` and `recv_handle` describe
        // regions of the same buffer.
        if dst != NULL_RANK {
            let packed: Vec<T> = send_handle
                .offsets
                .iter()
                .map(|&off| buf[off as usize])
                .collect();
            let mut mailbox = self.world.mailbox.lock().expect("mailbox poisoned");
            mailbox.insert((self.rank, dst, tag), Box::new(packed));
            self.world.condvar.notify_all();
        }

        if src != NULL_RANK {
            let mut mailbox = self.world.mailbox.lock().expect("mailbox poisoned");
            let key = (src, self.rank, tag);
            let boxed = loop {
                if let Some(boxed) = mailbox.remove(&key) {
                    break boxed;
                }
                mailbox = self
                    .world
                    .condvar
                    .wait(mailbox)
                    .expect("mailbox poisoned");
            };
            let packed = boxed.downcast::<Vec<T>>().map_err(|_| {
                TransportError::ExchangeFailed(
                    "element type mismatch between paired sendrecv calls".to_string(),
                )
            })?;
            for (&offset, &value) in recv_handle.offsets.iter().zip(packed.iter()) {
                buf[offset as usize] = value;
            }
        }

        Ok(())
    }
}

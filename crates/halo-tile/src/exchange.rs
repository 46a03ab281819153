use crate::subarray::geometry;
use crate::tile::Tile;
use crate::TileError;
use halo_spec::{enumerate_boundaries, Intent};
use halo_transport::{Transport, NULL_RANK};
use std::sync::Arc;
use tracing::{debug, debug_span};

impl<T: Copy + Send + 'static, const N: usize, Tr: Transport<N>> Tile<T, N, Tr> {
    /// Walk the fixed boundary enumeration and exchange every region this
    /// process has a real neighbour on both sides for, per spec.md §4.5.
    ///
    /// For each spec: skip if `layout.has_neighbour_at` is false (no
    /// transport call needed); otherwise look up the send-direction and
    /// recv-direction ranks and skip the whole transfer if either is
    /// [`NULL_RANK`] (the mixed-periodicity corner case spec.md calls out —
    /// the halo on the missing side keeps its boundary-condition value).
    /// The registered send/recv windows are two disjoint regions of the
    /// *same* buffer, passed to [`Transport::sendrecv`] as one `&mut`
    /// borrow rather than through the borrowing [`crate::Subarray`] type,
    /// since a live `Subarray` would hold an immutable borrow of the whole
    /// `Tile` for the same span this needs `&mut self.data`.
    pub fn swap_halo(&mut self) -> Result<(), TileError> {
        let layout: Arc<_> = Arc::clone(&self.layout);
        let span = debug_span!("swap_halo", rank = layout.rank());
        let _enter = span.enter();

        for spec in enumerate_boundaries::<N>() {
            if !layout.has_neighbour_at(&spec) {
                continue;
            }
            let opposite = spec.opposite();
            let dst = layout.rank_of_neighbour_at(&spec);
            let src = layout.rank_of_neighbour_at(&opposite);
            if dst == NULL_RANK || src == NULL_RANK {
                continue;
            }

            let (send_size, send_origin) = geometry(
                &spec,
                Intent::Send,
                self.halo_left,
                self.halo_right,
                self.local_size,
                self.raw_size,
            );
            let (recv_size, recv_origin) = geometry(
                &opposite,
                Intent::Recv,
                self.halo_left,
                self.halo_right,
                self.local_size,
                self.raw_size,
            );

            let transport = layout.transport();
            let send_handle = transport.register_subarray::<T>(self.raw_size, send_size, send_origin)?;
            let recv_handle = transport.register_subarray::<T>(self.raw_size, recv_size, recv_origin)?;
            let tag = spec.hash(Intent::Send) as i32;

            debug!(dst, src, tag, "exchanging boundary region");
            let result = transport.sendrecv(&mut self.data, &send_handle, dst, &recv_handle, src, tag);

            transport.free_subarray(send_handle);
            transport.free_subarray(recv_handle);
            result?;
        }

        Ok(())
    }
}

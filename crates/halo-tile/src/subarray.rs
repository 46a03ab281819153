use crate::tile::Tile;
use crate::TileError;
use halo_spec::{BoundarySpec, BoundaryTag, Intent};
use halo_transport::Transport;

/// Derive a region's `(size, raw_origin)` per axis from its tag and
/// intent, per spec.md §4.4's table:
///
/// | tag | size\[d\] | origin (SEND) | origin (RECV) |
/// |---|---|---|---|
/// | LEFT | hL | hL | 0 |
/// | RIGHT | hR | hL + L − hR | hL + L |
/// | CENTER | L | hL | hL |
/// | WILDCARD | raw_size | 0 | 0 |
///
/// A SEND window on `LEFT` is the first `hL` interior layers (handed to the
/// left neighbour, who will drop them into its own right halo); a RECV
/// window on `LEFT` is the left halo itself, waiting to be filled. `RIGHT`
/// is symmetric; `CENTER`/`WILDCARD` carry interior data unshifted.
pub(crate) fn geometry<const N: usize>(
    spec: &BoundarySpec<N>,
    intent: Intent,
    halo_left: [i64; N],
    halo_right: [i64; N],
    local_size: [i64; N],
    raw_size: [i64; N],
) -> ([i64; N], [i64; N]) {
    let mut size = [0i64; N];
    let mut origin = [0i64; N];
    for d in 0..N {
        let (sz, org) = match spec.tag(d) {
            BoundaryTag::Left => (
                halo_left[d],
                match intent {
                    Intent::Send => halo_left[d],
                    Intent::Recv => 0,
                },
            ),
            BoundaryTag::Right => (
                halo_right[d],
                match intent {
                    Intent::Send => halo_left[d] + local_size[d] - halo_right[d],
                    Intent::Recv => halo_left[d] + local_size[d],
                },
            ),
            BoundaryTag::Center => (local_size[d], halo_left[d]),
            BoundaryTag::Wildcard => (raw_size[d], 0),
        };
        size[d] = sz;
        origin[d] = org;
    }
    (size, origin)
}

/// A borrowed view descriptor over one region of a [`Tile`]: the window
/// `size`/`raw_origin` into its raw buffer, plus the transport's strided
/// datatype handle registered for that window.
///
/// Borrows its parent `Tile` for `'t`, making "a `Subarray` must not
/// outlive its `Tile`" (spec.md §9) a compile-time guarantee. Not cached
/// inside `Tile` for the same reason — see `DESIGN.md`.
pub struct Subarray<'t, T, const N: usize, Tr: Transport<N>> {
    tile: &'t Tile<T, N, Tr>,
    size: [i64; N],
    raw_origin: [i64; N],
    handle: Tr::SubarrayHandle,
}

impl<'t, T, const N: usize, Tr: Transport<N>> Subarray<'t, T, N, Tr> {
    /// Derive and register the window `spec`/`intent` names over `tile`.
    pub fn new(
        tile: &'t Tile<T, N, Tr>,
        spec: &BoundarySpec<N>,
        intent: Intent,
    ) -> Result<Self, TileError> {
        let (size, raw_origin) = geometry(
            spec,
            intent,
            tile.halo_left,
            tile.halo_right,
            tile.local_size,
            tile.raw_size,
        );
        let handle = tile
            .layout
            .transport()
            .register_subarray::<T>(tile.raw_size, size, raw_origin)?;
        Ok(Self {
            tile,
            size,
            raw_origin,
            handle,
        })
    }

    pub fn size(&self) -> [i64; N] {
        self.size
    }

    pub fn raw_origin(&self) -> [i64; N] {
        self.raw_origin
    }

    pub fn handle(&self) -> &Tr::SubarrayHandle {
        &self.handle
    }
}

impl<'t, T, const N: usize, Tr: Transport<N>> Drop for Subarray<'t, T, N, Tr> {
    fn drop(&mut self) {
        self.tile.layout.transport().free_subarray(self.handle.clone());
    }
}

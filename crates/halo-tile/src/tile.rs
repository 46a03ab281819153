use crate::TileError;
use halo_config::BoundsCheck;
use halo_layout::Layout;
use halo_spec::BoundaryTag;
use halo_transport::Transport;
use std::sync::Arc;

/// Column-major (first-axis-fastest) strides for a buffer shaped `size`.
pub(crate) fn raw_strides<const N: usize>(size: [i64; N]) -> [i64; N] {
    let mut strides = [1i64; N];
    let mut acc = 1i64;
    for d in 0..N {
        strides[d] = acc;
        acc *= size[d];
    }
    strides
}

/// A process-local, halo-padded array tile.
///
/// Indices along axis `d` range over `-halo_left[d] .. local_size[d] +
/// halo_right[d]`; `0..local_size[d]` is the interior. Storage is one flat
/// `Vec<T>` of length `∏ raw_size`, first axis fastest-varying, matching
/// `original_source/include/darray.hpp`'s `_tolinearindex`.
pub struct Tile<T, const N: usize, Tr: Transport<N>> {
    pub(crate) layout: Arc<Layout<N, Tr>>,
    pub(crate) local_size: [i64; N],
    pub(crate) halo_left: [i64; N],
    pub(crate) halo_right: [i64; N],
    pub(crate) raw_size: [i64; N],
    pub(crate) data: Vec<T>,
    pub(crate) bounds_check: BoundsCheck,
}

impl<T: Clone, const N: usize, Tr: Transport<N>> Tile<T, N, Tr> {
    /// Build a tile over `layout` with global `array_size`, boundary halo
    /// width `halo_out`, and communication halo width `halo_in`, filling
    /// every element (interior and halo) with `fill`.
    ///
    /// Per axis, the actual `halo_left`/`halo_right` used is `halo_in` on
    /// ends that face a real neighbour (including through periodicity) and
    /// `halo_out` on ends that face the true global boundary — see
    /// `DESIGN.md`'s Open Question 2 resolution; `original_source`'s own
    /// constructor applies this selection backwards for periodic axes.
    ///
    /// # Errors
    /// [`TileError::DivisibilityError`] if `array_size[d]` is not a
    /// multiple of the grid's size along `d`; [`TileError::HaloTooLarge`]
    /// if either halo width on an axis is `>=` that axis's local size.
    pub fn new(
        layout: Arc<Layout<N, Tr>>,
        array_size: [i64; N],
        halo_out: [i64; N],
        halo_in: [i64; N],
        bounds_check: BoundsCheck,
        fill: T,
    ) -> Result<Self, TileError> {
        let grid_size = layout.grid_size();
        let coords = layout.coords();
        let periodic = layout.periodic();

        let mut local_size = [0i64; N];
        for d in 0..N {
            let g = grid_size[d] as i64;
            if array_size[d] % g != 0 {
                return Err(TileError::DivisibilityError {
                    dim: d,
                    array_size: array_size[d],
                    grid_size: grid_size[d],
                });
            }
            local_size[d] = array_size[d] / g;
        }

        let mut halo_left = [0i64; N];
        let mut halo_right = [0i64; N];
        for d in 0..N {
            let has_left_neighbour = coords[d] > 0 || periodic[d];
            let has_right_neighbour = coords[d] < grid_size[d] - 1 || periodic[d];
            halo_left[d] = if has_left_neighbour { halo_in[d] } else { halo_out[d] };
            halo_right[d] = if has_right_neighbour { halo_in[d] } else { halo_out[d] };

            if halo_left[d].max(halo_right[d]) >= local_size[d] {
                return Err(TileError::HaloTooLarge {
                    dim: d,
                    halo: halo_left[d].max(halo_right[d]),
                    local_size: local_size[d],
                });
            }
        }

        let mut raw_size = [0i64; N];
        for d in 0..N {
            raw_size[d] = local_size[d] + halo_left[d] + halo_right[d];
        }
        let total = raw_size.iter().product::<i64>() as usize;

        Ok(Self {
            layout,
            local_size,
            halo_left,
            halo_right,
            raw_size,
            data: vec![fill; total],
            bounds_check,
        })
    }
}

impl<T, const N: usize, Tr: Transport<N>> Tile<T, N, Tr> {
    pub fn layout(&self) -> &Arc<Layout<N, Tr>> {
        &self.layout
    }

    pub fn local_size(&self) -> [i64; N] {
        self.local_size
    }

    pub fn halo_left(&self) -> [i64; N] {
        self.halo_left
    }

    pub fn halo_right(&self) -> [i64; N] {
        self.halo_right
    }

    pub fn raw_size(&self) -> [i64; N] {
        self.raw_size
    }

    /// Halo point count along `d` for the given region tag: `halo_left`,
    /// `halo_right`, `local_size`, or `raw_size` for `LEFT`, `RIGHT`,
    /// `CENTER`, `WILDCARD` respectively.
    pub fn nhalo_points(&self, tag: BoundaryTag, dim: usize) -> i64 {
        match tag {
            BoundaryTag::Left => self.halo_left[dim],
            BoundaryTag::Right => self.halo_right[dim],
            BoundaryTag::Center => self.local_size[dim],
            BoundaryTag::Wildcard => self.raw_size[dim],
        }
    }

    fn raw_index(&self, indices: [i64; N]) -> Result<usize, TileError> {
        if self.bounds_check.tile {
            for d in 0..N {
                let lo = -self.halo_left[d];
                let hi = self.local_size[d] + self.halo_right[d];
                if indices[d] < lo || indices[d] >= hi {
                    return Err(TileError::OutOfRange {
                        dim: d,
                        index: indices[d],
                    });
                }
            }
        }
        let strides = raw_strides(self.raw_size);
        let mut offset = 0i64;
        for d in 0..N {
            offset += (indices[d] + self.halo_left[d]) * strides[d];
        }
        Ok(offset as usize)
    }

    /// Element at halo-inclusive index `indices` (each axis may range from
    /// `-halo_left[d]` to `local_size[d] + halo_right[d] - 1`).
    ///
    /// # Errors
    /// [`TileError::OutOfRange`] when the `check-bounds-tile` toggle is
    /// enabled and an index falls outside that range. When disabled,
    /// behavior on an illegal index is whatever `Vec` indexing does (a
    /// panic), matching spec's "undefined, may return an arbitrary
    /// element" allowance without reaching for `unsafe`.
    pub fn at(&self, indices: [i64; N]) -> Result<&T, TileError> {
        Ok(&self.data[self.raw_index(indices)?])
    }

    pub fn at_mut(&mut self, indices: [i64; N]) -> Result<&mut T, TileError> {
        let offset = self.raw_index(indices)?;
        Ok(&mut self.data[offset])
    }

    /// Flat (already-linear) access into the raw buffer, bypassing
    /// per-axis index translation. Supplements spec.md's Cartesian `at`
    /// with the linear form `original_source/include/darray.hpp` also
    /// exposes.
    pub fn raw(&self, linear: usize) -> &T {
        &self.data[linear]
    }

    pub fn raw_mut(&mut self, linear: usize) -> &mut T {
        &mut self.data[linear]
    }

    pub fn raw_len(&self) -> usize {
        self.data.len()
    }

    /// Iterate interior indices `0 <= i_d < local_size[d]`, first axis
    /// fastest-varying.
    pub fn indices(&self) -> IndicesIter<N> {
        IndicesIter::new(self.local_size)
    }
}

/// Column-major iterator over `0..size[d]` for each axis.
pub struct IndicesIter<const N: usize> {
    size: [i64; N],
    next: Option<[i64; N]>,
}

impl<const N: usize> IndicesIter<N> {
    fn new(size: [i64; N]) -> Self {
        let next = if size.iter().all(|&s| s > 0) {
            Some([0i64; N])
        } else {
            None
        };
        Self { size, next }
    }
}

impl<const N: usize> Iterator for IndicesIter<N> {
    type Item = [i64; N];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let mut carry = current;
        let mut done = true;
        for d in 0..N {
            carry[d] += 1;
            if carry[d] < self.size[d] {
                done = false;
                break;
            }
            carry[d] = 0;
        }
        self.next = if done { None } else { Some(carry) };
        Some(current)
    }
}

macro_rules! impl_fixed_arity_access {
    ($n:literal, $at:ident, $at_mut:ident, ($($arg:ident),+)) => {
        impl<T, Tr: Transport<$n>> Tile<T, $n, Tr> {
            pub fn $at(&self, $($arg: i64),+) -> Result<&T, TileError> {
                self.at([$($arg),+])
            }

            pub fn $at_mut(&mut self, $($arg: i64),+) -> Result<&mut T, TileError> {
                self.at_mut([$($arg),+])
            }
        }
    };
}

impl_fixed_arity_access!(1, at1, at1_mut, (i0));
impl_fixed_arity_access!(2, at2, at2_mut, (i0, i1));
impl_fixed_arity_access!(3, at3, at3_mut, (i0, i1, i2));

#[cfg(test)]
mod tests {
    use super::*;
    use halo_transport::serial::{SerialTransport, SerialWorld};

    fn single_rank_layout_1d() -> Arc<Layout<1, SerialTransport<1>>> {
        let world = SerialWorld::new(1);
        let transport = world.transport(0);
        Arc::new(Layout::new(transport, [1], [false], BoundsCheck::disabled()).unwrap())
    }

    fn two_rank_layout_1d(rank: i32, periodic: bool) -> Arc<Layout<1, SerialTransport<1>>> {
        let world = SerialWorld::new(2);
        let transport = world.transport(rank);
        Arc::new(Layout::new(transport, [2], [periodic], BoundsCheck::disabled()).unwrap())
    }

    #[test]
    fn divisibility_error_on_uneven_split() {
        let layout = two_rank_layout_1d(0, false);
        let err = Tile::<f64, 1, _>::new(layout, [5], [0], [0], BoundsCheck::disabled(), 0.0)
            .unwrap_err();
        assert!(matches!(err, TileError::DivisibilityError { .. }));
    }

    #[test]
    fn halo_too_large_is_rejected() {
        let layout = single_rank_layout_1d();
        let err = Tile::<f64, 1, _>::new(layout, [4], [2], [0], BoundsCheck::disabled(), 0.0)
            .unwrap_err();
        assert!(matches!(err, TileError::HaloTooLarge { .. }));
    }

    #[test]
    fn raw_size_includes_halos() {
        let layout = single_rank_layout_1d();
        let tile = Tile::<f64, 1, _>::new(layout, [4], [1], [0], BoundsCheck::disabled(), 0.0).unwrap();
        assert_eq!(tile.local_size(), [4]);
        assert_eq!(
            tile.raw_size()[0],
            4 + tile.halo_left()[0] + tile.halo_right()[0]
        );
    }

    #[test]
    fn element_access_maps_negative_indices_into_left_halo() {
        let layout = single_rank_layout_1d();
        let mut tile =
            Tile::<i32, 1, _>::new(layout, [4], [1], [0], BoundsCheck::enabled(), 0).unwrap();
        *tile.at_mut([-1]).unwrap() = 42;
        assert_eq!(*tile.at([-1]).unwrap(), 42);
    }

    #[test]
    fn out_of_range_access_errors_when_checked() {
        let layout = single_rank_layout_1d();
        let tile = Tile::<i32, 1, _>::new(layout, [4], [1], [0], BoundsCheck::enabled(), 0).unwrap();
        let err = tile.at([10]).unwrap_err();
        assert!(matches!(err, TileError::OutOfRange { .. }));
    }

    #[test]
    fn interior_indices_cover_local_size_in_order() {
        let layout = single_rank_layout_1d();
        let tile = Tile::<i32, 1, _>::new(layout, [4], [0], [0], BoundsCheck::disabled(), 0).unwrap();
        let collected: Vec<_> = tile.indices().collect();
        assert_eq!(collected, vec![[0], [1], [2], [3]]);
    }

    #[test]
    fn nhalo_points_reports_each_region_width() {
        let layout = single_rank_layout_1d();
        let tile = Tile::<i32, 1, _>::new(layout, [4], [2], [0], BoundsCheck::disabled(), 0).unwrap();
        assert_eq!(tile.nhalo_points(BoundaryTag::Left, 0), tile.halo_left()[0]);
        assert_eq!(tile.nhalo_points(BoundaryTag::Right, 0), tile.halo_right()[0]);
        assert_eq!(tile.nhalo_points(BoundaryTag::Center, 0), tile.local_size()[0]);
        assert_eq!(tile.nhalo_points(BoundaryTag::Wildcard, 0), tile.raw_size()[0]);
    }
}

//! spec.md §8 S5: 3-D, 3×3×3 grid, rank 13 = centre. Walks the full
//! `3^3 - 1` enumeration (not this crate's reduced `enumerate_boundaries`,
//! which only ever produces `2*N` entries) and checks every neighbour rank
//! against spec.md's axis-major table. The table's nesting order turns out
//! to be axis 2 slowest, axis 0 fastest.

use halo::config::BoundsCheck;
use halo::serial::SerialWorld;
use halo::{BoundaryTag, BoundarySpec, Layout};
use std::sync::Arc;

const EXPECTED: [i32; 26] = [
    0, 9, 18, 3, 12, 21, 6, 15, 24, 1, 10, 19, 4, 22, 7, 16, 25, 2, 11, 20, 5, 14, 23, 8, 17, 26,
];

#[test]
fn centre_rank_sees_all_26_neighbours_in_axis_major_order() {
    let world = SerialWorld::new(27);
    let transport = world.transport::<3>(13);
    let layout = Arc::new(
        Layout::new(transport, [3, 3, 3], [false, false, false], BoundsCheck::disabled()).unwrap(),
    );
    assert_eq!(layout.coords(), [1, 1, 1]);

    let tags = [BoundaryTag::Left, BoundaryTag::Center, BoundaryTag::Right];
    let mut actual = Vec::with_capacity(26);
    for &t2 in &tags {
        for &t1 in &tags {
            for &t0 in &tags {
                if t0 == BoundaryTag::Center && t1 == BoundaryTag::Center && t2 == BoundaryTag::Center {
                    continue;
                }
                let spec = BoundarySpec::new([t0, t1, t2]).unwrap();
                assert!(layout.has_neighbour_at(&spec));
                actual.push(layout.rank_of_neighbour_at(&spec));
            }
        }
    }

    assert_eq!(actual, EXPECTED);
}

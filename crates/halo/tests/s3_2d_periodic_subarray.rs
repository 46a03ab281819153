//! spec.md §8 S3: 2-D, periodic×periodic, 3×9 grid, local 2×2, halo 1/1.
//! Checks the literal SEND/RECV window geometry the reduced enumeration
//! produces for the `L*` and `CL` regions.

use halo::config::BoundsCheck;
use halo::serial::SerialWorld;
use halo::{BoundaryTag, BoundarySpec, Intent, Layout, Subarray, Tile};
use std::sync::Arc;

#[test]
fn l_star_and_cl_windows_match_the_spec_table() {
    let world = SerialWorld::new(27);
    let transport = world.transport::<2>(0);
    let layout =
        Arc::new(Layout::new(transport, [3, 9], [true, true], BoundsCheck::disabled()).unwrap());
    let tile =
        Tile::<f64, 2, _>::new(layout, [6, 18], [1, 1], [1, 1], BoundsCheck::disabled(), 0.0)
            .unwrap();

    assert_eq!(tile.halo_left(), [1, 1]);
    assert_eq!(tile.halo_right(), [1, 1]);

    let l_star = BoundarySpec::new([BoundaryTag::Left, BoundaryTag::Wildcard]).unwrap();
    let send = Subarray::new(&tile, &l_star, Intent::Send).unwrap();
    assert_eq!(send.size(), [1, 4]);
    assert_eq!(send.raw_origin(), [1, 0]);
    let recv = Subarray::new(&tile, &l_star, Intent::Recv).unwrap();
    assert_eq!(recv.size(), [1, 4]);
    assert_eq!(recv.raw_origin(), [0, 0]);

    let cl = BoundarySpec::new([BoundaryTag::Center, BoundaryTag::Left]).unwrap();
    let send = Subarray::new(&tile, &cl, Intent::Send).unwrap();
    assert_eq!(send.size(), [2, 1]);
    assert_eq!(send.raw_origin(), [1, 1]);
    let recv = Subarray::new(&tile, &cl, Intent::Recv).unwrap();
    assert_eq!(recv.size(), [2, 1]);
    assert_eq!(recv.raw_origin(), [1, 0]);
}

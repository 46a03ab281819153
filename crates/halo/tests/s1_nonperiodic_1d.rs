//! spec.md §8 S1: 1-D, non-periodic, 27 ranks, local size 5, halo_in 4,
//! halo_out 2. Drives every rank on its own OS thread over a shared
//! `SerialWorld`, since halo exchange is inherently a multi-process story.

use halo::config::BoundsCheck;
use halo::serial::SerialWorld;
use halo::{Layout, Tile};
use std::sync::Arc;
use std::thread;

const NPROCS: i32 = 27;
const LOCAL: i64 = 5;
const HALO_IN: i64 = 4;
const HALO_OUT: i64 = 2;

#[test]
fn interior_halo_matches_neighbour_rank_and_interior_is_untouched() {
    let world = SerialWorld::new(NPROCS);
    let handles: Vec<_> = (0..NPROCS)
        .map(|rank| {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                let transport = world.transport::<1>(rank);
                let layout = Arc::new(
                    Layout::new(transport, [NPROCS], [false], BoundsCheck::enabled()).unwrap(),
                );
                let mut tile = Tile::<i64, 1, _>::new(
                    layout,
                    [NPROCS as i64 * LOCAL],
                    [HALO_OUT],
                    [HALO_IN],
                    BoundsCheck::enabled(),
                    rank as i64,
                )
                .unwrap();

                tile.swap_halo().unwrap();

                let hl = tile.halo_left()[0];
                let hr = tile.halo_right()[0];
                (rank, hl, hr, tile)
            })
        })
        .collect();

    for h in handles {
        let (rank, hl, hr, tile) = h.join().unwrap();

        // interior is left exactly as constructed
        for i in 0..LOCAL {
            assert_eq!(*tile.at([i]).unwrap(), rank as i64, "interior cell {i} changed");
        }

        if rank > 0 {
            for i in -hl..0 {
                assert_eq!(*tile.at([i]).unwrap(), (rank - 1) as i64);
            }
        } else {
            // no left neighbour: halo_left is the boundary-condition width
            // and swap_halo never touches it.
            assert_eq!(hl, HALO_OUT);
            for i in -hl..0 {
                assert_eq!(*tile.at([i]).unwrap(), rank as i64);
            }
        }

        if rank < NPROCS - 1 {
            for i in LOCAL..LOCAL + hr {
                assert_eq!(*tile.at([i]).unwrap(), (rank + 1) as i64);
            }
        } else {
            assert_eq!(hr, HALO_OUT);
            for i in LOCAL..LOCAL + hr {
                assert_eq!(*tile.at([i]).unwrap(), rank as i64);
            }
        }

        if rank == 0 {
            assert_eq!(tile.raw_size()[0], LOCAL + HALO_OUT + HALO_IN);
        } else if rank == NPROCS - 1 {
            assert_eq!(tile.raw_size()[0], LOCAL + HALO_IN + HALO_OUT);
        } else {
            assert_eq!(tile.raw_size()[0], LOCAL + 2 * HALO_IN);
        }
    }
}

#[test]
fn second_swap_is_bit_identical() {
    let world = SerialWorld::new(NPROCS);
    let handles: Vec<_> = (0..NPROCS)
        .map(|rank| {
            let world = Arc::clone(&world);
            thread::spawn(move || {
                let transport = world.transport::<1>(rank);
                let layout = Arc::new(
                    Layout::new(transport, [NPROCS], [false], BoundsCheck::disabled()).unwrap(),
                );
                let mut tile = Tile::<i64, 1, _>::new(
                    layout,
                    [NPROCS as i64 * LOCAL],
                    [HALO_OUT],
                    [HALO_IN],
                    BoundsCheck::disabled(),
                    rank as i64,
                )
                .unwrap();
                tile.swap_halo().unwrap();
                let snapshot: Vec<i64> = (0..tile.raw_len()).map(|i| *tile.raw(i)).collect();
                tile.swap_halo().unwrap();
                let after: Vec<i64> = (0..tile.raw_len()).map(|i| *tile.raw(i)).collect();
                assert_eq!(snapshot, after);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

//! Runnable 2-D diffusion stencil demo: partitions a global grid across a
//! simulated Cartesian process grid, seeds a hot spot at the centre, and
//! steps a 5-point Jacobi diffusion update between `swap_halo()` calls.
//!
//! Every "process" is an OS thread sharing one `SerialWorld`, the same
//! pattern `halo_transport::serial`'s own tests use to exercise the
//! blocking paired `sendrecv` without a real MPI runtime. Grounded in
//! `original_source/benchmarks/bench.cpp`'s stencil-over-`DArray` shape,
//! generalized from its in-place 7-point 3-D sweep to a correctly
//! double-buffered 2-D one (the original mutates its single array in
//! place mid-sweep, which this demo's double buffering avoids) and to
//! spec.md §8 S3's 2-D grid.

use anyhow::{Context, Result};
use halo::prelude::*;
use std::mem;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;

const GRID: [i32; 2] = [3, 3];
const LOCAL_SIZE: [i64; 2] = [12, 12];
const STEPS: usize = 200;
const HOT_SPOT_VALUE: f64 = 100.0;

fn global_size() -> [i64; 2] {
    [
        GRID[0] as i64 * LOCAL_SIZE[0],
        GRID[1] as i64 * LOCAL_SIZE[1],
    ]
}

fn run_rank(world: Arc<SerialWorld>, rank: i32) -> Result<(i32, f64)> {
    let transport = world.transport::<2>(rank);
    let layout = Arc::new(
        Layout::new(transport, GRID, [false, false], BoundsCheck::disabled())
            .context("building layout")?,
    );

    // halo_out = 1 too: boundary ranks still get a one-layer halo, it's
    // just never refreshed by swap_halo. It stays at its initial zero,
    // which is this demo's (Dirichlet) boundary condition.
    let mut cur = Tile::<f64, 2, _>::new(
        Arc::clone(&layout),
        global_size(),
        [1, 1],
        [1, 1],
        BoundsCheck::disabled(),
        0.0,
    )
    .context("building current tile")?;
    let mut next = Tile::<f64, 2, _>::new(
        Arc::clone(&layout),
        global_size(),
        [1, 1],
        [1, 1],
        BoundsCheck::disabled(),
        0.0,
    )
    .context("building next tile")?;

    let coords = layout.coords();
    let global = global_size();
    let centre = [global[0] / 2, global[1] / 2];
    for [i, j] in cur.indices() {
        let gi = coords[0] as i64 * LOCAL_SIZE[0] + i;
        let gj = coords[1] as i64 * LOCAL_SIZE[1] + j;
        if gi == centre[0] && gj == centre[1] {
            *cur.at2_mut(i, j)? = HOT_SPOT_VALUE;
        }
    }

    for step in 0..STEPS {
        cur.swap_halo().context("swap_halo")?;
        for [i, j] in cur.indices() {
            let sum = *cur.at2(i - 1, j)?
                + *cur.at2(i + 1, j)?
                + *cur.at2(i, j - 1)?
                + *cur.at2(i, j + 1)?;
            *next.at2_mut(i, j)? = 0.25 * sum;
        }
        mem::swap(&mut cur, &mut next);
        if step % 50 == 0 {
            info!(rank, step, "diffusion step");
        }
    }

    let mut local_sum = 0.0;
    for [i, j] in cur.indices() {
        local_sum += *cur.at2(i, j).context("summing interior")?;
    }
    Ok((rank, local_sum))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let nprocs = GRID[0] * GRID[1];
    let world = SerialWorld::new(nprocs);
    let start = Instant::now();

    let handles: Vec<_> = (0..nprocs)
        .map(|rank| {
            let world = Arc::clone(&world);
            thread::spawn(move || run_rank(world, rank))
        })
        .collect();

    let mut total = 0.0;
    for handle in handles {
        let (rank, local_sum) = handle
            .join()
            .map_err(|_| anyhow::anyhow!("rank thread panicked"))??;
        total += local_sum;
        info!(rank, local_sum, "rank finished");
    }

    println!(
        "{} ranks, {} steps, total mass {:.6}, elapsed {:?}",
        nprocs,
        STEPS,
        total,
        start.elapsed()
    );
    Ok(())
}

//! Micro-benchmarks for cofiber
//!
//! Measures fiber create+join cost and yield round-trip latency.

use cofiber::{FiberId, FiberPool, PoolConfig};
use std::time::Instant;

extern "C" fn nop(_arg: usize, _id: FiberId) -> usize {
    0
}

struct YieldCtx {
    pool: *const FiberPool,
    rounds: usize,
}

extern "C" fn yielder(arg: usize, id: FiberId) -> usize {
    let ctx = unsafe { &*(arg as *const YieldCtx) };
    let pool = unsafe { &*ctx.pool };
    for _ in 0..ctx.rounds {
        pool.yield_to_next(id);
    }
    0
}

fn main() {
    println!("=== cofiber benchmarks ===\n");

    let config = PoolConfig::from_env().capacity(8).stack_size(256 * 1024);
    let pool = FiberPool::new(config).expect("failed to initialize the fiber pool");

    bench_create_join(&pool);
    bench_yield_round_trip(&pool);

    println!("=== benchmarks complete ===");
}

fn bench_create_join(pool: &FiberPool) {
    println!("Benchmark: create + join");

    let iterations = 10_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let id = pool.create(nop, 0).expect("create failed");
        pool.join(id, FiberId::CONTROLLER).expect("join failed");
    }
    let elapsed = start.elapsed();

    println!("  Iterations:  {}", iterations);
    println!("  Total time:  {:?}", elapsed);
    println!(
        "  Per fiber:   {:.1} ns\n",
        elapsed.as_nanos() as f64 / iterations as f64
    );
}

fn bench_yield_round_trip(pool: &FiberPool) {
    println!("Benchmark: yield round-trip");

    let rounds = 100_000;
    let ctx = YieldCtx { pool, rounds };
    let id = pool
        .create(yielder, &ctx as *const YieldCtx as usize)
        .expect("create failed");

    let start = Instant::now();
    while pool.state(id).expect("state failed").is_runnable() {
        pool.yield_to_next(FiberId::CONTROLLER);
    }
    let elapsed = start.elapsed();
    pool.join(id, FiberId::CONTROLLER).expect("join failed");

    // Each round is two switches: controller -> fiber -> controller
    println!("  Round trips: {}", rounds);
    println!("  Total time:  {:?}", elapsed);
    println!(
        "  Per switch:  {:.1} ns\n",
        elapsed.as_nanos() as f64 / (rounds as f64 * 2.0)
    );
}

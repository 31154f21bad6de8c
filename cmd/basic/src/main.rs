//! Basic cofiber demo
//!
//! Five fibers each greet three times with a voluntary yield after every
//! greeting, then return the value they were given. The controller
//! yields once to kick the rotation off, then joins them in reverse
//! creation order.
//!
//! # Environment Variables
//!
//! - `FIB_DEBUG=1` - Emit scheduling events
//! - `FIB_LOG_LEVEL=debug` - Show them on stderr

use cofiber::{FiberId, FiberPool, PoolConfig};

/// Per-fiber context handed through the opaque argument word
struct Greeter {
    pool: *const FiberPool,
    x: u64,
}

extern "C" fn greet(arg: usize, id: FiberId) -> usize {
    let ctx = unsafe { &*(arg as *const Greeter) };
    let pool = unsafe { &*ctx.pool };
    for _ in 0..3 {
        println!("Hello, world from fiber {}, got arg x={}", id, ctx.x);
        pool.yield_to_next(id);
    }
    ctx.x as usize
}

fn main() {
    let config = PoolConfig::from_env().capacity(8);
    let pool = FiberPool::new(config).expect("failed to initialize the fiber pool");

    let greeters: Vec<Greeter> = [10u64, 20, 30, 40, 50]
        .iter()
        .map(|&x| Greeter { pool: &pool, x })
        .collect();

    let ids: Vec<FiberId> = greeters
        .iter()
        .map(|g| {
            pool.create(greet, g as *const Greeter as usize)
                .expect("failed to create fiber")
        })
        .collect();

    pool.yield_to_next(FiberId::CONTROLLER);

    for id in ids.iter().rev() {
        let result = pool.join(*id, FiberId::CONTROLLER).expect("join failed");
        println!("fiber {} result: {}", id, result);
    }

    println!("finish main");
}

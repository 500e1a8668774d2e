//! Demonstration driver for `pagepool`.
//!
//! Walks through a small asset-loading-shaped sequence of allocations and
//! frees, printing a memory dump before and after, so the splitting and
//! coalescing behavior can be eyeballed.

use pagepool::{units::MEGA, PagePool, PagePoolConfig};
use std::io::stdout;

fn main() {
    env_logger::init();

    let config = PagePoolConfig::new(MEGA, 64);
    let mut pool = PagePool::new(config);

    println!("-- fresh pool --");
    pool.dump(&mut stdout()).unwrap();

    let vertex_buffer = pool.allocate(4096).expect("vertex buffer alloc");
    let texture = pool.allocate(64 * 1024).expect("texture alloc");
    let small_scratch = pool.allocate(128).expect("scratch alloc");

    println!("-- after three allocations --");
    pool.dump(&mut stdout()).unwrap();

    unsafe {
        pool.free(small_scratch);
        pool.free(texture);
    }

    println!("-- after freeing texture and scratch (coalesced) --");
    pool.dump(&mut stdout()).unwrap();

    unsafe {
        pool.free(vertex_buffer);
    }
}

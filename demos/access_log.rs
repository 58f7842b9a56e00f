use std::sync::Arc;
use std::thread;
use std::time::Instant;

use iptracker::{replay, TopKTracker};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const WORKERS: usize = 4;
const LINES_PER_WORKER: usize = 250_000;

// Synthesize an access log where low-numbered hosts send far more requests
fn synthetic_log(worker: usize) -> String {
    let mut log = String::with_capacity(LINES_PER_WORKER * 48);
    let mut rng = SmallRng::seed_from_u64(worker as u64);
    for _ in 0..LINES_PER_WORKER {
        let uniform: f64 = rng.random();
        let host = (uniform * uniform * uniform * 5_000.0) as u64;
        log.push_str(&format!("192.168.{}.{} - - \"GET / HTTP/1.1\" 200\n", host / 256, host % 256));
    }
    log
}

fn main() {
    let tracker = Arc::new(TopKTracker::new());

    let start = Instant::now();
    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                let log = synthetic_log(worker);
                replay(log.as_bytes(), 0, tracker.as_ref())
            })
        })
        .collect();

    let mut recorded = 0;
    for handle in handles {
        recorded += handle.join().unwrap().recorded;
    }
    let duration = start.elapsed();

    println!("recorded {} requests from {} addresses in {:?}", recorded, tracker.len(), duration);
    for (rank, entry) in tracker.top().iter().take(10).enumerate() {
        println!("{:>3}. {:<16} {}", rank + 1, entry.key, entry.count);
    }
}

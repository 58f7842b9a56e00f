use std::num::NonZeroUsize;

use iptracker::TopKTracker;

fn main() {
    // Rank the 3 busiest addresses instead of the default 100
    let capacity = NonZeroUsize::new(3).unwrap();
    let tracker = TopKTracker::with_capacity(capacity);

    let requests = [
        ("10.0.0.1", 5),
        ("10.0.0.2", 3),
        ("10.0.0.3", 1),
        ("10.0.0.4", 4),
    ];
    for (address, times) in requests {
        for _ in 0..times {
            tracker.record(address).unwrap();
        }
    }

    println!("Busiest addresses:");
    for entry in tracker.top() {
        println!("{}: {}", entry.key, entry.count);
    }

    // Counts stay exact for addresses that dropped out of the ranking
    let address = "10.0.0.3";
    println!("\nCount for '{}': {}", address, tracker.count(address));
    println!("Is '{}' ranked? {}",
        address,
        if tracker.is_ranked(address) { "yes" } else { "no" });

    tracker.reset();
    println!("\nAfter reset: {} ranked addresses", tracker.top().len());
}

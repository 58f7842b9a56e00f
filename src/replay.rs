use tracing::{debug, info};

use crate::tracker::RequestTracker;

/// Outcome of feeding a block of log lines into a tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub recorded: u64,
    pub skipped: u64,
}

/// Records one request per line of `input`.
///
/// The key is the whitespace-separated field at index `field` (0-based), so
/// `field = 0` takes the client address from common/combined access logs.
/// Empty lines are ignored. Lines that are not UTF-8, lines with too few
/// fields and keys the tracker rejects are counted as skipped.
pub fn replay<T>(input: &[u8], field: usize, tracker: &T) -> ReplayStats
where
    T: RequestTracker + ?Sized,
{
    let mut stats = ReplayStats::default();

    let lines = input
        .split(|byte| *byte == b'\n')
        .enumerate()
        .filter(|(_, line)| !line.is_empty());

    for (number, line) in lines {
        let key = std::str::from_utf8(line)
            .ok()
            .and_then(|line| line.split_whitespace().nth(field));

        let Some(key) = key else {
            debug!(line = number + 1, "no key on line");
            stats.skipped += 1;
            continue;
        };

        match tracker.record(key) {
            Ok(_) => stats.recorded += 1,
            Err(err) => {
                debug!(line = number + 1, %err, "skipping line");
                stats.skipped += 1;
            }
        }
    }

    info!(recorded = stats.recorded, skipped = stats.skipped, "replay finished");
    stats
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Named, nestable timings, reported through `log` at debug level
//! under the `seamgrid::profiler` target.  A measurement that began
//! inside another reports both its own time and, for the outer one,
//! the time left after its children are subtracted.

use log::{debug, warn};
use std::time::{Duration, Instant};

struct Measurement {
    name: String,
    started: Instant,
    min_duration: Duration,
    nested: Duration,
}

#[derive(Default)]
pub struct Profiler {
    active: Vec<Measurement>,
}

impl Profiler {
    pub fn new() -> Self {
        Profiler::default()
    }

    /// Begin timing `name`.  When it ends in less than `min_duration`
    /// it is not reported, and does not count against its parent.
    pub fn start(&mut self, name: &str, min_duration: Duration) {
        self.active.push(Measurement {
            name: name.to_string(),
            started: Instant::now(),
            min_duration,
            nested: Duration::default(),
        });
    }

    /// Stop timing `name`, closing anything started inside it that was
    /// never ended.  Returns the elapsed time if it was reported.
    pub fn end(&mut self, name: &str) -> Option<Duration> {
        let position = match self.active.iter().rposition(|m| m.name == name) {
            Some(position) => position,
            None => {
                warn!(target: "seamgrid::profiler", "{}: ended but never started", name);
                return None;
            }
        };
        self.active.truncate(position + 1);
        let measurement = self.active.pop()?;
        let elapsed = measurement.started.elapsed();
        if elapsed < measurement.min_duration {
            return None;
        }

        if let Some(parent) = self.active.last_mut() {
            parent.nested += elapsed;
        }
        if measurement.nested > Duration::default() {
            debug!(
                target: "seamgrid::profiler",
                "{}: {:.2}ms ({:.2}ms)",
                name,
                millis(elapsed.checked_sub(measurement.nested).unwrap_or_default()),
                millis(elapsed)
            );
        } else {
            debug!(target: "seamgrid::profiler", "{}: {:.2}ms", name, millis(elapsed));
        }
        Some(elapsed)
    }

    /// Measurements started and not yet ended.
    pub fn depth(&self) -> usize {
        self.active.len()
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn short_measurements_are_suppressed() {
        let mut profiler = Profiler::new();
        profiler.start("quick", Duration::from_secs(60));
        assert_eq!(profiler.end("quick"), None);
        assert_eq!(profiler.depth(), 0);
    }

    #[test]
    fn nested_time_is_charged_to_the_parent() {
        let mut profiler = Profiler::new();
        profiler.start("outer", Duration::default());
        profiler.start("inner", Duration::default());
        sleep(Duration::from_millis(5));
        let inner = profiler.end("inner").unwrap();
        let outer = profiler.end("outer").unwrap();
        assert!(outer >= inner);
        assert_eq!(profiler.depth(), 0);
    }

    #[test]
    fn unmatched_ends_are_ignored() {
        let mut profiler = Profiler::new();
        profiler.start("outer", Duration::default());
        profiler.start("forgotten", Duration::default());
        assert_eq!(profiler.end("never"), None);
        assert_eq!(profiler.depth(), 2);
        assert!(profiler.end("outer").is_some());
        assert_eq!(profiler.depth(), 0);
    }
}

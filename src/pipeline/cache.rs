//! Latest-result cache.
//!
//! A worker publishes its most recent output here; any number of readers poll
//! it without ever blocking the writer for longer than the assignment itself.
//! No history is retained: a superseded result is worthless.
//!
//! Single-writer discipline is enforced at the type level: `result_cache()`
//! hands out exactly one `ResultWriter` (not `Clone`) and a `ResultReader`
//! that can be cloned freely.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Shared<R> {
    value: Mutex<Option<R>>,
}

/// Writing half. Owned by exactly one worker.
pub struct ResultWriter<R> {
    shared: Arc<Shared<R>>,
}

/// Reading half. Clonable, never blocks, never consumes.
pub struct ResultReader<R> {
    shared: Arc<Shared<R>>,
}

/// Create a connected writer/reader pair.
pub fn result_cache<R>() -> (ResultWriter<R>, ResultReader<R>) {
    let shared = Arc::new(Shared {
        value: Mutex::new(None),
    });
    (
        ResultWriter {
            shared: Arc::clone(&shared),
        },
        ResultReader { shared },
    )
}

impl<R> ResultWriter<R> {
    /// Replace the cached value. The lock is held only for the assignment, so
    /// readers observe either the old value or the new one, never a partial
    /// write.
    pub fn publish(&self, value: R) {
        *lock_unpoisoned(&self.shared.value) = Some(value);
    }
}

impl<R: Clone> ResultReader<R> {
    /// Current value, or `None` if nothing has been published yet.
    pub fn read(&self) -> Option<R> {
        lock_unpoisoned(&self.shared.value).clone()
    }

    pub fn has_value(&self) -> bool {
        lock_unpoisoned(&self.shared.value).is_some()
    }
}

impl<R> Clone for ResultReader<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

// Poison can only arise from a panic inside the assignment; the stored Option
// is still coherent.
fn lock_unpoisoned<R>(mutex: &Mutex<Option<R>>) -> MutexGuard<'_, Option<R>> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn reads_none_before_first_publish() {
        let (_writer, reader) = result_cache::<u32>();
        assert_eq!(reader.read(), None);
        assert!(!reader.has_value());
    }

    #[test]
    fn read_returns_latest_published_value() {
        let (writer, reader) = result_cache();
        writer.publish(1u32);
        writer.publish(2);
        assert_eq!(reader.read(), Some(2));
        // Reading does not consume.
        assert_eq!(reader.read(), Some(2));
    }

    #[test]
    fn cloned_readers_see_the_same_value() {
        let (writer, reader) = result_cache();
        let other = reader.clone();
        writer.publish("x");
        assert_eq!(reader.read(), Some("x"));
        assert_eq!(other.read(), Some("x"));
    }

    #[test]
    fn read_never_blocks_under_publish_load() {
        let (writer, reader) = result_cache();
        let stop = Arc::new(AtomicBool::new(false));

        let publisher = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut n = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    writer.publish(n);
                    n += 1;
                }
            })
        };

        // Hammer reads for a while; each individual read must complete fast.
        let deadline = Instant::now() + Duration::from_millis(200);
        while Instant::now() < deadline {
            let start = Instant::now();
            let _ = reader.read();
            assert!(
                start.elapsed() < Duration::from_millis(100),
                "read stalled behind a publisher"
            );
        }

        stop.store(true, Ordering::Relaxed);
        publisher.join().unwrap();
        assert!(reader.has_value());
    }
}

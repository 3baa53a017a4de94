use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

static PROCESS_WIDE: LazyLock<Arc<SizeCache>> = LazyLock::new(|| Arc::new(SizeCache::new()));

/// The smallest number of mask words known to hold the kernel's CPU affinity mask.
///
/// Affinity queries start probing with this many words and publish the size that worked, so
/// that later queries do not have to repeat the search. The value starts at 1 and never
/// decreases, even when many threads publish concurrently.
///
/// The value is only a sizing hint: a query that starts too small simply grows its buffer and
/// retries. Every [`AffinityChannel`][crate::AffinityChannel] created via
/// [`AffinityChannel::new()`][crate::AffinityChannel::new] shares the process-wide instance
/// returned by [`SizeCache::process_wide()`]; create your own instance to keep a channel
/// isolated from it.
#[derive(Debug)]
pub struct SizeCache {
    min_words: AtomicUsize,
}

impl SizeCache {
    /// Creates a cache that starts at one word.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_words: AtomicUsize::new(1),
        }
    }

    /// The cache shared by all default affinity channels in this process.
    #[must_use]
    pub fn process_wide() -> Arc<Self> {
        Arc::clone(&PROCESS_WIDE)
    }

    /// The currently known sufficient mask size, in words.
    #[must_use]
    pub fn min_words(&self) -> usize {
        // Relaxed is enough because the value is only a hint and guards no other memory.
        self.min_words.load(Ordering::Relaxed)
    }

    /// Records that `words` words were enough to hold a mask.
    ///
    /// Returns `true` if this call raised the cached size. Returns `false` if the cache
    /// already held `words` or more, possibly because a concurrent caller got there first.
    pub fn grow_to(&self, words: usize) -> bool {
        let mut current = self.min_words.load(Ordering::Relaxed);

        while current < words {
            match self.min_words.compare_exchange_weak(
                current,
                words,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }

        false
    }
}

impl Default for SizeCache {
    fn default() -> Self {
        Self::new()
    }
}

use std::num::NonZero;
use std::sync::Arc;

use new_zealand::nz;
use tracing::{debug, trace};

use crate::pal::{BUFFER_TOO_SMALL, Bindings, BindingsFacade};
use crate::{CpuSet, Error, SizeCache, TaskId, Word};

const WORD_BYTES: usize = size_of::<Word>();

/// 16384 words hold a mask of 1M CPUs, far beyond any kernel configuration we know of.
const DEFAULT_MAX_WORDS: NonZero<usize> = nz!(16_384);

/// Queries and changes the CPU affinity of tasks via the operating system.
///
/// The kernel's CPU mask may be larger than the fixed-size mask type of the C library, so the
/// mask size is discovered at runtime: a query starts with the size recorded in the channel's
/// [`SizeCache`] and doubles the buffer until the kernel accepts it. The size that worked is
/// published back to the cache for later queries.
///
/// # Example
///
/// ```
/// use cpumask::{AffinityChannel, CALLER};
///
/// let channel = AffinityChannel::new();
///
/// # if cfg!(target_os = "linux") {
/// let allowed = channel.affinity(CALLER).unwrap();
/// println!("The current thread may run on CPUs {allowed}");
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct AffinityChannel {
    bindings: BindingsFacade,
    size_cache: Arc<SizeCache>,
    max_words: NonZero<usize>,
}

impl AffinityChannel {
    /// Creates a channel to the operating system that shares the process-wide [`SizeCache`].
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a channel with custom settings.
    #[must_use]
    pub fn builder() -> AffinityChannelBuilder {
        AffinityChannelBuilder::new()
    }

    /// The size cache this channel reads and advances.
    #[must_use]
    pub fn size_cache(&self) -> &Arc<SizeCache> {
        &self.size_cache
    }

    /// Returns the CPU affinity mask of the task identified by `task`, or of the calling thread
    /// if `task` is [`CALLER`][crate::CALLER].
    ///
    /// The returned set has exactly as many words as the buffer the kernel accepted, so it may
    /// carry trailing all-zero words.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Os`] with the operating system error if the query fails, e.g. because
    /// there is no task with the given identifier. If the kernel still rejects the buffer as
    /// too small once the configured maximum size is reached, that rejection is returned.
    pub fn affinity(&self, task: TaskId) -> crate::Result<CpuSet> {
        let max_words = self.max_words.get();
        let mut words = self.size_cache.min_words().clamp(1, max_words);

        loop {
            let mut mask = vec![0_u8; words * WORD_BYTES];

            match self.bindings.sched_getaffinity(task, &mut mask) {
                Ok(written) => {
                    trace!(task, words, written, "queried CPU affinity");

                    if self.size_cache.grow_to(words) {
                        debug!(words, "raised cached affinity mask size");
                    }

                    return Ok(CpuSet::from_words(decode(&mask)));
                }
                Err(error)
                    if error.raw_os_error() == Some(BUFFER_TOO_SMALL) && words < max_words =>
                {
                    let next = words.saturating_mul(2).min(max_words);
                    debug!(task, words, next, "affinity mask buffer too small, growing");
                    words = next;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Restricts the task identified by `task` (or the calling thread if `task` is
    /// [`CALLER`][crate::CALLER]) to run only on the CPUs in `cpus`.
    ///
    /// The change is a single system call: it either applies in full or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] without calling the operating system if `cpus` has no
    /// members, as that would leave the task nowhere to run. Returns [`Error::Os`] with the
    /// operating system error if the operating system rejects the mask.
    pub fn set_affinity(&self, task: TaskId, cpus: &CpuSet) -> crate::Result<()> {
        if cpus.is_empty() {
            debug!(task, "refusing to set an empty CPU affinity mask");

            return Err(Error::InvalidArgument {
                problem: "cannot set an empty CPU affinity mask".to_string(),
            });
        }

        self.bindings
            .sched_setaffinity(task, &encode(cpus.words()))?;

        trace!(task, %cpus, "set CPU affinity");

        Ok(())
    }
}

impl Default for AffinityChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Configures an [`AffinityChannel`].
///
/// # Example
///
/// ```
/// use std::num::NonZero;
/// use std::sync::Arc;
///
/// use cpumask::{AffinityChannel, SizeCache};
///
/// // Keep this channel's size discovery separate from the rest of the process.
/// let channel = AffinityChannel::builder()
///     .size_cache(Arc::new(SizeCache::new()))
///     .max_words(NonZero::new(64).unwrap())
///     .build();
/// # _ = channel;
/// ```
#[derive(Debug)]
#[must_use]
pub struct AffinityChannelBuilder {
    bindings: BindingsFacade,
    size_cache: Option<Arc<SizeCache>>,
    max_words: NonZero<usize>,
}

impl AffinityChannelBuilder {
    fn new() -> Self {
        Self {
            bindings: BindingsFacade::target(),
            size_cache: None,
            max_words: DEFAULT_MAX_WORDS,
        }
    }

    /// Uses `size_cache` instead of the process-wide [`SizeCache`].
    pub fn size_cache(mut self, size_cache: Arc<SizeCache>) -> Self {
        self.size_cache = Some(size_cache);
        self
    }

    /// The largest mask, in words, that affinity queries will try before giving up.
    ///
    /// Defaults to 16384 words (1M CPUs).
    pub fn max_words(mut self, max_words: NonZero<usize>) -> Self {
        self.max_words = max_words;
        self
    }

    #[cfg(test)]
    fn bindings(mut self, bindings: BindingsFacade) -> Self {
        self.bindings = bindings;
        self
    }

    /// Creates the channel.
    #[must_use]
    pub fn build(self) -> AffinityChannel {
        AffinityChannel {
            bindings: self.bindings,
            size_cache: self.size_cache.unwrap_or_else(SizeCache::process_wide),
            max_words: self.max_words,
        }
    }
}

/// Returns the CPU affinity mask of a task using the process-wide [`SizeCache`].
///
/// Shorthand for [`AffinityChannel::affinity()`] on a default channel.
///
/// # Errors
///
/// See [`AffinityChannel::affinity()`].
pub fn affinity(task: TaskId) -> crate::Result<CpuSet> {
    AffinityChannel::new().affinity(task)
}

/// Restricts a task to run only on the CPUs in `cpus`.
///
/// Shorthand for [`AffinityChannel::set_affinity()`] on a default channel.
///
/// # Errors
///
/// See [`AffinityChannel::set_affinity()`].
pub fn set_affinity(task: TaskId, cpus: &CpuSet) -> crate::Result<()> {
    AffinityChannel::new().set_affinity(task, cpus)
}

fn encode(words: &[Word]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_ne_bytes()).collect()
}

fn decode(mask: &[u8]) -> Vec<Word> {
    mask.chunks_exact(WORD_BYTES)
        .map(|chunk| {
            let mut bytes = [0; WORD_BYTES];
            bytes.copy_from_slice(chunk);
            Word::from_ne_bytes(bytes)
        })
        .collect()
}

/// Identifies a specific logical processor.
///
/// This matches the 0-based CPU number used by the operating system, e.g. in
/// `/proc/self/status` or in the output of `taskset`. The value carries no topology meaning.
pub type CpuId = u32;

/// Identifies the task (thread) or process whose CPU affinity is queried or changed.
///
/// Use [`CALLER`] to refer to the calling thread.
pub type TaskId = i32;

/// The [`TaskId`] that refers to the calling thread.
///
/// When you use this, make sure the logic in question is not moved to a different operating
/// system thread between calls (e.g. by an async runtime), or you will be working with the
/// affinity of some other thread.
pub const CALLER: TaskId = 0;

/// One machine word of a [`CpuSet`][crate::CpuSet], holding the membership bits of
/// [`WORD_BITS`] consecutive CPUs. The lowest bit is the lowest CPU number.
pub type Word = u64;

/// How many CPUs are covered by one [`Word`].
pub const WORD_BITS: u32 = Word::BITS;

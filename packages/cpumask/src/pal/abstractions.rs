#![cfg_attr(
    test,
    expect(
        clippy::struct_field_names,
        reason = "false positive from automock generated code"
    )
)]

use std::fmt::Debug;
use std::io;

use crate::TaskId;

/// Bindings for the affinity system calls of the operating system.
///
/// Masks cross this boundary as plain byte buffers in the layout the kernel uses (an array of
/// native-endian machine words, lowest CPUs first), so the bit algebra never shares memory with
/// the kernel directly.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait Bindings: Debug + Send + Sync + 'static {
    /// `sched_getaffinity()` for the given task (0 means the calling thread).
    ///
    /// Fills `mask` and returns how many bytes the kernel wrote. Fails with the error code
    /// [`BUFFER_TOO_SMALL`][crate::pal::BUFFER_TOO_SMALL] if `mask` cannot hold the kernel's
    /// CPU mask.
    fn sched_getaffinity(&self, task: TaskId, mask: &mut [u8]) -> Result<usize, io::Error>;

    /// `sched_setaffinity()` for the given task (0 means the calling thread).
    fn sched_setaffinity(&self, task: TaskId, mask: &[u8]) -> Result<(), io::Error>;
}

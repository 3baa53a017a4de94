use std::io;

use crate::TaskId;
use crate::pal::Bindings;

/// The error code the kernel reports when the mask buffer is smaller than its CPU mask.
pub(crate) const BUFFER_TOO_SMALL: i32 = libc::EINVAL;

/// FFI bindings that target the real operating system that the build is targeting.
///
/// We issue the raw system calls instead of going through the libc `cpu_set_t` wrappers because
/// `cpu_set_t` has a fixed size that the kernel's CPU mask may exceed.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

// Real OS bindings are excluded from coverage measurement because they are tested via
// integration tests running on actual Linux.
#[cfg_attr(coverage_nightly, coverage(off))]
impl Bindings for BuildTargetBindings {
    fn sched_getaffinity(&self, task: TaskId, mask: &mut [u8]) -> Result<usize, io::Error> {
        // SAFETY: The kernel writes at most `mask.len()` bytes into the buffer we pass.
        // This call does not block.
        let result = unsafe {
            libc::syscall(
                libc::SYS_sched_getaffinity,
                task,
                mask.len(),
                mask.as_mut_ptr(),
            )
        };

        // Negative means failure, with the reason in errno.
        match usize::try_from(result) {
            Ok(written) => Ok(written),
            Err(_) => Err(io::Error::last_os_error()),
        }
    }

    fn sched_setaffinity(&self, task: TaskId, mask: &[u8]) -> Result<(), io::Error> {
        // SAFETY: The kernel reads at most `mask.len()` bytes from the buffer we pass.
        let result = unsafe {
            libc::syscall(
                libc::SYS_sched_setaffinity,
                task,
                mask.len(),
                mask.as_ptr(),
            )
        };

        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

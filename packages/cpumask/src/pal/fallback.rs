use std::io;

use crate::TaskId;
use crate::pal::Bindings;

/// Matches the Linux `EINVAL` code so the probing logic reads the same on every platform.
/// Never actually reported here.
pub(crate) const BUFFER_TOO_SMALL: i32 = 22;

/// Bindings for platforms without a task affinity API. Every call fails as unsupported.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetBindings;

impl Bindings for BuildTargetBindings {
    fn sched_getaffinity(&self, _task: TaskId, _mask: &mut [u8]) -> Result<usize, io::Error> {
        Err(unsupported())
    }

    fn sched_setaffinity(&self, _task: TaskId, _mask: &[u8]) -> Result<(), io::Error> {
        Err(unsupported())
    }
}

fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "task CPU affinity is not supported on this platform",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_are_unsupported() {
        let bindings = BuildTargetBindings;

        let error = bindings.sched_getaffinity(0, &mut [0; 8]).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::Unsupported);

        let error = bindings.sched_setaffinity(0, &[1, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::Unsupported);
    }
}

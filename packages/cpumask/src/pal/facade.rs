#![cfg_attr(coverage_nightly, coverage(off))]

use std::fmt::{self, Debug};
use std::io;
#[cfg(test)]
use std::sync::Arc;

use crate::TaskId;
#[cfg(test)]
use crate::pal::MockBindings;
use crate::pal::{Bindings, BuildTargetBindings};

/// Enum to hide the real/mock choice behind a single wrapper type.
#[derive(Clone)]
pub(crate) enum BindingsFacade {
    Target(&'static BuildTargetBindings),

    #[cfg(test)]
    Mock(Arc<MockBindings>),
}

impl BindingsFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BuildTargetBindings)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockBindings) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

impl Bindings for BindingsFacade {
    fn sched_getaffinity(&self, task: TaskId, mask: &mut [u8]) -> Result<usize, io::Error> {
        match self {
            Self::Target(bindings) => bindings.sched_getaffinity(task, mask),
            #[cfg(test)]
            Self::Mock(mock) => mock.sched_getaffinity(task, mask),
        }
    }

    fn sched_setaffinity(&self, task: TaskId, mask: &[u8]) -> Result<(), io::Error> {
        match self {
            Self::Target(bindings) => bindings.sched_setaffinity(task, mask),
            #[cfg(test)]
            Self::Mock(mock) => mock.sched_setaffinity(task, mask),
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // No API contract to test.
impl Debug for BindingsFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(inner) => inner.fmt(f),
            #[cfg(test)]
            Self::Mock(inner) => inner.fmt(f),
        }
    }
}

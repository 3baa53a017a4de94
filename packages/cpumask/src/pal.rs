//! Platform Abstraction Layer (PAL). All system calls go through the [`Bindings`] trait so that
//! the logic above it can be tested against mock bindings.

mod abstractions;
pub(crate) use abstractions::*;

mod facade;
pub(crate) use facade::*;

#[cfg(all(target_os = "linux", not(miri)))]
mod linux;
#[cfg(all(target_os = "linux", not(miri)))]
pub(crate) use linux::*;

// Other platforms have no task affinity API of the shape we need. Under Miri we cannot make
// system calls, so the same fallback is used there.
#[cfg(any(miri, not(target_os = "linux")))]
mod fallback;
#[cfg(any(miri, not(target_os = "linux")))]
pub(crate) use fallback::*;

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Work with sets of CPUs in the two forms Linux uses for them, and query or change which CPUs
//! a task is allowed to run on.
//!
//! * [`CpuSet`] is a bitmask, the form consumed and produced by the `sched_getaffinity(2)` and
//!   `sched_setaffinity(2)` system calls. Bit 0 of the first word is CPU 0.
//! * [`CpuList`] is a list of inclusive CPU ranges, the form shown to humans, e.g. in the
//!   `Cpus_allowed_list` line of `/proc/self/status` (`0-9,32-35,40`).
//!
//! Both represent the same thing and convert into each other with [`CpuSet::to_list()`] and
//! [`CpuList::to_set()`]. CPU numbers are plain [`CpuId`] integers; no topology meaning is
//! attached to them.
//!
//! # Example
//!
//! ```
//! use cpumask::{CpuList, CpuSet};
//!
//! let list: CpuList = "1-42,666,1000-1001".parse().unwrap();
//! let set = list.to_set();
//!
//! assert!(set.is_set(666));
//! assert!(!set.is_set(667));
//!
//! let other = CpuSet::new().with_range(40, 700);
//! assert_eq!(set.overlap(&other).to_string(), "40-42,666");
//! ```
//!
//! # Task affinity
//!
//! [`AffinityChannel`] queries and changes the affinity mask of a task. The kernel's CPU mask
//! can be larger than the fixed-size `cpu_set_t` of the C library, so its size is discovered by
//! probing and remembered in a [`SizeCache`] shared by all channels in the process.
//!
//! ```
//! # if cfg!(target_os = "linux") {
//! use cpumask::CALLER;
//!
//! let allowed = cpumask::affinity(CALLER).unwrap();
//! println!("This thread may run on CPUs {allowed}");
//! # }
//! ```
//!
//! When working with [`CALLER`], make sure the calling logic stays on the same operating system
//! thread for the duration, or you may be looking at the affinity of a different thread.
//!
//! # Operating system compatibility
//!
//! The set and list algebra works everywhere. Affinity queries and changes are only available
//! on Linux; on other platforms they fail with an [`Error::Os`] of kind
//! [`Unsupported`][std::io::ErrorKind::Unsupported].

mod affinity;
mod error;
mod list;
mod pal;
mod parse;
mod primitive_types;
mod set;
mod size_cache;

pub use affinity::*;
pub use error::*;
pub use list::*;
pub use primitive_types::*;
pub use set::*;
pub use size_cache::*;

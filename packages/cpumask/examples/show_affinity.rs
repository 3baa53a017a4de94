//! Prints the CPUs the current process may run on, both as a range list and as the raw
//! bitmask words, then narrows the main thread down to its lowest CPU and prints it again.
//!
//! Run with `RUST_LOG=trace` to see the mask size discovery at work.

use cpumask::{CALLER, CpuSet};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let affinity = cpumask::affinity(CALLER).unwrap();

    println!("Allowed CPUs: {affinity}");
    println!("As mask words: {:x?}", affinity.words());

    let (lowest, others) = affinity.to_list().remove_lowest();
    println!("Pinning to CPU {lowest}, leaving out '{others}'");

    CpuSet::new().with_range(lowest, lowest).pin_task(CALLER).unwrap();

    println!("Allowed CPUs now: {}", cpumask::affinity(CALLER).unwrap());
}

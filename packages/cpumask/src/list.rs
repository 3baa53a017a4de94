use std::cmp::{max, min};
use std::fmt::{self, Display};
use std::{iter, slice};

use itertools::Itertools;

use crate::{CpuId, CpuSet, Error};

/// An inclusive range of CPUs `from..=to`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CpuRange {
    from: CpuId,
    to: CpuId,
}

impl CpuRange {
    /// Creates the range `from..=to`.
    ///
    /// # Panics
    ///
    /// Panics if `from > to`.
    #[must_use]
    pub fn new(from: CpuId, to: CpuId) -> Self {
        assert!(
            from <= to,
            "invalid range {from}-{to}: start of range must not be after its end"
        );

        Self { from, to }
    }

    /// Creates a range consisting of a single CPU.
    #[must_use]
    pub const fn single(cpu: CpuId) -> Self {
        Self { from: cpu, to: cpu }
    }

    /// The lowest CPU in the range.
    #[must_use]
    pub const fn from(&self) -> CpuId {
        self.from
    }

    /// The highest CPU in the range.
    #[must_use]
    pub const fn to(&self) -> CpuId {
        self.to
    }

    /// Number of CPUs in the range. Never zero.
    #[must_use]
    #[expect(clippy::len_without_is_empty, reason = "a range is never empty")]
    pub fn len(&self) -> usize {
        (self.to - self.from) as usize + 1
    }

    /// Whether `cpu` is inside the range.
    #[must_use]
    pub const fn contains(&self, cpu: CpuId) -> bool {
        self.from <= cpu && cpu <= self.to
    }
}

impl Display for CpuRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// A set of CPUs stored as a list of inclusive ranges, the form used in human-readable output
/// such as `Cpus_allowed_list` in `/proc/self/status`.
///
/// A list is in canonical form when its ranges are increasing and do not overlap each other.
/// Lists produced by [`CpuSet::to_list()`] and [`overlap()`][Self::overlap] are always
/// canonical. Lists created from ranges or parsed from text keep the ranges exactly as given;
/// use [`is_canonical()`][Self::is_canonical] to check them before using operations that
/// require canonical form.
///
/// # Example
///
/// ```
/// use cpumask::CpuList;
///
/// let list: CpuList = "1-42,666,1000-1001".parse().unwrap();
///
/// assert_eq!(list.len(), 3);
/// assert_eq!(list.cpu_count(), 45);
/// assert_eq!(list.to_set().to_list(), list);
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct CpuList {
    ranges: Vec<CpuRange>,
}

impl CpuList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Creates a list from ranges, taken exactly as given.
    #[must_use]
    pub fn from_ranges(ranges: impl IntoIterator<Item = CpuRange>) -> Self {
        Self {
            ranges: ranges.into_iter().collect(),
        }
    }

    /// The ranges in the list, in the order they are stored.
    #[must_use]
    pub fn ranges(&self) -> &[CpuRange] {
        &self.ranges
    }

    /// Number of ranges in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the list has no ranges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of CPUs in the list. Only meaningful for canonical lists; overlapping ranges
    /// are counted repeatedly.
    #[must_use]
    pub fn cpu_count(&self) -> usize {
        self.ranges.iter().map(CpuRange::len).sum()
    }

    /// Whether `cpu` is in any of the ranges.
    #[must_use]
    pub fn contains(&self, cpu: CpuId) -> bool {
        self.ranges.iter().any(|range| range.contains(cpu))
    }

    /// Iterates over the CPUs of all ranges, in the order the ranges are stored.
    pub fn cpus(&self) -> impl Iterator<Item = CpuId> + '_ {
        self.ranges.iter().flat_map(|range| range.from..=range.to)
    }

    /// Whether the ranges are increasing and do not overlap each other.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.ranges
            .iter()
            .tuple_windows()
            .all(|(lower, higher)| lower.to < higher.from)
    }

    /// Converts the list into the equivalent bitmask.
    ///
    /// The set carries no trailing all-zero words. Ranges are inserted from the last to the
    /// first, so for canonical lists the storage is sized once by the highest range.
    #[must_use]
    pub fn to_set(&self) -> CpuSet {
        let mut set = CpuSet::new();

        for range in self.ranges.iter().rev() {
            set.add_range(range.from, range.to);
        }

        set
    }

    /// Reports whether this list and `other` have at least one CPU in common.
    ///
    /// Both lists must be in canonical form. Checked only in debug builds; the result is
    /// meaningless otherwise.
    #[must_use]
    pub fn is_overlapping(&self, other: &Self) -> bool {
        self.intersections(other).next().is_some()
    }

    /// Returns the CPUs that are in both this list and `other`, as a canonical list.
    ///
    /// Both lists must be in canonical form. Checked only in debug builds; the result is
    /// meaningless otherwise.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> Self {
        Self::from_ranges(self.intersections(other))
    }

    /// Merge-scans both lists, advancing whichever side has the range that ends first.
    fn intersections<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = CpuRange> + 'a {
        debug_assert!(self.is_canonical(), "list {self} is not in canonical form");
        debug_assert!(other.is_canonical(), "list {other} is not in canonical form");

        let mut left = self.ranges.iter().peekable();
        let mut right = other.ranges.iter().peekable();

        iter::from_fn(move || {
            loop {
                let (a, b) = (*left.peek()?, *right.peek()?);

                let overlap = (a.to >= b.from && a.from <= b.to)
                    .then(|| CpuRange::new(max(a.from, b.from), min(a.to, b.to)));

                if a.to <= b.to {
                    left.next();
                } else {
                    right.next();
                }

                if overlap.is_some() {
                    return overlap;
                }
            }
        })
    }

    /// Removes the lowest CPU, returning it together with the list of remaining CPUs.
    ///
    /// The list must be in canonical form, so that its first range holds the lowest CPU.
    ///
    /// # Panics
    ///
    /// Panics if the list is empty. Use [`try_remove_lowest()`][Self::try_remove_lowest] if
    /// that is an expected situation.
    #[must_use]
    pub fn remove_lowest(&self) -> (CpuId, Self) {
        let Some((first, rest)) = self.ranges.split_first() else {
            panic!("cannot remove a CPU from an empty CPU list");
        };

        let mut remainder = Vec::with_capacity(self.ranges.len());

        if first.from < first.to {
            remainder.push(CpuRange::new(first.from + 1, first.to));
        }

        remainder.extend_from_slice(rest);

        (first.from, Self { ranges: remainder })
    }

    /// Removes the lowest CPU, returning it together with the list of remaining CPUs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionViolated`] if the list is empty.
    pub fn try_remove_lowest(&self) -> crate::Result<(CpuId, Self)> {
        if self.is_empty() {
            return Err(Error::precondition(
                "cannot remove a CPU from an empty CPU list".to_string(),
            ));
        }

        Ok(self.remove_lowest())
    }
}

impl Display for CpuList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ranges.iter().format(","))
    }
}

impl From<&CpuSet> for CpuList {
    fn from(value: &CpuSet) -> Self {
        value.to_list()
    }
}

impl FromIterator<CpuRange> for CpuList {
    fn from_iter<T: IntoIterator<Item = CpuRange>>(iter: T) -> Self {
        Self::from_ranges(iter)
    }
}

impl<'a> IntoIterator for &'a CpuList {
    type Item = &'a CpuRange;
    type IntoIter = slice::Iter<'a, CpuRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(CpuList: Send, Sync, Clone);
    assert_impl_all!(CpuRange: Send, Sync, Copy);

    fn list(text: &str) -> CpuList {
        text.parse().unwrap()
    }

    #[test]
    fn display() {
        let cases = [
            (vec![(1, 1), (2, 42), (666, 666)], "1,2-42,666"),
            (vec![(2, 42)], "2-42"),
            (vec![(2, 42), (777, 778)], "2-42,777-778"),
            (vec![], ""),
        ];

        for (pairs, expected) in cases {
            let list: CpuList = pairs
                .into_iter()
                .map(|(from, to)| CpuRange::new(from, to))
                .collect();

            assert_eq!(list.to_string(), expected);
        }
    }

    #[test]
    fn to_set() {
        assert_eq!(CpuList::new().to_set().to_string(), "");
        assert!(CpuList::new().to_set().words().is_empty());

        let set = list("3,5,666").to_set();

        assert_eq!(set.to_string(), "3,5,666");
        assert_eq!(set.word_count(), 11);
    }

    #[test]
    fn to_set_round_trip() {
        for text in ["0", "0-63", "0-64", "63-64", "1-42,666,1000-1001", "5,7,9,11"] {
            let list = list(text);

            assert_eq!(list.to_set().to_list(), list, "{text}");
        }
    }

    #[test]
    fn to_set_sets_exactly_the_listed_cpus() {
        let list = list("1-42,666,1000-1001");
        let set = list.to_set();

        for cpu in 0..1100 {
            assert_eq!(set.is_set(cpu), list.contains(cpu), "cpu {cpu}");
        }
    }

    #[test]
    fn is_overlapping() {
        let cases = [
            ("", "", false),
            ("1", "5", false),
            ("1-2", "5-7", false),
            ("5-7", "1-2", false),
            ("1,7,19", "3-5,6-8", true),
            ("3-5,6-8", "1,7,19", true),
            ("7", "1-3,5-999", true),
            ("1-3", "3-9", true),
            ("1-3", "", false),
        ];

        for (a, b, expected) in cases {
            assert_eq!(list(a).is_overlapping(&list(b)), expected, "{a} vs {b}");
        }
    }

    #[test]
    fn overlap() {
        let cases = [
            ("", "", ""),
            ("1-3", "5-7", ""),
            ("1-5", "3-9", "3-5"),
            ("1,7,19", "3-5,6-8", "7"),
            ("0-10,20-30", "5-25", "5-10,20-25"),
            ("0-100", "1,3,5-6,99-200", "1,3,5-6,99-100"),
        ];

        for (a, b, expected) in cases {
            let (a, b) = (list(a), list(b));

            let forward = a.overlap(&b);
            let backward = b.overlap(&a);

            assert_eq!(forward.to_string(), expected);
            assert_eq!(forward, backward);
            assert!(forward.is_canonical());
            assert_eq!(a.is_overlapping(&b), !forward.is_empty());
        }
    }

    #[test]
    fn overlap_matches_set_overlap() {
        let (a, b) = (list("0-70,100,129-140"), list("64-65,90-135"));

        assert_eq!(
            a.overlap(&b),
            a.to_set().overlap(&b.to_set()).to_list()
        );
    }

    #[test]
    fn remove_lowest() {
        let cases = [
            ("1,3", 1, "3"),
            ("1-2", 1, "2"),
            ("1-3", 1, "2-3"),
            ("5", 5, ""),
            ("0-1,5-6", 0, "1,5-6"),
        ];

        for (text, expected_cpu, expected_remainder) in cases {
            let original = list(text);
            let (cpu, remainder) = original.remove_lowest();

            assert_eq!(cpu, expected_cpu);
            assert_eq!(remainder.to_string(), expected_remainder);
            assert_eq!(original.to_string(), text);
        }
    }

    #[test]
    #[should_panic]
    fn remove_lowest_from_empty_is_panic() {
        _ = CpuList::new().remove_lowest();
    }

    #[test]
    fn try_remove_lowest() {
        assert!(matches!(
            CpuList::new().try_remove_lowest(),
            Err(Error::PreconditionViolated { .. })
        ));

        let (cpu, remainder) = list("4-5").try_remove_lowest().unwrap();

        assert_eq!(cpu, 4);
        assert_eq!(remainder.to_string(), "5");
    }

    #[test]
    fn is_canonical() {
        assert!(CpuList::new().is_canonical());
        assert!(list("1-3,4-5,9").is_canonical());
        assert!(!list("1-3,3-5").is_canonical());
        assert!(!list("5,1").is_canonical());
    }

    #[test]
    fn counting() {
        let list = list("0-9,32-35,40");

        assert_eq!(list.len(), 3);
        assert_eq!(list.cpu_count(), 15);
        assert_eq!(
            list.cpus().collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 32, 33, 34, 35, 40]
        );
        assert!(list.contains(33));
        assert!(!list.contains(36));
    }

    #[test]
    fn range_basics() {
        let range = CpuRange::new(3, 7);

        assert_eq!(range.from(), 3);
        assert_eq!(range.to(), 7);
        assert_eq!(range.len(), 5);
        assert!(range.contains(3));
        assert!(range.contains(7));
        assert!(!range.contains(8));

        assert_eq!(CpuRange::single(9).len(), 1);
        assert_eq!(CpuRange::single(9).to_string(), "9");
        assert_eq!(range.to_string(), "3-7");
    }

    #[test]
    #[should_panic]
    fn reversed_range_is_panic() {
        _ = CpuRange::new(3, 1);
    }
}

use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use crate::{CpuId, CpuList, CpuRange, Error, TaskId, WORD_BITS, Word};

/// Shift that turns a CPU number into the index of the word that holds it.
const WORD_SHIFT: u32 = WORD_BITS.trailing_zeros();

/// Mask that turns a CPU number into the bit offset inside its word.
const BIT_OFFSET_MASK: CpuId = WORD_BITS - 1;

/// A set of CPUs stored as a bitmask, the form used by the Linux affinity system calls.
///
/// The first word holds CPUs 0-63 (bit 0 is CPU 0), the second word holds CPUs 64-127 and so
/// on. The number of words is not fixed: any CPU beyond the last word is simply not a member.
///
/// Two sets are equal if they have the same members, regardless of how many trailing all-zero
/// words either of them carries. Sets built from CPU numbers or ranges (e.g. via
/// [`CpuList::to_set()`]) never carry trailing all-zero words; sets obtained from the operating
/// system or from [`overlap()`][Self::overlap] keep the word count they were produced with.
/// Use [`trimmed()`][Self::trimmed] if you need the canonical form.
///
/// # Example
///
/// ```
/// use cpumask::CpuSet;
///
/// let set = CpuSet::from_words(vec![0xaa0]);
///
/// assert!(set.is_set(5));
/// assert!(!set.is_set(6));
/// assert_eq!(set.to_string(), "5,7,9,11");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CpuSet {
    words: Vec<Word>,
}

impl CpuSet {
    /// Creates an empty set without any words.
    #[must_use]
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Creates a set from raw bitmask words, lowest CPUs first.
    #[must_use]
    pub fn from_words(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// The raw bitmask words, lowest CPUs first, including any trailing all-zero words.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Consumes the set, returning the raw bitmask words.
    #[must_use]
    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    /// Number of words backing the set, including any trailing all-zero words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Whether the set has no members at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Number of CPUs in the set.
    #[must_use]
    pub fn cpu_count(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// The highest CPU in the set, or `None` if the set is empty.
    #[must_use]
    pub fn max_cpu(&self) -> Option<CpuId> {
        let index = self.words.iter().rposition(|word| *word != 0)?;
        let word = self.words[index];

        Some(word_base(index) + (WORD_BITS - 1 - word.leading_zeros()))
    }

    /// Iterates over the CPUs in the set in ascending order.
    pub fn cpus(&self) -> impl Iterator<Item = CpuId> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0)
            .flat_map(|(index, &word)| {
                let base = word_base(index);

                (0..WORD_BITS)
                    .filter(move |bit| (word >> bit) & 1 == 1)
                    .map(move |bit| base + bit)
            })
    }

    /// Reports whether `cpu` is a member of the set.
    ///
    /// CPUs beyond the words of the set are never members.
    #[must_use]
    pub fn is_set(&self, cpu: CpuId) -> bool {
        self.words
            .get(word_index(cpu))
            .is_some_and(|word| word & bit_mask(cpu) != 0)
    }

    /// Adds all CPUs in the inclusive range `from..=to` to the set, growing the set if needed.
    ///
    /// Existing members are preserved. The set only grows as far as needed to hold `to`.
    ///
    /// # Panics
    ///
    /// Panics if `from > to`. Use [`try_add_range()`][Self::try_add_range] if the range comes
    /// from untrusted input.
    pub fn add_range(&mut self, from: CpuId, to: CpuId) {
        assert!(
            from <= to,
            "invalid range {from}-{to}: start of range must not be after its end"
        );

        self.insert_range(from, to);
    }

    /// Like [`add_range()`][Self::add_range] but returns the updated set, for chaining.
    ///
    /// # Panics
    ///
    /// Panics if `from > to`.
    #[must_use]
    pub fn with_range(mut self, from: CpuId, to: CpuId) -> Self {
        self.add_range(from, to);
        self
    }

    /// Adds all CPUs in the inclusive range `from..=to` to the set, growing the set if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionViolated`] if `from > to`. The set is unchanged in that case.
    pub fn try_add_range(&mut self, from: CpuId, to: CpuId) -> crate::Result<()> {
        if from > to {
            return Err(Error::precondition(format!(
                "invalid range {from}-{to}: start of range must not be after its end"
            )));
        }

        self.insert_range(from, to);
        Ok(())
    }

    fn insert_range(&mut self, from: CpuId, to: CpuId) {
        let first = word_index(from);
        let last = word_index(to);

        if self.words.len() <= last {
            self.words.resize(last + 1, 0);
        }

        for index in first..=last {
            let low = if index == first { from & BIT_OFFSET_MASK } else { 0 };
            let high = if index == last {
                to & BIT_OFFSET_MASK
            } else {
                WORD_BITS - 1
            };

            self.words[index] |= bits_between(low, high);
        }
    }

    /// Reports whether this set and `other` have at least one CPU in common.
    #[must_use]
    pub fn is_overlapping(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// Returns the CPUs that are members of both this set and `other`.
    ///
    /// The result has as many words as the shorter of the two sets.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> Self {
        Self {
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & b)
                .collect(),
        }
    }

    /// Returns the only member of the set, or `None` if the set is empty or has more than
    /// one member.
    #[must_use]
    pub fn single(&self) -> Option<CpuId> {
        let mut nonzero = self
            .words
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0);

        let (index, word) = nonzero.next()?;

        if !word.is_power_of_two() || nonzero.next().is_some() {
            return None;
        }

        Some(word_base(index) + word.trailing_zeros())
    }

    /// Returns the same set without trailing all-zero words.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            words: self.significant_words().to_vec(),
        }
    }

    fn significant_words(&self) -> &[Word] {
        let len = self
            .words
            .iter()
            .rposition(|word| *word != 0)
            .map_or(0, |index| index + 1);

        &self.words[..len]
    }

    /// Converts the set into the equivalent list of CPU ranges.
    ///
    /// The result is in canonical form: ranges are increasing, do not overlap and adjacent
    /// CPUs are always merged into the same range.
    ///
    /// This runs on hot paths (e.g. every affinity query that is shown to a human), so it only
    /// increments and shifts by single bit positions. Words that are all-zero or all-one are
    /// skipped as a whole.
    #[must_use]
    pub fn to_list(&self) -> CpuList {
        let words = &self.words;
        let len = words.len();

        let mut ranges = Vec::new();

        let mut cpu: CpuId = 0;
        let mut index = 0;
        let mut mask: Word = 1;

        'next_range: loop {
            // If a previous range ended in the middle of a word, look for the next member in the
            // rest of that word first.
            if mask != 1 {
                while words[index] & mask == 0 {
                    cpu += 1;
                    mask <<= 1;

                    if mask == 0 {
                        index += 1;
                        mask = 1;
                        break;
                    }
                }
            }

            while index < len && words[index] == 0 {
                cpu += WORD_BITS;
                index += 1;
            }

            if index >= len {
                return CpuList::from_ranges(ranges);
            }

            // The current word has a member at or above the current bit.
            while words[index] & mask == 0 {
                cpu += 1;
                mask <<= 1;
            }

            let from = cpu;
            cpu += 1;
            mask <<= 1;

            if mask == 0 {
                index += 1;
                mask = 1;
            }

            // Look for the end of the range in the rest of the current word.
            if mask != 1 {
                loop {
                    if words[index] & mask == 0 {
                        ranges.push(CpuRange::new(from, cpu - 1));
                        continue 'next_range;
                    }

                    cpu += 1;
                    mask <<= 1;

                    if mask == 0 {
                        index += 1;
                        mask = 1;
                        break;
                    }
                }
            }

            while index < len && words[index] == Word::MAX {
                cpu += WORD_BITS;
                index += 1;
            }

            if index >= len {
                ranges.push(CpuRange::new(from, cpu - 1));
                return CpuList::from_ranges(ranges);
            }

            // The current word is not all-one, so the range ends somewhere inside it.
            while words[index] & mask != 0 {
                cpu += 1;
                mask <<= 1;
            }

            ranges.push(CpuRange::new(from, cpu - 1));
        }
    }

    /// Restricts the task identified by `task` to run only on the CPUs in this set.
    ///
    /// This is a shorthand for [`set_affinity()`][crate::set_affinity].
    ///
    /// # Errors
    ///
    /// See [`AffinityChannel::set_affinity()`][crate::AffinityChannel::set_affinity].
    pub fn pin_task(&self, task: TaskId) -> crate::Result<()> {
        crate::set_affinity(task, self)
    }
}

impl PartialEq for CpuSet {
    fn eq(&self, other: &Self) -> bool {
        self.significant_words() == other.significant_words()
    }
}

impl Eq for CpuSet {}

impl Hash for CpuSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant_words().hash(state);
    }
}

impl Display for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_list(), f)
    }
}

impl FromIterator<CpuId> for CpuSet {
    fn from_iter<T: IntoIterator<Item = CpuId>>(iter: T) -> Self {
        let mut set = Self::new();

        for cpu in iter {
            set.insert_range(cpu, cpu);
        }

        set
    }
}

impl From<&CpuList> for CpuSet {
    fn from(value: &CpuList) -> Self {
        value.to_set()
    }
}

impl From<Vec<Word>> for CpuSet {
    fn from(value: Vec<Word>) -> Self {
        Self::from_words(value)
    }
}

fn word_index(cpu: CpuId) -> usize {
    (cpu >> WORD_SHIFT) as usize
}

fn bit_mask(cpu: CpuId) -> Word {
    1 << (cpu & BIT_OFFSET_MASK)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "word indexes are derived from CpuId values, so they always fit back into one"
)]
fn word_base(index: usize) -> CpuId {
    (index as CpuId) << WORD_SHIFT
}

/// A word with the bits `low..=high` set.
fn bits_between(low: CpuId, high: CpuId) -> Word {
    (Word::MAX >> (WORD_BITS - 1 - high)) & (Word::MAX << low)
}

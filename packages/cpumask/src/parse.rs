use std::str::FromStr;

use crate::{CpuId, CpuList, CpuRange, Error};

impl CpuList {
    /// Parses a CPU list in the textual format used by Linux, e.g. `0-9,32-35,40`.
    ///
    /// The format is a comma-separated sequence of items, each either a single CPU number or
    /// an inclusive `from-to` range. An empty input is an empty list. Whitespace is not
    /// allowed anywhere.
    ///
    /// The ranges are kept in the order they appear in the input; the parser does not sort or
    /// merge them. Use [`is_canonical()`][Self::is_canonical] to check the result if the input
    /// is not known to come from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSyntax`] if the input does not match the format or if a range
    /// has its start after its end.
    ///
    /// # Example
    ///
    /// ```
    /// use cpumask::CpuList;
    ///
    /// let list = CpuList::parse(b"1-42,666,1000-1001").unwrap();
    ///
    /// assert_eq!(list.to_string(), "1-42,666,1000-1001");
    /// ```
    pub fn parse(input: &[u8]) -> crate::Result<Self> {
        let mut tokenizer = Tokenizer::new(input);
        let mut ranges = Vec::new();

        if tokenizer.is_at_end() {
            return Ok(Self::new());
        }

        loop {
            let from = tokenizer.number()?;

            match tokenizer.next_byte() {
                None => {
                    ranges.push(CpuRange::single(from));
                    return Ok(Self::from_ranges(ranges));
                }
                Some(b',') => ranges.push(CpuRange::single(from)),
                Some(b'-') => {
                    let to = tokenizer.number()?;

                    if from > to {
                        return Err(Error::syntax(
                            format!("{from}-{to}").as_bytes(),
                            "range start must be <= end",
                        ));
                    }

                    ranges.push(CpuRange::new(from, to));

                    match tokenizer.next_byte() {
                        None => return Ok(Self::from_ranges(ranges)),
                        Some(b',') => {}
                        Some(_) => return Err(tokenizer.error_at_previous("expected ','")),
                    }
                }
                Some(_) => return Err(tokenizer.error_at_previous("expected '-' or ','")),
            }
        }
    }
}

impl FromStr for CpuList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

/// Single-pass cursor over the bytes of a CPU list.
struct Tokenizer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn rest(&self, from: usize) -> &'a [u8] {
        self.input.get(from..).unwrap_or_default()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.input.get(self.position)?;
        self.position += 1;
        Some(byte)
    }

    /// Reads an unsigned decimal number that fits into a [`CpuId`].
    fn number(&mut self) -> crate::Result<CpuId> {
        let start = self.position;
        let mut value: CpuId = 0;

        while let Some(digit) = self.input.get(self.position).filter(|b| b.is_ascii_digit()) {
            value = value
                .checked_mul(10)
                .and_then(|value| value.checked_add(CpuId::from(digit - b'0')))
                .ok_or_else(|| Error::syntax(self.rest(start), "expected unsigned integer number"))?;

            self.position += 1;
        }

        if self.position == start {
            return Err(Error::syntax(
                self.rest(start),
                "expected unsigned integer number",
            ));
        }

        Ok(value)
    }

    fn error_at_previous(&self, problem: &str) -> Error {
        Error::syntax(self.rest(self.position.saturating_sub(1)), problem)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn ranges(list: &CpuList) -> Vec<(CpuId, CpuId)> {
        list.ranges()
            .iter()
            .map(|range| (range.from(), range.to()))
            .collect()
    }

    #[test]
    fn parse_smoke_test() {
        assert_eq!(ranges(&"".parse().unwrap()), vec![]);
        assert_eq!(ranges(&"42".parse().unwrap()), vec![(42, 42)]);
        assert_eq!(ranges(&"42-666".parse().unwrap()), vec![(42, 666)]);
        assert_eq!(
            ranges(&"42,666".parse().unwrap()),
            vec![(42, 42), (666, 666)]
        );
        assert_eq!(
            ranges(&"1-42,666,1000-1001".parse().unwrap()),
            vec![(1, 42), (666, 666), (1000, 1001)]
        );
        assert_eq!(ranges(&"0-0".parse().unwrap()), vec![(0, 0)]);
        assert_eq!(
            ranges(&"4294967295".parse().unwrap()),
            vec![(CpuId::MAX, CpuId::MAX)]
        );
    }

    #[test]
    fn parse_keeps_given_order() {
        let list: CpuList = "9,1-3,2".parse().unwrap();

        assert_eq!(ranges(&list), vec![(9, 9), (1, 3), (2, 2)]);
        assert!(!list.is_canonical());
    }

    #[test]
    fn parse_bytes_with_trailing_newline_is_error() {
        // Callers reading procfs must strip the line terminator themselves.
        CpuList::parse(b"0-3\n").unwrap_err();
        CpuList::parse(b"0-3").unwrap();
    }

    #[test]
    fn parse_errors() {
        let cases = [
            ("abc", "abc", "expected unsigned integer number"),
            ("0abc", "abc", "expected '-' or ','"),
            ("1-z", "z", "expected unsigned integer number"),
            ("0-0abc", "abc", "expected ','"),
            ("1,", "", "expected unsigned integer number"),
            (",1", ",1", "expected unsigned integer number"),
            ("1-", "", "expected unsigned integer number"),
            ("1 ,2", " ,2", "expected '-' or ','"),
            ("3-1", "3-1", "range start must be <= end"),
            ("4294967296", "4294967296", "expected unsigned integer number"),
        ];

        for (input, expected_value, expected_problem) in cases {
            match input.parse::<CpuList>() {
                Err(Error::InvalidSyntax {
                    invalid_value,
                    problem,
                }) => {
                    assert_eq!(invalid_value, expected_value, "input {input:?}");
                    assert_eq!(problem, expected_problem, "input {input:?}");
                }
                other => panic!("unexpected result for {input:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn emit_parse_round_trip() {
        for text in ["", "0", "1,2-42,666", "2-42,777-778"] {
            assert_eq!(text.parse::<CpuList>().unwrap().to_string(), text);
        }
    }
}

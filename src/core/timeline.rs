use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::MonthParseError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthParseError> {
        if !(1..=12).contains(&month) {
            return Err(MonthParseError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn is_before(self, other: Self) -> bool {
        self < other
    }

    pub fn is_after(self, other: Self) -> bool {
        self > other
    }

    pub fn is_january(self) -> bool {
        self.month == 1
    }

    pub fn is_december(self) -> bool {
        self.month == 12
    }

    pub fn is_month(self, target_month: u32) -> bool {
        self.month == target_month
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

// Inclusive count of months from `start` to `end`; `months_between(m, m) == 1`.
// Non-positive when `end` precedes `start`.
pub fn months_between(start: YearMonth, end: YearMonth) -> i64 {
    end.ordinal() - start.ordinal() + 1
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .filter(|(y, m)| y.len() == 4 && m.len() == 2)
            .ok_or_else(|| MonthParseError::Format(s.to_string()))?;
        let year = year
            .parse::<i32>()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| MonthParseError::Format(s.to_string()))?;
        if !(1900..=2100).contains(&year) {
            return Err(MonthParseError::YearOutOfRange(year));
        }
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = MonthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    start: YearMonth,
    end_year: i32,
}

impl Timeline {
    pub fn new(start: YearMonth, end_year: i32) -> Self {
        Self { start, end_year }
    }

    pub fn start(&self) -> YearMonth {
        self.start
    }

    pub fn end(&self) -> YearMonth {
        YearMonth {
            year: self.end_year,
            month: 12,
        }
    }

    pub fn months(&self) -> impl Iterator<Item = (YearMonth, u32)> {
        let end = self.end();
        std::iter::successors(Some(self.start), |m| Some(m.next()))
            .take_while(move |m| *m <= end)
            .map(|m| (m, m.month))
    }

    pub fn total_months(&self) -> usize {
        months_between(self.start, self.end()).max(0) as usize
    }
}

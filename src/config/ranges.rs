use anyhow::{bail, Result};
use std::fmt;

/// Parse `"N"` or `"N-M"` into a pair of bounds.
fn parse_bounds(s: &str) -> Result<(u32, u32)> {
    let s = s.trim();
    if let Some((start, end)) = s.split_once('-') {
        Ok((start.trim().parse()?, end.trim().parse()?))
    } else {
        let n: u32 = s.parse()?;
        Ok((n, n))
    }
}

/// Inclusive range of calendar months. A start after the end wraps across
/// the new year, so `"11-2"` covers November through February.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    start: u32,
    end: u32,
}

impl MonthRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (start, end) = parse_bounds(s)?;
        for month in [start, end] {
            if !(1..=12).contains(&month) {
                bail!("month {} out of range 1-12", month);
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, month: u32) -> bool {
        if self.start <= self.end {
            month >= self.start && month <= self.end
        } else {
            month >= self.start || month <= self.end
        }
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Hours of the day, start inclusive and end exclusive: `"8-20"` covers
/// 08:00 up to 19:59. A single hour `"6"` covers 06:00-06:59. A start after
/// the end wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    start: u32,
    end: u32,
}

impl HourRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let (start, end) = if s.contains('-') {
            parse_bounds(s)?
        } else {
            let hour: u32 = s.parse()?;
            (hour, hour.saturating_add(1))
        };
        if start > 23 {
            bail!("start hour {} out of range 0-23", start);
        }
        if end > 24 {
            bail!("end hour {} out of range 0-24", end);
        }
        if start == end {
            bail!("empty hour range {}-{}", start, end);
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start < self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

impl fmt::Display for HourRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

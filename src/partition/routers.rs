//! Router implementations
//!
//! Each router turns static configuration into an ordered work unit list.

use super::types::{PartitionRouter, WorkUnit};
use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate};

// ============================================================================
// List Router
// ============================================================================

/// Static list of keys, used verbatim and in order
#[derive(Debug, Clone)]
pub struct ListRouter {
    values: Vec<String>,
}

impl ListRouter {
    /// Create a new list router
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }
}

impl PartitionRouter for ListRouter {
    fn partitions(&self) -> Result<Vec<WorkUnit>> {
        if let Some(empty) = self.values.iter().position(|v| v.trim().is_empty()) {
            return Err(Error::invalid_value(
                "units.values",
                format!("entry {empty} is empty"),
            ));
        }

        Ok(self.values.iter().map(WorkUnit::new).collect())
    }

    fn partition_field(&self) -> Option<&str> {
        None
    }
}

// ============================================================================
// Month Router
// ============================================================================

/// Steps a date cursor from `start` while it is before `end`, emitting the
/// `YYYY-MM` month of each cursor position.
#[derive(Debug, Clone)]
pub struct MonthRouter {
    start: NaiveDate,
    end: NaiveDate,
    step: Duration,
    column: String,
}

impl MonthRouter {
    /// Create a new month router
    pub fn new(start: NaiveDate, end: NaiveDate, step: Duration, column: impl Into<String>) -> Self {
        Self {
            start,
            end,
            step,
            column: column.into(),
        }
    }

    /// Create from a step string such as `"31d"`
    pub fn from_strings(
        start: NaiveDate,
        end: NaiveDate,
        step: &str,
        column: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(start, end, parse_duration(step)?, column))
    }
}

impl PartitionRouter for MonthRouter {
    fn partitions(&self) -> Result<Vec<WorkUnit>> {
        if self.step <= Duration::zero() {
            return Err(Error::invalid_value("units.step", "step must be positive"));
        }

        let mut units: Vec<WorkUnit> = Vec::new();
        let mut current = self.start;

        while current < self.end {
            let key = current.format("%Y-%m").to_string();
            // Short steps land in the same month more than once
            if units.last().map(|u| u.key.as_str()) != Some(key.as_str()) {
                units.push(WorkUnit::new(key).with_column(self.column.clone()));
            }

            current = current
                .checked_add_signed(self.step)
                .ok_or_else(|| Error::invalid_value("units.end", "date out of range"))?;
        }

        Ok(units)
    }

    fn partition_field(&self) -> Option<&str> {
        Some(&self.column)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a duration string like "31d", "2w", "12h"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (num_str, suffix) = if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 'd')
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 'h')
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 'm')
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 's')
    } else if let Some(stripped) = s.strip_suffix('w') {
        (stripped, 'w')
    } else {
        // Assume days if no suffix
        (s, 'd')
    };

    let num: i64 = num_str
        .parse()
        .map_err(|_| Error::config(format!("Invalid duration number: {num_str}")))?;

    let duration = match suffix {
        'w' => Duration::weeks(num),
        'd' => Duration::days(num),
        'h' => Duration::hours(num),
        'm' => Duration::minutes(num),
        's' => Duration::seconds(num),
        _ => return Err(Error::config(format!("Invalid duration suffix: {suffix}"))),
    };

    Ok(duration)
}

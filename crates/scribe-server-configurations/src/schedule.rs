// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Generation schedules of the form `<N> days` or `<N> weeks`.
//!
//! The scheduler splits on a single space, so only that exact shape is
//! accepted.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleUnit {
	Days,
	Weeks,
}

impl ScheduleUnit {
	pub fn as_str(self) -> &'static str {
		match self {
			ScheduleUnit::Days => "days",
			ScheduleUnit::Weeks => "weeks",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
	pub every: u32,
	pub unit: ScheduleUnit,
}

impl fmt::Display for Schedule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.every, self.unit.as_str())
	}
}

impl FromStr for Schedule {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (count, unit) = s
			.split_once(' ')
			.ok_or_else(|| format!("expected '<N> days' or '<N> weeks', got '{s}'"))?;

		if count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
			return Err(format!("'{count}' is not a positive whole number"));
		}
		let every: u32 = count
			.parse()
			.map_err(|_| format!("'{count}' is out of range"))?;
		if every == 0 {
			return Err("interval must be at least 1".to_string());
		}

		let unit = match unit {
			"days" => ScheduleUnit::Days,
			"weeks" => ScheduleUnit::Weeks,
			other => return Err(format!("unsupported unit '{other}'")),
		};

		Ok(Schedule { every, unit })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_parses_days_and_weeks() {
		assert_eq!(
			"4 weeks".parse::<Schedule>(),
			Ok(Schedule {
				every: 4,
				unit: ScheduleUnit::Weeks
			})
		);
		assert_eq!(
			"1 days".parse::<Schedule>(),
			Ok(Schedule {
				every: 1,
				unit: ScheduleUnit::Days
			})
		);
	}

	#[test]
	fn test_rejects_malformed() {
		for input in [
			"", "weeks", "0 days", "-1 days", "+2 days", "2 months", "2  weeks", "2 Weeks",
			"two weeks", "2 weeks ", "99999999999 days",
		] {
			assert!(input.parse::<Schedule>().is_err(), "accepted {input:?}");
		}
	}

	proptest! {
		#[test]
		fn prop_display_parses_back(every in 1u32..10_000, weeks in any::<bool>()) {
			let unit = if weeks { ScheduleUnit::Weeks } else { ScheduleUnit::Days };
			let schedule = Schedule { every, unit };
			prop_assert_eq!(schedule.to_string().parse::<Schedule>(), Ok(schedule));
		}
	}
}

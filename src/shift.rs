//! Shift selection and the date/time stamp shown on the close-out.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

const MONTHS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    #[serde(rename = "mañana", alias = "manana", alias = "morning")]
    Morning,
    #[serde(rename = "tarde", alias = "afternoon")]
    Afternoon,
    #[default]
    #[serde(rename = "noche", alias = "night")]
    Night,
}

impl Shift {
    /// Name used by the backend, both in URLs and in submitted payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Shift::Morning => "mañana",
            Shift::Afternoon => "tarde",
            Shift::Night => "noche",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mañana" | "manana" | "morning" => Ok(Shift::Morning),
            "tarde" | "afternoon" => Ok(Shift::Afternoon),
            "noche" | "night" => Ok(Shift::Night),
            other => Err(format!("Unknown shift: {other}")),
        }
    }
}

/// Which shift is being closed, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftContext {
    pub shift: Shift,
    /// `DD-Mmm-YYYY`, e.g. `16-Oct-2026`.
    pub date: String,
    /// `HH:MM`, 24-hour.
    pub time: String,
}

impl ShiftContext {
    pub fn new(shift: Shift, now: NaiveDateTime) -> Self {
        let mut context = Self {
            shift,
            ..Default::default()
        };
        context.stamp(now);
        context
    }

    /// Refresh date and time from the given local clock reading.
    pub fn stamp(&mut self, now: NaiveDateTime) {
        self.date = format_date(now);
        self.time = format_time(now);
    }
}

pub fn format_date(now: NaiveDateTime) -> String {
    format!(
        "{:02}-{}-{}",
        now.day(),
        MONTHS[now.month0() as usize],
        now.year()
    )
}

pub fn format_time(now: NaiveDateTime) -> String {
    format!("{:02}:{:02}", now.hour(), now.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_stamp_formats() {
        let context = ShiftContext::new(Shift::Morning, at(2026, 1, 5, 7, 3));
        assert_eq!(context.date, "05-Ene-2026");
        assert_eq!(context.time, "07:03");

        assert_eq!(format_date(at(2026, 8, 31, 23, 59)), "31-Ago-2026");
        assert_eq!(format_time(at(2026, 12, 1, 0, 0)), "00:00");
    }

    #[test]
    fn test_shift_names() {
        assert_eq!(Shift::default(), Shift::Night);
        assert_eq!("Mañana".parse::<Shift>().unwrap(), Shift::Morning);
        assert_eq!("tarde".parse::<Shift>().unwrap(), Shift::Afternoon);
        assert!("brunch".parse::<Shift>().is_err());
        assert_eq!(
            serde_json::to_value(Shift::Morning).unwrap(),
            serde_json::json!("mañana")
        );
    }
}

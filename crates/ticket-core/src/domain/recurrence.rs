//! Recurrence Pattern
//!
//! A repeat rule attached 1:1 to a ticket. The ticket's own span is the
//! first occurrence; later occurrences repeat its time of day and duration.
//!
//! # Time Model
//! Rules are evaluated in UTC. Monthly rules skip months lacking the anchor
//! day and yearly rules anchored on Feb 29 only fire in leap years.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, FieldError};

/// Upper bound on candidate dates examined in one expansion
const MAX_STEPS: u32 = 100_000;

/// Largest accepted repeat interval
const MAX_INTERVAL: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// When a series stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrenceEnd {
    #[default]
    Never,
    /// Total number of occurrences, the first one included
    AfterOccurrences { count: u32 },
    /// Last allowed occurrence start (inclusive)
    Until { until: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    /// Repeat every `interval` units of `frequency`
    pub interval: u32,
    /// Weekly only; empty means the weekday of the first occurrence
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub end: RecurrenceEnd,
}

/// One expanded occurrence of a recurring ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// 0 for the ticket's own span
    pub index: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval,
            weekdays: Vec::new(),
            end: RecurrenceEnd::Never,
        }
    }

    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.weekdays = weekdays.into_iter().collect();
        self
    }

    pub fn ending(mut self, end: RecurrenceEnd) -> Self {
        self.end = end;
        self
    }

    /// Validate against the first occurrence's start
    pub fn validate(&self, anchor: DateTime<Utc>) -> DomainResult<()> {
        let mut errors = Vec::new();
        if self.interval == 0 {
            errors.push(FieldError::new("interval", "must be at least 1"));
        } else if self.interval > MAX_INTERVAL {
            errors.push(FieldError::new("interval", format!("must be at most {}", MAX_INTERVAL)));
        }
        if !self.weekdays.is_empty() && self.frequency != Frequency::Weekly {
            errors.push(FieldError::new("weekdays", "only apply to weekly recurrence"));
        }
        match self.end {
            RecurrenceEnd::AfterOccurrences { count: 0 } => {
                errors.push(FieldError::new("end", "occurrence count must be at least 1"));
            }
            RecurrenceEnd::Until { until } if until < anchor => {
                errors.push(FieldError::new("end", "until date is before the first occurrence"));
            }
            _ => {}
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Expand the series anchored at `[start, end)` and return, in order,
    /// the occurrences intersecting `[from, to)`, at most `limit` of them.
    pub fn occurrences(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Vec<Occurrence> {
        let mut result = Vec::new();
        if self.interval == 0 || end <= start || to <= from || limit == 0 {
            return result;
        }

        let duration = end - start;
        let mut index = 0u32;
        let mut steps = 0u32;

        for candidate in self.candidates(start) {
            steps += 1;
            if steps > MAX_STEPS {
                log::warn!("recurrence expansion stopped after {} steps", MAX_STEPS);
                break;
            }
            let Some(occ_start) = candidate else { continue };

            match self.end {
                RecurrenceEnd::AfterOccurrences { count } if index >= count => break,
                RecurrenceEnd::Until { until } if occ_start > until => break,
                _ => {}
            }
            if occ_start >= to {
                break;
            }

            let Some(occ_end) = occ_start.checked_add_signed(duration) else { break };
            if occ_end > from {
                result.push(Occurrence {
                    index,
                    start: occ_start,
                    end: occ_end,
                });
                if result.len() >= limit {
                    break;
                }
            }
            index += 1;
        }
        result
    }

    /// Ascending candidate starts; `None` marks a skipped slot (a month
    /// without the anchor day) so the caller can bound its work. The
    /// sequence ends where dates leave chrono's range.
    fn candidates(&self, anchor: DateTime<Utc>) -> Box<dyn Iterator<Item = Option<DateTime<Utc>>> + '_> {
        let interval = i64::from(self.interval);
        let date = anchor.date_naive();
        let time = anchor.time();
        let at = move |d: NaiveDate| d.and_time(time).and_utc();

        match self.frequency {
            Frequency::Daily => Box::new((0i64..).map_while(move |k| {
                let delta = Duration::try_days(k.checked_mul(interval)?)?;
                anchor.checked_add_signed(delta).map(Some)
            })),
            Frequency::Weekly => {
                let mut days: Vec<u32> = if self.weekdays.is_empty() {
                    vec![date.weekday().num_days_from_monday()]
                } else {
                    self.weekdays.iter().map(|w| w.num_days_from_monday()).collect()
                };
                days.sort_unstable();
                days.dedup();
                let Some(monday) = date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
                else {
                    return Box::new(std::iter::empty());
                };
                Box::new(
                    (0i64..)
                        .map_while(move |w| monday.checked_add_signed(Duration::try_weeks(w.checked_mul(interval)?)?))
                        .flat_map(move |week| {
                            days.iter()
                                .filter_map(|d| week.checked_add_days(Days::new(u64::from(*d))))
                                .map(at)
                                .filter(|t| *t >= anchor)
                                .map(Some)
                                .collect::<Vec<_>>()
                        }),
                )
            }
            Frequency::Monthly => {
                let base = i64::from(date.year()) * 12 + i64::from(date.month0());
                Box::new((0i64..).map_while(move |k| {
                    let total = base.checked_add(k.checked_mul(interval)?)?;
                    let year = i32::try_from(total.div_euclid(12)).ok().filter(|y| *y <= NaiveDate::MAX.year())?;
                    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;
                    Some(NaiveDate::from_ymd_opt(year, month, date.day()).map(at))
                }))
            }
            Frequency::Yearly => Box::new((0i64..).map_while(move |k| {
                let year = i64::from(date.year()).checked_add(k.checked_mul(interval)?)?;
                let year = i32::try_from(year).ok().filter(|y| *y <= NaiveDate::MAX.year())?;
                Some(NaiveDate::from_ymd_opt(year, date.month(), date.day()).map(at))
            })),
        }
    }
}

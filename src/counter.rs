//! Running "time together" counter shown under the tree.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Whole days / seconds since the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Elapsed {
    pub days: i64,
    pub seconds: i64,
}

/// Counter display sink.
pub trait CounterFace {
    fn show_elapsed(&mut self, elapsed: Elapsed);
}

/// Counts real elapsed time from an absolute instant, so a DST change in
/// between does not shift the reading.
pub struct ElapsedCounter {
    origin: DateTime<Utc>,
}

impl ElapsedCounter {
    /// Counts from local midnight of `start`.
    pub fn new(start: NaiveDate) -> Self {
        Self::at_midnight_in(start, &Local)
    }

    /// Counts from midnight of `start` in `tz`. A midnight skipped by a DST
    /// jump falls back to reading the wall time as UTC.
    pub fn at_midnight_in<Tz: TimeZone>(start: NaiveDate, tz: &Tz) -> Self {
        let midnight = start.and_time(NaiveTime::MIN);
        let origin = tz
            .from_local_datetime(&midnight)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));
        Self { origin }
    }

    pub fn origin(&self) -> DateTime<Utc> {
        self.origin
    }

    /// Negative spans (clock before origin) read as zero.
    pub fn sample<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Elapsed {
        let span = now.with_timezone(&Utc) - self.origin;
        Elapsed {
            days: span.num_days().max(0),
            seconds: span.num_seconds().max(0),
        }
    }

    pub fn refresh<Tz: TimeZone>(&self, now: &DateTime<Tz>, face: &mut impl CounterFace) {
        face.show_elapsed(self.sample(now));
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn origin() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    fn utc_counter() -> ElapsedCounter {
        ElapsedCounter::at_midnight_in(origin(), &Utc)
    }

    #[test]
    fn counts_whole_seconds_and_days() {
        let c = utc_counter();
        let at = |secs: i64| c.origin() + Duration::seconds(secs);
        assert_eq!(c.sample(&at(0)), Elapsed { days: 0, seconds: 0 });
        assert_eq!(c.sample(&at(59)), Elapsed { days: 0, seconds: 59 });
        assert_eq!(c.sample(&at(86_399)), Elapsed { days: 0, seconds: 86_399 });
        assert_eq!(c.sample(&at(86_400)), Elapsed { days: 1, seconds: 86_400 });
    }

    #[test]
    fn fractional_seconds_truncate() {
        let c = utc_counter();
        let now = c.origin() + Duration::milliseconds(1_999);
        assert_eq!(c.sample(&now).seconds, 1);
    }

    #[test]
    fn christmas_reading() {
        let c = utc_counter();
        let xmas = NaiveDate::from_ymd_opt(2025, 12, 25)
            .unwrap()
            .and_time(NaiveTime::MIN)
            .and_utc();
        assert_eq!(c.sample(&xmas), Elapsed { days: 339, seconds: 339 * 86_400 });
    }

    #[test]
    fn before_origin_reads_zero() {
        let c = utc_counter();
        let early = c.origin() - Duration::hours(5);
        assert_eq!(c.sample(&early), Elapsed { days: 0, seconds: 0 });
    }

    #[test]
    fn refresh_pushes_to_face() {
        struct Face(Vec<Elapsed>);
        impl CounterFace for Face {
            fn show_elapsed(&mut self, e: Elapsed) {
                self.0.push(e);
            }
        }
        let c = utc_counter();
        let mut face = Face(Vec::new());
        c.refresh(&(c.origin() + Duration::seconds(90_000)), &mut face);
        assert_eq!(face.0, vec![Elapsed { days: 1, seconds: 90_000 }]);
    }

    #[test]
    fn spans_across_a_clock_change_count_real_seconds() {
        // US spring-forward 2025-03-09: EST (-5) before, EDT (-4) after
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let edt = FixedOffset::west_opt(4 * 3600).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let c = ElapsedCounter::at_midnight_in(day, &est);

        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let two_days_later = edt
            .from_local_datetime(&monday.and_time(NaiveTime::MIN))
            .unwrap();
        // wall clock says 48 h, only 47 h actually passed
        assert_eq!(
            c.sample(&two_days_later),
            Elapsed { days: 1, seconds: 47 * 3600 }
        );
    }

    #[test]
    fn local_origin_matches_the_same_instant_in_utc() {
        let c = ElapsedCounter::new(origin());
        let now = Local::now();
        let real = (now.with_timezone(&Utc) - c.origin()).num_seconds();
        assert_eq!(c.sample(&now).seconds, real.max(0));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(29_289_600), "29,289,600");
        assert_eq!(group_thousands(-1_234_567), "-1,234,567");
        assert_eq!(group_thousands(i64::MIN), "-9,223,372,036,854,775,808");
    }
}

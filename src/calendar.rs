//! Accelerating calendar tear-off.
//!
//! The sequencer walks one calendar day per step from the start date to the
//! target date. The delay between steps shrinks geometrically to a floor, and
//! while steps are still slow enough to be seen each one tears off a page.
//! Termination is exact: the last displayed date is always the target.
//!
//! The sequencer never owns a timer. [`CalendarSequencer::tick`] is fed the
//! current time by whoever drives the page and runs every step whose deadline
//! has passed, chaining each deadline from the previous one.

use chrono::{Datelike, NaiveDate};

use crate::config::CalendarTiming;

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

pub fn month_abbreviation(date: NaiveDate) -> &'static str {
    MONTH_ABBREVIATIONS[date.month0() as usize]
}

/// A torn-off page, handed to the display and forgotten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TearVisual {
    pub month: &'static str,
    pub day: u32,
    pub year: i32,
}

impl TearVisual {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            month: month_abbreviation(date),
            day: date.day(),
            year: date.year(),
        }
    }
}

/// Calendar face sink.
pub trait CalendarFace {
    fn show_date(&mut self, month: &'static str, day: u32);
    fn tear_page(&mut self, tear: TearVisual);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Running,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalendarCursor {
    pub current_date: NaiveDate,
    pub step_delay_ms: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved forward one day.
    Advanced,
    /// Landed on the target; the sequencer is now done.
    Finished,
    /// Not running.
    Inactive,
}

pub struct CalendarSequencer {
    timing: CalendarTiming,
    start_date: NaiveDate,
    target_date: NaiveDate,
    state: SequencerState,
    cursor: Option<CalendarCursor>,
    next_step_at: f64,
    handoff_at: Option<f64>,
    handed_off: bool,
    steps: u32,
}

impl CalendarSequencer {
    pub fn new(start_date: NaiveDate, target_date: NaiveDate, timing: CalendarTiming) -> Self {
        Self {
            timing,
            start_date,
            target_date,
            state: SequencerState::Idle,
            cursor: None,
            next_step_at: 0.0,
            handoff_at: None,
            handed_off: false,
            steps: 0,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn cursor(&self) -> Option<CalendarCursor> {
        self.cursor
    }

    /// Day advances performed so far.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    /// Idle -> Running; the first step is due after the initial pause.
    /// Calling it again once started has no effect.
    pub fn start(&mut self, now: f64) {
        if self.state != SequencerState::Idle {
            return;
        }
        self.state = SequencerState::Running;
        self.cursor = Some(CalendarCursor {
            current_date: self.start_date,
            step_delay_ms: self.timing.initial_delay_ms,
        });
        self.next_step_at = now + self.timing.initial_pause_ms;
        log::debug!(
            "calendar: {} -> {}, first step at {:.0}ms",
            self.start_date,
            self.target_date,
            self.next_step_at
        );
    }

    /// Run a single step regardless of timing.
    pub fn step(&mut self, face: &mut impl CalendarFace) -> StepOutcome {
        let Some(cursor) = self.cursor.as_mut() else {
            return StepOutcome::Inactive;
        };
        if self.state != SequencerState::Running {
            return StepOutcome::Inactive;
        }

        if cursor.current_date >= self.target_date {
            cursor.current_date = self.target_date;
            face.show_date(month_abbreviation(self.target_date), self.target_date.day());
            self.state = SequencerState::Done;
            log::info!("calendar reached {} after {} steps", self.target_date, self.steps);
            return StepOutcome::Finished;
        }

        if cursor.step_delay_ms > self.timing.tear_threshold_ms {
            face.tear_page(TearVisual::for_date(cursor.current_date));
        }

        cursor.current_date = match cursor.current_date.succ_opt() {
            Some(next) => next,
            None => self.target_date,
        };
        face.show_date(
            month_abbreviation(cursor.current_date),
            cursor.current_date.day(),
        );
        cursor.step_delay_ms = next_delay(cursor.step_delay_ms, &self.timing);
        self.steps += 1;
        StepOutcome::Advanced
    }

    /// Drive the sequencer from an external clock. Returns `true` exactly once,
    /// when the completion pause after the final date has elapsed.
    pub fn tick(&mut self, now: f64, face: &mut impl CalendarFace) -> bool {
        while self.state == SequencerState::Running && now >= self.next_step_at {
            match self.step(face) {
                StepOutcome::Advanced => {
                    let delay = self.cursor.map_or(0.0, |c| c.step_delay_ms);
                    self.next_step_at += delay;
                }
                StepOutcome::Finished => {
                    self.handoff_at = Some(self.next_step_at + self.timing.completion_pause_ms);
                }
                StepOutcome::Inactive => break,
            }
        }

        match self.handoff_at {
            Some(at) if !self.handed_off && now >= at => {
                self.handed_off = true;
                true
            }
            _ => false,
        }
    }
}

fn next_delay(delay: f64, timing: &CalendarTiming) -> f64 {
    (delay * timing.decay).max(timing.floor_ms)
}

/// The delay sequence the sequencer walks through, starting with the initial delay.
pub fn delay_schedule(timing: CalendarTiming) -> impl Iterator<Item = f64> {
    std::iter::successors(Some(timing.initial_delay_ms), move |d| {
        Some(next_delay(*d, &timing))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Face {
        shown: Vec<(&'static str, u32)>,
        tears: Vec<TearVisual>,
    }

    impl CalendarFace for Face {
        fn show_date(&mut self, month: &'static str, day: u32) {
            self.shown.push((month, day));
        }
        fn tear_page(&mut self, tear: TearVisual) {
            self.tears.push(tear);
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn run_to_done(seq: &mut CalendarSequencer, face: &mut Face) -> Vec<NaiveDate> {
        seq.start(0.0);
        let mut visited = vec![seq.cursor().unwrap().current_date];
        loop {
            match seq.step(face) {
                StepOutcome::Advanced => visited.push(seq.cursor().unwrap().current_date),
                StepOutcome::Finished => return visited,
                StepOutcome::Inactive => panic!("sequencer went inactive"),
            }
        }
    }

    #[test]
    fn visits_every_day_across_year_boundary() {
        let mut seq = CalendarSequencer::new(ymd(2024, 12, 28), ymd(2025, 3, 2), CalendarTiming::default());
        let mut face = Face::default();
        let visited = run_to_done(&mut seq, &mut face);
        for pair in visited.windows(2) {
            assert_eq!(pair[0].succ_opt().unwrap(), pair[1]);
        }
        assert!(visited.contains(&ymd(2024, 12, 31)));
        assert!(visited.contains(&ymd(2025, 1, 1)));
        assert!(visited.contains(&ymd(2025, 1, 31)));
        assert!(visited.contains(&ymd(2025, 2, 1)));
        assert!(visited.contains(&ymd(2025, 2, 28)));
        assert!(visited.contains(&ymd(2025, 3, 1)));
        assert_eq!(*visited.last().unwrap(), ymd(2025, 3, 2));
    }

    #[test]
    fn leap_day_is_visited() {
        let mut seq = CalendarSequencer::new(ymd(2024, 2, 27), ymd(2024, 3, 1), CalendarTiming::default());
        let mut face = Face::default();
        let visited = run_to_done(&mut seq, &mut face);
        assert_eq!(
            visited,
            vec![ymd(2024, 2, 27), ymd(2024, 2, 28), ymd(2024, 2, 29), ymd(2024, 3, 1)]
        );
    }

    #[test]
    fn start_equal_to_target_finishes_immediately() {
        let mut seq = CalendarSequencer::new(ymd(2025, 12, 25), ymd(2025, 12, 25), CalendarTiming::default());
        let mut face = Face::default();
        seq.start(0.0);
        assert_eq!(seq.step(&mut face), StepOutcome::Finished);
        assert_eq!(seq.steps(), 0);
        assert_eq!(face.shown, vec![("DEC", 25)]);
        assert!(face.tears.is_empty());
    }

    #[test]
    fn start_past_target_clamps_to_target() {
        let mut seq = CalendarSequencer::new(ymd(2026, 1, 3), ymd(2025, 12, 25), CalendarTiming::default());
        let mut face = Face::default();
        seq.start(0.0);
        assert_eq!(seq.step(&mut face), StepOutcome::Finished);
        assert_eq!(seq.cursor().unwrap().current_date, ymd(2025, 12, 25));
        assert_eq!(face.shown.last(), Some(&("DEC", 25)));
    }

    #[test]
    fn idle_and_done_steps_are_inactive() {
        let mut seq = CalendarSequencer::new(ymd(2025, 1, 1), ymd(2025, 1, 2), CalendarTiming::default());
        let mut face = Face::default();
        assert_eq!(seq.step(&mut face), StepOutcome::Inactive);
        seq.start(0.0);
        assert_eq!(seq.step(&mut face), StepOutcome::Advanced);
        assert_eq!(seq.step(&mut face), StepOutcome::Finished);
        assert_eq!(seq.step(&mut face), StepOutcome::Inactive);
        assert_eq!(seq.state(), SequencerState::Done);
    }

    #[test]
    fn delay_schedule_is_geometric_then_floored() {
        let delays: Vec<f64> = delay_schedule(CalendarTiming::default()).take(200).collect();
        assert_eq!(delays[0], 800.0);
        assert!((delays[1] - 736.0).abs() < 1e-9);
        assert!((delays[2] - 677.12).abs() < 1e-9);
        for pair in delays.windows(2) {
            assert!(pair[1] <= pair[0]);
            if pair[0] * 0.92 > 10.0 {
                assert!((pair[1] - pair[0] * 0.92).abs() < 1e-9);
            } else {
                assert_eq!(pair[1], 10.0);
            }
        }
        let first_floor = delays.iter().position(|d| *d == 10.0).unwrap();
        assert!(delays[first_floor..].iter().all(|d| *d == 10.0));
    }

    #[test]
    fn cursor_delay_tracks_the_schedule() {
        let mut seq = CalendarSequencer::new(ymd(2025, 1, 20), ymd(2025, 12, 25), CalendarTiming::default());
        let mut face = Face::default();
        seq.start(0.0);
        let expected: Vec<f64> = delay_schedule(CalendarTiming::default()).take(100).collect();
        for want in expected.iter().skip(1) {
            seq.step(&mut face);
            assert!((seq.cursor().unwrap().step_delay_ms - want).abs() < 1e-9);
        }
    }

    #[test]
    fn tears_stop_once_steps_are_fast() {
        let mut seq = CalendarSequencer::new(ymd(2025, 1, 20), ymd(2025, 12, 25), CalendarTiming::default());
        let mut face = Face::default();
        run_to_done(&mut seq, &mut face);
        let slow_steps = delay_schedule(CalendarTiming::default())
            .take(339)
            .filter(|d| *d > 30.0)
            .count();
        assert_eq!(face.tears.len(), slow_steps);
        assert_eq!(
            face.tears[0],
            TearVisual {
                month: "JAN",
                day: 20,
                year: 2025
            }
        );
        assert_eq!(face.tears[1].day, 21);
    }

    #[test]
    fn tick_honours_initial_pause_and_chained_delays() {
        let mut seq = CalendarSequencer::new(ymd(2025, 1, 20), ymd(2025, 12, 25), CalendarTiming::default());
        let mut face = Face::default();
        seq.start(100.0);
        assert!(!seq.tick(1099.0, &mut face));
        assert_eq!(seq.steps(), 0);
        seq.tick(1100.0, &mut face);
        assert_eq!(seq.steps(), 1);
        // next deadline is 1100 + 736
        seq.tick(1835.0, &mut face);
        assert_eq!(seq.steps(), 1);
        seq.tick(1836.0, &mut face);
        assert_eq!(seq.steps(), 2);
    }

    #[test]
    fn tick_reports_handoff_once_after_completion_pause() {
        let mut seq = CalendarSequencer::new(ymd(2025, 1, 1), ymd(2025, 1, 2), CalendarTiming::default());
        let mut face = Face::default();
        seq.start(0.0);
        // advance at 1000, finish at 1736, hand-off due 1500ms later
        assert!(!seq.tick(1000.0, &mut face));
        assert!(!seq.tick(1800.0, &mut face));
        assert_eq!(seq.state(), SequencerState::Done);
        assert!(!seq.tick(3235.0, &mut face));
        assert!(seq.tick(3236.0, &mut face));
        assert!(!seq.tick(5000.0, &mut face));
    }

    #[test]
    fn late_tick_catches_up_without_overshooting() {
        let mut seq = CalendarSequencer::new(ymd(2025, 1, 20), ymd(2025, 12, 25), CalendarTiming::default());
        let mut face = Face::default();
        seq.start(0.0);
        seq.tick(1.0e9, &mut face);
        assert_eq!(seq.state(), SequencerState::Done);
        assert_eq!(seq.steps(), 339);
        assert_eq!(face.shown.last(), Some(&("DEC", 25)));
    }

    #[test]
    fn restart_is_ignored() {
        let mut seq = CalendarSequencer::new(ymd(2025, 1, 1), ymd(2025, 2, 1), CalendarTiming::default());
        let mut face = Face::default();
        seq.start(0.0);
        seq.step(&mut face);
        seq.start(50.0);
        assert_eq!(seq.cursor().unwrap().current_date, ymd(2025, 1, 2));
    }
}

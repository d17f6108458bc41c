#![allow(dead_code)]
use affectation::model::{Assignment, ShiftRequirement, WorkerAvailability, WorkerId};
use chrono::{NaiveDate, NaiveTime};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Lundi 3 mars 2025.
pub fn monday() -> NaiveDate {
    d(2025, 3, 3)
}

pub fn worker(id: &str) -> WorkerAvailability {
    WorkerAvailability::new(id, "operator")
}

pub fn shift(id: &str, date: NaiveDate, start: (u32, u32), end: (u32, u32)) -> ShiftRequirement {
    ShiftRequirement::new(id, "dock", date, t(start.0, start.1), t(end.0, end.1))
}

pub fn assigned(shift: &ShiftRequirement, worker: &str) -> Assignment {
    let mut a = Assignment::for_shift(shift, &WorkerId::new(worker));
    a.match_score = 80.0;
    a
}

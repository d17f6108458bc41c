use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;

/// Clé (année ISO, semaine ISO).
pub(crate) fn iso_week(date: NaiveDate) -> (i32, u32) {
    let w = date.iso_week();
    (w.year(), w.week())
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn clamp_pct(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 100.0)
}

/// Ordre décroissant sur des flottants, NaN en dernier.
pub(crate) fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Longueur de la série de jours consécutifs contenant `anchor`.
pub(crate) fn run_through(anchor: NaiveDate, contains: impl Fn(NaiveDate) -> bool) -> u32 {
    let mut run = 1u32;
    let mut cursor = anchor;
    while let Some(prev) = cursor.pred_opt() {
        if !contains(prev) {
            break;
        }
        run += 1;
        cursor = prev;
    }
    cursor = anchor;
    while let Some(next) = cursor.succ_opt() {
        if !contains(next) {
            break;
        }
        run += 1;
        cursor = next;
    }
    run
}

/// Moyenne et écart-type (population).
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

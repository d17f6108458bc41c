#![forbid(unsafe_code)]
mod common;

use affectation::{
    availability::AvailabilityIndex,
    model::{AssignmentId, WorkerId},
    rules::{ConstraintKind, ConstraintRule, RuleKind, RuleScope, RuleSet, Severity},
    scheduler::{evaluate, evaluate_assignments, ScheduleState},
};
use chrono::Duration;
use common::{assigned, monday, shift, worker};

fn kinds(v: &[affectation::rules::ConstraintViolation]) -> Vec<ConstraintKind> {
    v.iter().map(|v| v.kind).collect()
}

#[test]
fn overlapping_same_day_assignments_are_both_double_booked() {
    let day = monday();
    let a = assigned(&shift("early", day, (9, 0), (17, 0)), "w1");
    let b = assigned(&shift("late", day, (14, 0), (22, 0)), "w1");
    let index = AvailabilityIndex::build(&[worker("w1")]);

    let found = evaluate_assignments(&RuleSet::default(), &index, &[a.clone(), b.clone()]);
    for id in [&a.id, &b.id] {
        let v = &found[id];
        let double: Vec<_> = v
            .iter()
            .filter(|v| v.kind == ConstraintKind::DoubleBooking)
            .collect();
        assert_eq!(double.len(), 1, "{id}");
        assert_eq!(double[0].severity, Severity::Hard);
        // le chevauchement n'est pas compté deux fois comme repos insuffisant
        assert!(!kinds(v).contains(&ConstraintKind::MinRest));
    }
}

#[test]
fn adjacent_shifts_do_not_overlap() {
    let day = monday();
    let a = assigned(&shift("am", day, (6, 0), (12, 0)), "w1");
    let b = assigned(&shift("pm", day, (12, 0), (18, 0)), "w1");
    let index = AvailabilityIndex::build(&[worker("w1")]);

    let found = evaluate_assignments(&RuleSet::default(), &index, &[a.clone(), b]);
    assert!(!kinds(&found[&a.id]).contains(&ConstraintKind::DoubleBooking));
}

#[test]
fn overnight_shift_counts_rest_across_midnight() {
    let day = monday();
    let index = AvailabilityIndex::build(&[worker("w1")]);
    let entry = index.get(&WorkerId::new("w1")).unwrap();
    let mut state = ScheduleState::new();
    state.place(entry.id(), &shift("night", day, (22, 0), (6, 0)));

    let next = shift("next", day + Duration::days(1), (10, 0), (18, 0));
    let v = evaluate(&RuleSet::default(), entry, &next, &state);
    let rest = v
        .iter()
        .find(|v| v.kind == ConstraintKind::MinRest)
        .expect("min rest violation");
    assert!(rest.message.contains("4.0h"));

    let later = shift("later", day + Duration::days(1), (15, 0), (23, 0));
    let v = evaluate(&RuleSet::default(), entry, &later, &state);
    assert!(!kinds(&v).contains(&ConstraintKind::MinRest));
}

#[test]
fn seventh_consecutive_day_breaks_the_limit() {
    let day = monday();
    let index = AvailabilityIndex::build(&[worker("w1")]);
    let entry = index.get(&WorkerId::new("w1")).unwrap();
    let mut state = ScheduleState::new();
    for i in 0..6 {
        state.place(
            entry.id(),
            &shift(&format!("d{i}"), day + Duration::days(i), (8, 0), (14, 0)),
        );
    }

    let sunday = shift("sun", day + Duration::days(6), (8, 0), (14, 0));
    let v = evaluate(&RuleSet::default(), entry, &sunday, &state);
    assert!(kinds(&v).contains(&ConstraintKind::MaxConsecutiveShifts));
    // 7 x 6h = 42h : au-dessus de 90 % de 40h, sous le plafond de 48h
    assert!(!kinds(&v).contains(&ConstraintKind::MaxHoursPerWeek));

    // un jour de repos coupe la série
    let gap = shift("gap", day + Duration::days(7), (8, 0), (14, 0));
    let v = evaluate(&RuleSet::default(), entry, &gap, &state);
    assert!(!kinds(&v).contains(&ConstraintKind::MaxConsecutiveShifts));
}

#[test]
fn weekly_hours_warning_then_cap() {
    let day = monday();
    let index = AvailabilityIndex::build(&[worker("w1")]);
    let entry = index.get(&WorkerId::new("w1")).unwrap();
    let mut state = ScheduleState::new();
    for i in 0..4 {
        state.place(
            entry.id(),
            &shift(&format!("d{i}"), day + Duration::days(i), (8, 0), (16, 0)),
        );
    }

    // 32h + 8h = 40h : proche du seuil
    let fifth = shift("d4", day + Duration::days(4), (8, 0), (16, 0));
    let v = evaluate(&RuleSet::default(), entry, &fifth, &state);
    let near = v
        .iter()
        .find(|v| v.kind == ConstraintKind::NearHoursThreshold)
        .expect("near threshold warning");
    assert_eq!(near.severity, Severity::Warning);

    state.place(entry.id(), &fifth);
    let long = shift("d5", day + Duration::days(5), (6, 0), (16, 0));
    let v = evaluate(&RuleSet::default(), entry, &long, &state);
    assert!(kinds(&v).contains(&ConstraintKind::MaxHoursPerWeek));
    assert!(!kinds(&v).contains(&ConstraintKind::NearHoursThreshold));
}

#[test]
fn worker_cap_on_shifts_per_week_wins() {
    let day = monday();
    let mut w = worker("w1");
    w.max_shifts_per_week = Some(1);
    let index = AvailabilityIndex::build(&[w]);
    let entry = index.get(&WorkerId::new("w1")).unwrap();
    let mut state = ScheduleState::new();
    state.place(entry.id(), &shift("a", day, (8, 0), (12, 0)));

    let v = evaluate(
        &RuleSet::default(),
        entry,
        &shift("b", day + Duration::days(2), (8, 0), (12, 0)),
        &state,
    );
    assert!(kinds(&v).contains(&ConstraintKind::MaxShiftsPerWeek));

    // semaine ISO suivante
    let v = evaluate(
        &RuleSet::default(),
        entry,
        &shift("c", day + Duration::days(7), (8, 0), (12, 0)),
        &state,
    );
    assert!(!kinds(&v).contains(&ConstraintKind::MaxShiftsPerWeek));
}

#[test]
fn preferences_are_soft() {
    let mut w = worker("w1");
    w.preferred_shift_types = vec!["night".into()];
    w.preferred_departments = vec!["ICU".into()];
    let index = AvailabilityIndex::build(&[w]);
    let entry = index.get(&WorkerId::new("w1")).unwrap();

    let v = evaluate(
        &RuleSet::default(),
        entry,
        &shift("s", monday(), (8, 0), (16, 0)),
        &ScheduleState::new(),
    );
    assert_eq!(
        kinds(&v),
        vec![ConstraintKind::ShiftPreference, ConstraintKind::LocationPreference]
    );
    assert!(v.iter().all(|v| v.severity == Severity::Soft));
}

#[test]
fn scoped_and_disabled_rules_are_skipped() {
    let mut skill_icu = ConstraintRule::new("skill-icu", RuleKind::RequiredSkill, Severity::Hard)
        .with_scope(RuleScope::Department {
            ids: vec!["icu".into()],
        });
    let mut rules = RuleSet {
        rules: vec![skill_icu.clone()],
    };
    let index = AvailabilityIndex::build(&[worker("w1")]);
    let entry = index.get(&WorkerId::new("w1")).unwrap();

    let mut s = shift("s", monday(), (8, 0), (16, 0));
    s.required_skills = vec!["iv".into()];
    assert!(evaluate(&rules, entry, &s, &ScheduleState::new()).is_empty());

    s.department = "ICU".into();
    let v = evaluate(&rules, entry, &s, &ScheduleState::new());
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].rule_id, "skill-icu");
    assert!(v[0].message.contains("iv"));

    skill_icu.enabled = false;
    rules.rules = vec![skill_icu];
    assert!(evaluate(&rules, entry, &s, &ScheduleState::new()).is_empty());
}

#[test]
fn rules_decode_from_tagged_json() {
    let raw = r#"{ "rules": [
        { "id": "rest", "type": "min_rest", "hours": 11, "severity": "hard" },
        { "id": "cap", "type": "max_shifts_per_week", "default_max": 4, "severity": "soft",
          "scope": { "level": "role", "roles": ["nurse"] } },
        { "id": "dbl", "type": "double_booking", "severity": "hard", "enabled": false }
    ] }"#;
    let rules: RuleSet = serde_json::from_str(raw).unwrap();
    assert_eq!(rules.rules[0].kind, RuleKind::MinRest { hours: 11.0 });
    assert_eq!(
        rules.rules[1].kind,
        RuleKind::MaxShiftsPerWeek {
            default_max: Some(4)
        }
    );
    assert_eq!(rules.active().count(), 2);

    let unknown = r#"{ "rules": [ { "id": "x", "type": "teleport", "severity": "hard" } ] }"#;
    assert!(serde_json::from_str::<RuleSet>(unknown).is_err());
}

#[test]
fn cancelled_assignments_are_not_evaluated() {
    let day = monday();
    let a = assigned(&shift("a", day, (9, 0), (17, 0)), "w1");
    let mut b = assigned(&shift("b", day, (10, 0), (18, 0)), "w1");
    b.status = affectation::model::AssignmentStatus::Cancelled;
    let index = AvailabilityIndex::build(&[worker("w1")]);

    let found = evaluate_assignments(&RuleSet::default(), &index, &[a.clone(), b]);
    assert!(found[&a.id].is_empty());
    assert!(!found.contains_key(&AssignmentId::for_slot(
        &affectation::model::ShiftId::new("b"),
        &WorkerId::new("w1")
    )));
}

#[test]
fn daily_hours_cap_counts_every_shift_of_the_day() {
    let day = monday();
    let index = AvailabilityIndex::build(&[worker("w1")]);
    let entry = index.get(&WorkerId::new("w1")).unwrap();
    let mut state = ScheduleState::new();
    state.place(entry.id(), &shift("morning", day, (8, 0), (14, 0)));

    let v = evaluate(&RuleSet::default(), entry, &shift("late", day, (15, 0), (22, 0)), &state);
    let daily = v
        .iter()
        .find(|v| v.kind == ConstraintKind::MaxHoursPerDay)
        .expect("daily cap exceeded");
    assert_eq!(daily.severity, Severity::Hard);
    assert!(daily.message.contains("13.0h"), "{}", daily.message);

    // exactement au plafond : pas de violation
    let v = evaluate(&RuleSet::default(), entry, &shift("late", day, (15, 0), (21, 0)), &state);
    assert!(!kinds(&v).contains(&ConstraintKind::MaxHoursPerDay));
}

#[test]
fn unavailable_day_is_a_hard_violation() {
    let day = monday();
    let mut off = worker("w1");
    off.unavailable_dates = vec![day];
    let mut elsewhere = worker("w2");
    elsewhere.available_dates = vec![day + Duration::days(1)];
    let index = AvailabilityIndex::build(&[off, elsewhere, worker("w3")]);
    let s = shift("s1", day, (8, 0), (16, 0));

    for w in ["w1", "w2"] {
        let entry = index.get(&WorkerId::new(w)).unwrap();
        let v = evaluate(&RuleSet::default(), entry, &s, &ScheduleState::new());
        assert_eq!(v[0].kind, ConstraintKind::Availability, "{w}");
        assert_eq!(v[0].severity, Severity::Hard);
    }

    let entry = index.get(&WorkerId::new("w3")).unwrap();
    let v = evaluate(&RuleSet::default(), entry, &s, &ScheduleState::new());
    assert!(v.is_empty());
}

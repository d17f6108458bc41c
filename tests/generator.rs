#![forbid(unsafe_code)]
mod common;

use affectation::{
    config::EngineConfig,
    model::{Priority, WorkerId},
    rules::{ConstraintKind, Severity},
    scheduler::{generate_schedule, GenerateRequest, ScheduleError, Strategy},
};
use common::{d, monday, shift, worker};

#[test]
fn skilled_worker_wins_required_skill_shift() {
    let mut s = shift("s1", monday(), (8, 0), (16, 0));
    s.required_skills = vec!["forklift".into()];
    let req = GenerateRequest::new(
        "acme",
        vec![s],
        vec![worker("w2"), worker("w1").with_skills(["Forklift"])],
    );

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert_eq!(res.assignments.len(), 1);
    let a = &res.assignments[0];
    assert_eq!(a.worker_id, WorkerId::new("w1"));
    assert!(a.violations.is_empty());
    assert_eq!(a.skill_match, 100.0);
    assert!(res.conflicts.is_empty());
}

#[test]
fn totals_are_consistent() {
    let day = monday();
    let shifts = vec![
        shift("a", day, (8, 0), (16, 0)),
        shift("b", day, (8, 0), (16, 0)),
        shift("c", day, (10, 0), (14, 0)),
    ];
    let req = GenerateRequest::new("acme", shifts, vec![worker("w1"), worker("w2")]);

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert_eq!(res.total_shifts, 3);
    assert_eq!(res.assigned_shifts + res.unassigned_shifts, res.total_shifts);
    assert_eq!(res.assigned_shifts, 2);
    assert_eq!(res.conflicts.len(), 1);
    let expected = res.assigned_shifts as f64 / res.total_shifts as f64 * 100.0;
    assert!((res.coverage_percentage - expected).abs() < 1e-9);

    // sans dérogation, aucune violation bloquante ne passe
    assert_eq!(res.total_hard_violations, 0);
    assert!(res
        .assignments
        .iter()
        .all(|a| a.violations.iter().all(|v| v.severity != Severity::Hard)));

    let conflict = &res.conflicts[0];
    assert_eq!(conflict.shift_id.as_str(), "c");
    assert!(conflict
        .reasons
        .iter()
        .any(|r| r.contains("violate double-booking")));
    assert!(conflict.attempts.len() <= 3);
}

#[test]
fn hard_override_keeps_violation_and_flags_it() {
    let mut s = shift("s1", monday(), (8, 0), (16, 0));
    s.required_skills = vec!["crane".into()];
    let mut req = GenerateRequest::new("acme", vec![s], vec![worker("w1")]);

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert!(res.assignments.is_empty());
    assert_eq!(
        res.conflicts[0].reasons,
        vec!["all candidates violate required-skill".to_string()]
    );

    req.allow_hard_overrides = true;
    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert_eq!(res.assignments.len(), 1);
    assert!(res.assignments[0].overridden);
    assert_eq!(res.total_hard_violations, 1);
    assert_eq!(
        res.assignments[0].violations[0].kind,
        ConstraintKind::RequiredSkill
    );
}

#[test]
fn no_candidate_for_role_is_explained() {
    let mut s = shift("s1", monday(), (8, 0), (16, 0));
    s.required_role = Some("nurse".into());
    let req = GenerateRequest::new("acme", vec![s], vec![worker("w1")]);

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    let reasons = &res.conflicts[0].reasons;
    assert_eq!(reasons[0], "no eligible employee");
    assert!(reasons[1].contains("role nurse"));
    assert!(res.conflicts[0].attempts.is_empty());
}

#[test]
fn unavailable_worker_is_never_a_candidate() {
    let day = monday();
    let mut w1 = worker("w1");
    w1.unavailable_dates = vec![day];
    let mut w2 = worker("w2");
    w2.available_dates = vec![day + chrono::Duration::days(1)];
    let req = GenerateRequest::new("acme", vec![shift("s1", day, (8, 0), (16, 0))], vec![w1, w2]);

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert!(res.assignments.is_empty());
    assert_eq!(res.conflicts[0].reasons[0], "no eligible employee");
}

#[test]
fn multi_staff_shift_is_filled_or_reported_understaffed() {
    let mut s = shift("s1", monday(), (8, 0), (16, 0));
    s.min_staff = 3;
    s.max_staff = 3;
    let req = GenerateRequest::new("acme", vec![s], vec![worker("w1"), worker("w2")]);

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert_eq!(res.assignments.len(), 2);
    assert_eq!(res.assigned_shifts, 0);
    let conflict = &res.conflicts[0];
    assert_eq!((conflict.required, conflict.placed), (3, 2));
    assert!(conflict
        .reasons
        .contains(&"understaffed: placed 2 of 3".to_string()));
}

#[test]
fn critical_shifts_are_served_first() {
    let day = monday();
    let low = shift("a-low", day, (8, 0), (16, 0));
    let mut urgent = shift("z-urgent", day, (9, 0), (17, 0));
    urgent.priority = Priority::Critical;
    let req = GenerateRequest::new("acme", vec![low, urgent], vec![worker("w1")]);

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert_eq!(res.assignments.len(), 1);
    assert_eq!(res.assignments[0].shift_id.as_str(), "z-urgent");
    assert_eq!(res.conflicts[0].shift_id.as_str(), "a-low");
}

#[test]
fn balanced_spreads_hours_and_greedy_does_not() {
    let day = monday();
    let shifts: Vec<_> = (0..4)
        .map(|i| shift(&format!("s{i}"), day + chrono::Duration::days(i), (8, 0), (16, 0)))
        .collect();
    let workers = vec![worker("w1"), worker("w2")];

    let balanced = GenerateRequest::new("acme", shifts.clone(), workers.clone());
    let res = generate_schedule(&balanced, &EngineConfig::default()).unwrap();
    let w1 = res
        .assignments
        .iter()
        .filter(|a| a.worker_id.as_str() == "w1")
        .count();
    assert_eq!(w1, 2);
    assert_eq!(res.algorithm_used, Strategy::Balanced);

    let greedy = GenerateRequest::new("acme", shifts, workers).with_strategy(Strategy::Greedy);
    let res = generate_schedule(&greedy, &EngineConfig::default()).unwrap();
    assert!(res.assignments.iter().all(|a| a.worker_id.as_str() == "w1"));
    assert_eq!(res.algorithm_used, Strategy::Greedy);
}

#[test]
fn skills_first_prefers_best_skill_match() {
    let mut s = shift("s1", monday(), (8, 0), (16, 0));
    s.required_skills = vec!["forklift".into(), "hazmat".into()];
    let mut req = GenerateRequest::new(
        "acme",
        vec![s],
        vec![
            worker("a").with_skills(["forklift"]),
            worker("b").with_skills(["forklift", "hazmat"]),
        ],
    )
    .with_strategy(Strategy::SkillsFirst);
    req.allow_hard_overrides = true;

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert_eq!(res.assignments[0].worker_id.as_str(), "b");
}

#[test]
fn generation_is_reproducible() {
    let day = monday();
    let shifts: Vec<_> = (0..6)
        .map(|i| shift(&format!("s{i}"), day + chrono::Duration::days(i / 2), (6, 0), (14, 0)))
        .collect();
    let workers = vec![worker("w3"), worker("w1"), worker("w2")];
    let req = GenerateRequest::new("acme", shifts, workers);
    let config = EngineConfig::default();

    let a = generate_schedule(&req, &config).unwrap();
    let b = generate_schedule(&req, &config).unwrap();
    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.conflicts, b.conflicts);
}

#[test]
fn malformed_request_is_rejected_with_every_issue() {
    let mut s = shift("s1", monday(), (8, 0), (8, 0));
    s.min_staff = 2;
    let mut req = GenerateRequest::new("", vec![s.clone(), s], vec![worker("w1"), worker("w1")]);
    req.period_start = Some(d(2025, 3, 10));
    req.period_end = Some(d(2025, 3, 1));

    match generate_schedule(&req, &EngineConfig::default()) {
        Err(ScheduleError::InvalidInput(issues)) => {
            let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
            assert!(fields.contains(&"organization_id"));
            assert!(fields.contains(&"period_end"));
            let text: Vec<String> = issues.iter().map(ToString::to_string).collect();
            assert!(text.iter().any(|m| m.contains("duplicate worker id w1")));
            assert!(text.iter().any(|m| m.contains("duplicate shift id s1")));
            assert!(text.iter().any(|m| m.contains("zero duration")));
            assert!(text.iter().any(|m| m.contains("min_staff above max_staff")));
        }
        other => panic!("expected invalid input, got {other:?}"),
    }
}

#[test]
fn empty_request_is_rejected() {
    let req = GenerateRequest::new("acme", vec![], vec![]);
    let err = generate_schedule(&req, &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidInput(ref issues) if issues.len() == 2));
}

#[test]
fn invalid_weights_abort_generation() {
    let mut config = EngineConfig::default();
    config.scoring.balance = 50.0;
    let req = GenerateRequest::new(
        "acme",
        vec![shift("s1", monday(), (8, 0), (16, 0))],
        vec![worker("w1")],
    );
    assert!(matches!(
        generate_schedule(&req, &config),
        Err(ScheduleError::InvalidConfig(_))
    ));
}

#[test]
fn overrides_only_when_no_clean_candidate_is_left() {
    let day = monday();
    let shifts = vec![shift("a", day, (8, 0), (16, 0)), shift("b", day, (9, 0), (17, 0))];
    let mut req = GenerateRequest::new("acme", shifts, vec![worker("w1"), worker("w2")])
        .with_strategy(Strategy::Greedy);
    req.allow_hard_overrides = true;

    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    let b = res
        .assignments
        .iter()
        .find(|a| a.shift_id.as_str() == "b")
        .unwrap();
    assert_eq!(b.worker_id, WorkerId::new("w2"));
    assert_eq!(res.total_hard_violations, 0);
    assert!(res.assignments.iter().all(|a| !a.overridden));
}

#[test]
fn soft_violation_cap_rejects_then_admits() {
    let mut w1 = worker("w1");
    w1.preferred_shift_types = vec!["night".into()];
    let mut req = GenerateRequest::new(
        "acme",
        vec![shift("s1", monday(), (8, 0), (16, 0))],
        vec![w1],
    );

    req.max_soft_violations = Some(0);
    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert!(res.assignments.is_empty());
    assert_eq!(
        res.conflicts[0].reasons,
        vec!["1 candidate(s) exceed max soft violations".to_string()]
    );

    req.max_soft_violations = Some(1);
    let res = generate_schedule(&req, &EngineConfig::default()).unwrap();
    assert_eq!(res.assignments.len(), 1);
    assert_eq!(res.total_soft_violations, 1);
    assert_eq!(res.total_hard_violations, 0);
    assert_eq!(
        res.assignments[0].violations[0].kind,
        ConstraintKind::ShiftPreference
    );
}

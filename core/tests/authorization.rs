//! Who may evaluate whom, and who may read finished evaluations.

use chrono::Utc;
use evaluation_core::{
    analysis::fallback_analysis,
    authz::{can_initiate_evaluation, can_view_evaluation, check_can_initiate, ViewPolicy},
    error::EvalError,
    hierarchy::OrgChart,
    model::{Employee, SavedEvaluation},
    seed::builtin_dataset,
};

fn employee<'a>(staff: &'a [Employee], id: &str) -> &'a Employee {
    staff.iter().find(|e| e.id == id).expect("seed employee")
}

#[test]
fn direct_supervisor_in_primary_role_may_evaluate() {
    let staff = builtin_dataset().employees;
    // Diana (5) supervises Tomás (6).
    assert!(can_initiate_evaluation(employee(&staff, "5"), employee(&staff, "6")));
}

#[test]
fn supervisor_through_additional_role_may_evaluate() {
    let staff = builtin_dataset().employees;
    // Sofía (7) is an internal auditor reporting to Lucía (3).
    assert!(can_initiate_evaluation(employee(&staff, "3"), employee(&staff, "7")));
    // Lucía (3) assists Jorge (2) in production.
    assert!(can_initiate_evaluation(employee(&staff, "2"), employee(&staff, "3")));
}

/// Skip-level managers are not direct supervisors.
#[test]
fn indirect_superior_may_not_evaluate() {
    let staff = builtin_dataset().employees;
    let err = check_can_initiate(employee(&staff, "1"), employee(&staff, "6")).unwrap_err();
    assert!(matches!(err, EvalError::NotSubordinate { .. }), "got {err:?}");
    assert!(!can_initiate_evaluation(employee(&staff, "1"), employee(&staff, "6")));
}

#[test]
fn self_evaluation_rejected_even_when_self_reporting() {
    let odd = Employee::new("1", "Ana", "Dirección", "Gerente")
        .reporting_to("1")
        .with_role("Auditora", "Calidad", Some("1"));
    assert!(!can_initiate_evaluation(&odd, &odd));
    assert!(matches!(
        check_can_initiate(&odd, &odd),
        Err(EvalError::SelfEvaluation { .. })
    ));
}

#[test]
fn view_policies() {
    let staff = builtin_dataset().employees;
    let chart = OrgChart::new(&staff);
    // Tomás (6) evaluated by Diana (5).
    let ev = SavedEvaluation::new("6", "5", Vec::new(), fallback_analysis(), Utc::now());

    let outsider = employee(&staff, "9");
    let subject = employee(&staff, "6");
    let evaluator = employee(&staff, "5");
    let director = employee(&staff, "1");

    assert!(can_view_evaluation(ViewPolicy::AnyAuthenticated, outsider, &ev, &chart));

    assert!(can_view_evaluation(ViewPolicy::Involved, subject, &ev, &chart));
    assert!(can_view_evaluation(ViewPolicy::Involved, evaluator, &ev, &chart));
    assert!(!can_view_evaluation(ViewPolicy::Involved, director, &ev, &chart));

    assert!(can_view_evaluation(ViewPolicy::Hierarchy, director, &ev, &chart));
    assert!(!can_view_evaluation(ViewPolicy::Hierarchy, outsider, &ev, &chart));
}

//! Dashboard and statistics aggregates.

use chrono::Utc;
use evaluation_core::{
    analysis::fallback_analysis,
    model::{ComplianceLevel, Criterion, Employee, SavedEvaluation},
    stats::{
        average_score, category_average, compliance_tier_counts, department_average,
        employee_average, refresh_average_scores, tier_of, ComplianceTier, DashboardStats,
        TierCounts,
    },
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn criterion(category: &str, score: f64) -> Criterion {
    Criterion {
        id: format!("{category}-{score}"),
        name: category.to_string(),
        description: String::new(),
        category: category.to_string(),
        score,
        feedback: None,
    }
}

fn evaluation(subject: &str, scores: &[(&str, f64)]) -> SavedEvaluation {
    SavedEvaluation::new(
        subject,
        "1",
        scores.iter().map(|(c, s)| criterion(c, *s)).collect(),
        fallback_analysis(),
        Utc::now(),
    )
}

fn staff() -> Vec<Employee> {
    vec![
        Employee::new("1", "Ana", "Dirección", "Gerente"),
        Employee::new("2", "Luis", "Producción", "Operario").reporting_to("1"),
        Employee::new("3", "Eva", "Calidad", "Inspectora").reporting_to("1"),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn average_of_6_7_9_4_is_mid_tier() {
    let ev = evaluation("2", &[("Calidad", 6.0), ("Calidad", 7.0), ("Seguridad", 9.0), ("Seguridad", 4.0)]);
    let avg = average_score(&ev);
    assert!(avg.has_data());
    assert_eq!(avg.value, 6.5);
    assert_eq!(tier_of(&ev), Some(ComplianceTier::Mid));
}

/// No criteria: a distinguishable "no data" sentinel, not a NaN.
#[test]
fn empty_criteria_yield_no_data_sentinel() {
    let ev = evaluation("2", &[]);
    let avg = average_score(&ev);
    assert!(!avg.has_data());
    assert_eq!(avg.value, 0.0);
    assert_eq!(avg.as_option(), None);
    assert_eq!(tier_of(&ev), None);
    assert_eq!(compliance_tier_counts(&[ev]), TierCounts::default());
}

#[test]
fn employee_average_is_none_without_evaluations() {
    let evs = vec![evaluation("2", &[("Calidad", 8.0)]), evaluation("2", &[("Calidad", 6.0), ("Calidad", 7.0)])];
    assert_eq!(employee_average("3", &evs), None);
    assert_eq!(employee_average("2", &evs), Some((8.0 + 6.5) / 2.0));
}

/// Department figures follow the employee's current department.
#[test]
fn department_average_follows_reassignment() {
    let mut employees = staff();
    let evs = vec![evaluation("2", &[("Calidad", 9.0)]), evaluation("3", &[("Calidad", 5.0)])];

    assert_eq!(department_average("Producción", &employees, &evs), Some(9.0));
    assert_eq!(department_average("Calidad", &employees, &evs), Some(5.0));

    employees[1].department = "Calidad".into();
    assert_eq!(department_average("Producción", &employees, &evs), None);
    assert_eq!(department_average("Calidad", &employees, &evs), Some(7.0));
}

#[test]
fn category_average_spans_all_evaluations() {
    let evs = vec![
        evaluation("2", &[("Calidad", 8.0), ("Seguridad", 2.0)]),
        evaluation("3", &[("Calidad", 6.0)]),
    ];
    assert_eq!(category_average("Calidad", &evs), Some(7.0));
    assert_eq!(category_average("Seguridad", &evs), Some(2.0));
    assert_eq!(category_average("Productividad", &evs), None);
}

#[test]
fn tier_counts_use_fixed_bands() {
    let evs = vec![
        evaluation("2", &[("Calidad", 8.0)]),
        evaluation("2", &[("Calidad", 9.5)]),
        evaluation("3", &[("Calidad", 5.0)]),
        evaluation("3", &[("Calidad", 4.9)]),
    ];
    assert_eq!(compliance_tier_counts(&evs), TierCounts { high: 2, mid: 1, low: 1 });
    assert_eq!(compliance_tier_counts(&[]).total(), 0);
}

#[test]
fn refresh_sets_and_clears_cached_averages() {
    let mut employees = staff();
    employees[2].average_score = Some(3.0);
    let evs = vec![evaluation("2", &[("Calidad", 7.0)])];
    refresh_average_scores(&mut employees, &evs);
    assert_eq!(employees[1].average_score, Some(7.0));
    assert_eq!(employees[2].average_score, None);
}

#[test]
fn dashboard_bundles_everything() {
    let employees = staff();
    let departments = vec!["Dirección".to_string(), "Producción".to_string(), "Calidad".to_string()];
    let mut high = evaluation("3", &[("Calidad", 9.0)]);
    high.analysis.iso_compliance_level = ComplianceLevel::Alto;
    let evs = vec![evaluation("2", &[("Calidad", 6.0), ("Seguridad", 4.0)]), high];

    let stats = DashboardStats::compute(&employees, &departments, &evs);
    assert_eq!(stats.total_evaluations, 2);
    assert_eq!(stats.employees_evaluated, 2);
    assert_eq!(stats.overall_average, Some(7.0));
    assert_eq!(stats.tiers, TierCounts { high: 1, mid: 1, low: 0 });
    assert_eq!(stats.compliance_levels["Alto"], 1);
    assert_eq!(stats.compliance_levels["Medio"], 1);
    assert_eq!(stats.compliance_levels["Bajo"], 0);
    assert_eq!(stats.by_department["Dirección"], None);
    assert_eq!(stats.by_department["Calidad"], Some(9.0));
    assert_eq!(stats.by_category["Seguridad"], Some(4.0));
    assert_eq!(stats.ranking[0].employee_id, "3");
    assert_eq!(stats.ranking[1].average, 5.0);
}

/// Evaluations without criteria are left out of the ranking count as well as the average.
#[test]
fn ranking_count_ignores_empty_evaluations() {
    let employees = staff();
    let evs = vec![evaluation("2", &[("Calidad", 6.0)]), evaluation("2", &[])];

    let stats = DashboardStats::compute(&employees, &[], &evs);
    assert_eq!(stats.total_evaluations, 2);
    assert_eq!(stats.ranking.len(), 1);
    assert_eq!(stats.ranking[0].average, 6.0);
    assert_eq!(stats.ranking[0].evaluations, 1);
}

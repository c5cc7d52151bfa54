//! Evaluation aggregates for the dashboard and statistics views.
//!
//! Every function is pure over `(employees, evaluations)`. Means over an empty
//! set are `None`; evaluations without criteria carry no data and are left
//! out of means and tier counts alike.
//!
//! Department figures look up each subject's *current* department, so moving
//! an employee moves their whole history with them.

use crate::model::{ComplianceLevel, Employee, SavedEvaluation};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub const HIGH_TIER_MIN: f64 = 8.0;
pub const MID_TIER_MIN: f64 = 5.0;

/// Mean criterion score of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    /// 0.0 when there is no data.
    pub value: f64,
    pub criteria_count: usize,
}

impl ScoreSummary {
    pub fn has_data(&self) -> bool {
        self.criteria_count > 0
    }

    pub fn as_option(&self) -> Option<f64> {
        self.has_data().then_some(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceTier {
    High,
    Mid,
    Low,
}

impl ComplianceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_TIER_MIN {
            ComplianceTier::High
        } else if score >= MID_TIER_MIN {
            ComplianceTier::Mid
        } else {
            ComplianceTier::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub high: usize,
    pub mid: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn total(&self) -> usize {
        self.high + self.mid + self.low
    }
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub fn average_score(evaluation: &SavedEvaluation) -> ScoreSummary {
    let n = evaluation.criteria.len();
    ScoreSummary {
        value: mean(evaluation.criteria.iter().map(|c| c.score)).unwrap_or(0.0),
        criteria_count: n,
    }
}

pub fn tier_of(evaluation: &SavedEvaluation) -> Option<ComplianceTier> {
    average_score(evaluation).as_option().map(ComplianceTier::from_score)
}

pub fn employee_average(employee_id: &str, evaluations: &[SavedEvaluation]) -> Option<f64> {
    mean(
        evaluations
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .filter_map(|e| average_score(e).as_option()),
    )
}

pub fn department_average(
    department: &str,
    employees: &[Employee],
    evaluations: &[SavedEvaluation],
) -> Option<f64> {
    let dept_of: HashMap<&str, &str> = employees
        .iter()
        .map(|e| (e.id.as_str(), e.department.as_str()))
        .collect();
    mean(
        evaluations
            .iter()
            .filter(|e| dept_of.get(e.employee_id.as_str()) == Some(&department))
            .filter_map(|e| average_score(e).as_option()),
    )
}

pub fn category_average(category: &str, evaluations: &[SavedEvaluation]) -> Option<f64> {
    mean(
        evaluations
            .iter()
            .flat_map(|e| e.criteria.iter())
            .filter(|c| c.category == category)
            .map(|c| c.score),
    )
}

pub fn compliance_tier_counts(evaluations: &[SavedEvaluation]) -> TierCounts {
    let mut counts = TierCounts::default();
    for tier in evaluations.iter().filter_map(tier_of) {
        match tier {
            ComplianceTier::High => counts.high += 1,
            ComplianceTier::Mid  => counts.mid += 1,
            ComplianceTier::Low  => counts.low += 1,
        }
    }
    counts
}

/// Recompute every employee's cached `average_score` from history.
pub fn refresh_average_scores(employees: &mut [Employee], evaluations: &[SavedEvaluation]) {
    for e in employees.iter_mut() {
        e.average_score = employee_average(&e.id, evaluations);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEmployee {
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub average: f64,
    pub evaluations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_evaluations: usize,
    pub employees_evaluated: usize,
    pub overall_average: Option<f64>,
    pub tiers: TierCounts,
    /// Keyed by the analysis' reported ISO level label.
    pub compliance_levels: BTreeMap<String, usize>,
    pub by_department: BTreeMap<String, Option<f64>>,
    pub by_category: BTreeMap<String, Option<f64>>,
    /// Best average first.
    pub ranking: Vec<RankedEmployee>,
}

impl DashboardStats {
    /// `departments` lists every department to report, including ones with no data.
    pub fn compute(
        employees: &[Employee],
        departments: &[String],
        evaluations: &[SavedEvaluation],
    ) -> Self {
        let mut compliance_levels: BTreeMap<String, usize> = ComplianceLevel::ALL
            .iter()
            .map(|l| (l.label().to_string(), 0))
            .collect();
        for e in evaluations {
            *compliance_levels
                .entry(e.analysis.iso_compliance_level.label().to_string())
                .or_default() += 1;
        }

        let by_department = departments
            .iter()
            .map(|d| (d.clone(), department_average(d, employees, evaluations)))
            .collect();

        let mut categories: Vec<&str> = evaluations
            .iter()
            .flat_map(|e| e.criteria.iter().map(|c| c.category.as_str()))
            .collect();
        categories.sort_unstable();
        categories.dedup();
        let by_category = categories
            .into_iter()
            .map(|c| (c.to_string(), category_average(c, evaluations)))
            .collect();

        let mut ranking: Vec<RankedEmployee> = employees
            .iter()
            .filter_map(|emp| {
                let average = employee_average(&emp.id, evaluations)?;
                Some(RankedEmployee {
                    employee_id: emp.id.clone(),
                    name: emp.name.clone(),
                    department: emp.department.clone(),
                    average,
                    evaluations: evaluations
                        .iter()
                        .filter(|e| e.employee_id == emp.id && average_score(e).has_data())
                        .count(),
                })
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.average
                .total_cmp(&a.average)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            total_evaluations: evaluations.len(),
            employees_evaluated: ranking.len(),
            overall_average: mean(evaluations.iter().filter_map(|e| average_score(e).as_option())),
            tiers: compliance_tier_counts(evaluations),
            compliance_levels,
            by_department,
            by_category,
            ranking,
        }
    }
}

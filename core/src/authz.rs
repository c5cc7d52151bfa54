//! Who may evaluate whom, and who may read a finished evaluation.
//!
//! Decisions are computed per (viewer, target) pair on every call.

use crate::{
    error::{EvalError, EvalResult},
    hierarchy::OrgChart,
    model::{Employee, SavedEvaluation},
};
use serde::{Deserialize, Serialize};

/// True iff `viewer` is a direct supervisor of `target` in the primary role
/// or any additional role. Self-evaluation is never allowed.
pub fn can_initiate_evaluation(viewer: &Employee, target: &Employee) -> bool {
    viewer.id != target.id && target.reports_to_in_any_role(&viewer.id)
}

/// Same decision as [`can_initiate_evaluation`], with the reason on refusal.
pub fn check_can_initiate(viewer: &Employee, target: &Employee) -> EvalResult<()> {
    if viewer.id == target.id {
        return Err(EvalError::SelfEvaluation { id: viewer.id.clone() });
    }
    if !target.reports_to_in_any_role(&viewer.id) {
        return Err(EvalError::NotSubordinate {
            viewer: viewer.id.clone(),
            target: target.id.clone(),
        });
    }
    Ok(())
}

/// Read access to completed evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPolicy {
    /// Any logged-in employee sees every evaluation.
    #[default]
    AnyAuthenticated,
    /// Only the evaluator and the evaluated employee.
    Involved,
    /// Evaluator, evaluated employee, or anyone above the latter.
    Hierarchy,
}

pub fn can_view_evaluation(
    policy: ViewPolicy,
    viewer: &Employee,
    evaluation: &SavedEvaluation,
    chart: &OrgChart<'_>,
) -> bool {
    let involved = viewer.id == evaluation.evaluator_id || viewer.id == evaluation.employee_id;
    match policy {
        ViewPolicy::AnyAuthenticated => true,
        ViewPolicy::Involved => involved,
        ViewPolicy::Hierarchy => involved || chart.is_above(&viewer.id, &evaluation.employee_id),
    }
}

//! Serializable views shared by the IPC loop, the HTTP API and the summary.

use evaluation_core::{
    auth::Session,
    error::EvalResult,
    hierarchy::{OrgNode, OrphanRef},
    model::{Employee, SavedEvaluation},
    stats::DashboardStats,
    workspace::{DataSource, Workspace},
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    pub roots: Vec<OrgNode>,
    pub orphaned_references: Vec<OrphanRef>,
    pub orphaned_departments: Vec<String>,
    pub unreachable: Vec<String>,
}

impl TreeView {
    pub fn build(ws: &Workspace) -> Self {
        let chart = ws.chart();
        Self {
            roots: chart.tree(),
            orphaned_references: chart.orphaned_references().to_vec(),
            orphaned_departments: ws.dataset().orphaned_departments(),
            unreachable: chart.unreachable().into_iter().map(|e| e.id.clone()).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub source: DataSource,
    pub viewer: Option<Employee>,
    pub employees: Vec<Employee>,
    pub departments: Vec<String>,
    /// Ids the viewer may start an evaluation for.
    pub evaluable: Vec<String>,
    /// Evaluations the viewer may read.
    pub evaluations: Vec<SavedEvaluation>,
    pub stats: DashboardStats,
}

impl UiState {
    pub fn build(ws: &Workspace, session: Option<&Session>) -> EvalResult<Self> {
        let ds = ws.dataset();
        let (viewer, evaluable, evaluations) = match session {
            Some(s) => (
                ds.employee(&s.viewer_id).cloned(),
                ws.evaluable_by(s)?.into_iter().map(|e| e.id.clone()).collect(),
                ws.visible_evaluations(s)?.into_iter().cloned().collect(),
            ),
            None => (None, Vec::new(), Vec::new()),
        };
        Ok(Self {
            source: ws.source(),
            viewer,
            employees: ds.employees.clone(),
            departments: ds.departments.clone(),
            evaluable,
            evaluations,
            stats: ws.stats(),
        })
    }
}

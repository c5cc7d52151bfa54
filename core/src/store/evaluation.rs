use super::EvalStore;
use crate::{
    error::{EvalError, EvalResult},
    model::{AnalysisResult, ComplianceLevel, Criterion, SavedEvaluation},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;

struct EvaluationRow {
    id: String,
    date: DateTime<Utc>,
    employee_id: String,
    evaluator_id: String,
    summary: String,
    strengths: String,
    weaknesses: String,
    training_plan: String,
    level: String,
}

pub(super) fn read_evaluations(conn: &Connection) -> EvalResult<Vec<SavedEvaluation>> {
    let mut criteria: HashMap<String, Vec<Criterion>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT evaluation_id, criterion_id, name, description, category, score, feedback
             FROM evaluation_criterion ORDER BY evaluation_id, position ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                Criterion {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    category: row.get(4)?,
                    score: row.get(5)?,
                    feedback: row.get(6)?,
                },
            ))
        })?;
        for row in rows {
            let (evaluation_id, criterion) = row?;
            criteria.entry(evaluation_id).or_default().push(criterion);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT id, date, employee_id, evaluator_id, summary, strengths, weaknesses,
                training_plan, iso_compliance_level
         FROM evaluation ORDER BY position ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(EvaluationRow {
                id: row.get(0)?,
                date: row.get(1)?,
                employee_id: row.get(2)?,
                evaluator_id: row.get(3)?,
                summary: row.get(4)?,
                strengths: row.get(5)?,
                weaknesses: row.get(6)?,
                training_plan: row.get(7)?,
                level: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|r| -> EvalResult<SavedEvaluation> {
            let iso_compliance_level = ComplianceLevel::from_label(&r.level).unwrap_or_else(|| {
                log::warn!("Evaluation {} has unknown level '{}'; reading as Medio", r.id, r.level);
                ComplianceLevel::Medio
            });
            Ok(SavedEvaluation {
                criteria: criteria.remove(&r.id).unwrap_or_default(),
                analysis: AnalysisResult {
                    summary: r.summary,
                    strengths: serde_json::from_str(&r.strengths)?,
                    weaknesses: serde_json::from_str(&r.weaknesses)?,
                    training_plan: serde_json::from_str(&r.training_plan)?,
                    iso_compliance_level,
                },
                id: r.id,
                date: r.date,
                employee_id: r.employee_id,
                evaluator_id: r.evaluator_id,
            })
        })
        .collect()
}

pub(super) fn insert_evaluations(conn: &Connection, evaluations: &[SavedEvaluation]) -> EvalResult<()> {
    let mut eval_stmt = conn.prepare(
        "INSERT INTO evaluation (
            id, position, date, employee_id, evaluator_id, summary, strengths,
            weaknesses, training_plan, iso_compliance_level
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    let mut crit_stmt = conn.prepare(
        "INSERT INTO evaluation_criterion (
            evaluation_id, position, criterion_id, name, description, category, score, feedback
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (i, ev) in evaluations.iter().enumerate() {
        let a = &ev.analysis;
        eval_stmt.execute(params![
            &ev.id,
            i as i64,
            ev.date,
            &ev.employee_id,
            &ev.evaluator_id,
            &a.summary,
            serde_json::to_string(&a.strengths)?,
            serde_json::to_string(&a.weaknesses)?,
            serde_json::to_string(&a.training_plan)?,
            a.iso_compliance_level.label(),
        ])?;
        for (j, c) in ev.criteria.iter().enumerate() {
            crit_stmt.execute(params![
                &ev.id,
                j as i64,
                &c.id,
                &c.name,
                &c.description,
                &c.category,
                c.score,
                &c.feedback,
            ])?;
        }
    }
    Ok(())
}

impl EvalStore {
    /// Delete one evaluation (criteria cascade). Employees and departments are untouched.
    pub fn delete_evaluation(&self, id: &str) -> EvalResult<()> {
        let n = self
            .conn
            .execute("DELETE FROM evaluation WHERE id = ?1", params![id])?;
        if n == 0 {
            return Err(EvalError::UnknownEvaluation { id: id.to_string() });
        }
        Ok(())
    }

    // ── Test / summary helpers ────────────────────────────────────────

    pub fn evaluation_count(&self) -> EvalResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM evaluation", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn criterion_count(&self) -> EvalResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM evaluation_criterion", [], |row| row.get(0))?;
        Ok(count)
    }
}

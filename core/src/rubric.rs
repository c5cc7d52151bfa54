//! The fixed evaluation rubric and score validation.

use crate::{
    error::{EvalError, EvalResult},
    model::Criterion,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
}

/// A supervisor's score for one rubric criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreInput {
    pub criterion_id: String,
    pub score: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ScoreInput {
    pub fn new(criterion_id: &str, score: f64) -> Self {
        Self {
            criterion_id: criterion_id.to_string(),
            score,
            feedback: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub criteria: Vec<CriterionTemplate>,
}

impl Rubric {
    pub fn builtin() -> Self {
        let c = |id: &str, name: &str, description: &str, category: &str| CriterionTemplate {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category: category.into(),
        };
        Self {
            criteria: vec![
                c("quality_of_work", "Calidad del trabajo",
                  "Cumple especificaciones y tolerancias sin retrabajos.", "Calidad"),
                c("procedure_adherence", "Apego a procedimientos",
                  "Sigue instrucciones de trabajo y registros del SGC.", "Calidad"),
                c("productivity", "Productividad",
                  "Alcanza las metas de producción en tiempo.", "Productividad"),
                c("resource_use", "Uso de recursos",
                  "Minimiza desperdicio de material y tiempo muerto.", "Productividad"),
                c("safety", "Seguridad e higiene",
                  "Usa EPP y respeta las normas de seguridad.", "Seguridad"),
                c("technical_skill", "Competencia técnica",
                  "Domina el equipo y procesos de su puesto.", "Competencias"),
                c("teamwork", "Trabajo en equipo",
                  "Colabora y comunica con su área y otras áreas.", "Competencias"),
                c("continuous_improvement", "Mejora continua",
                  "Propone y aplica acciones de mejora y correctivas.", "Mejora Continua"),
            ],
        }
    }

    pub fn template(&self, id: &str) -> Option<&CriterionTemplate> {
        self.criteria.iter().find(|c| c.id == id)
    }

    /// Combine the rubric with submitted scores.
    ///
    /// Every criterion must be scored exactly once within [1, 10]; scores for
    /// criteria outside the rubric are refused.
    pub fn score(&self, inputs: &[ScoreInput]) -> EvalResult<Vec<Criterion>> {
        if self.criteria.is_empty() {
            return Err(anyhow::anyhow!("Rubric has no criteria").into());
        }
        if let Some(unknown) = inputs.iter().find(|i| self.template(&i.criterion_id).is_none()) {
            return Err(EvalError::UnknownCriterion { id: unknown.criterion_id.clone() });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = inputs.iter().find(|i| !seen.insert(i.criterion_id.as_str())) {
            return Err(EvalError::DuplicateScore { criterion: dup.criterion_id.clone() });
        }

        self.criteria
            .iter()
            .map(|t| -> EvalResult<Criterion> {
                let input = inputs
                    .iter()
                    .find(|i| i.criterion_id == t.id)
                    .ok_or_else(|| EvalError::MissingScore { criterion: t.id.clone() })?;
                if !(MIN_SCORE..=MAX_SCORE).contains(&input.score) {
                    return Err(EvalError::ScoreOutOfRange {
                        criterion: t.id.clone(),
                        score: input.score,
                    });
                }
                Ok(Criterion {
                    id: t.id.clone(),
                    name: t.name.clone(),
                    description: t.description.clone(),
                    category: t.category.clone(),
                    score: input.score,
                    feedback: input
                        .feedback
                        .as_ref()
                        .map(|f| f.trim().to_string())
                        .filter(|f| !f.is_empty()),
                })
            })
            .collect()
    }
}

impl Default for Rubric {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_scores(score: f64) -> Vec<ScoreInput> {
        Rubric::builtin()
            .criteria
            .iter()
            .map(|c| ScoreInput::new(&c.id, score))
            .collect()
    }

    #[test]
    fn scores_follow_rubric_order() {
        let rubric = Rubric::builtin();
        let mut inputs = full_scores(7.0);
        inputs.reverse();
        let criteria = rubric.score(&inputs).unwrap();
        assert_eq!(criteria.len(), rubric.criteria.len());
        assert_eq!(criteria[0].id, "quality_of_work");
    }

    #[test]
    fn out_of_range_and_missing_are_refused() {
        let rubric = Rubric::builtin();

        let mut inputs = full_scores(7.0);
        inputs[2].score = 11.0;
        assert!(matches!(rubric.score(&inputs), Err(EvalError::ScoreOutOfRange { .. })));

        let mut inputs = full_scores(7.0);
        inputs.pop();
        assert!(matches!(rubric.score(&inputs), Err(EvalError::MissingScore { .. })));

        let mut inputs = full_scores(7.0);
        inputs.push(ScoreInput::new("punctuality", 5.0));
        assert!(matches!(rubric.score(&inputs), Err(EvalError::UnknownCriterion { .. })));

        let mut inputs = full_scores(7.0);
        inputs.push(ScoreInput::new("safety", 1.0));
        assert!(matches!(
            rubric.score(&inputs),
            Err(EvalError::DuplicateScore { criterion }) if criterion == "safety"
        ));
    }

    #[test]
    fn blank_feedback_is_dropped() {
        let mut inputs = full_scores(6.0);
        inputs[0].feedback = Some("   ".into());
        inputs[1].feedback = Some(" Buen registro ".into());
        let criteria = Rubric::builtin().score(&inputs).unwrap();
        assert_eq!(criteria[0].feedback, None);
        assert_eq!(criteria[1].feedback.as_deref(), Some("Buen registro"));
    }
}

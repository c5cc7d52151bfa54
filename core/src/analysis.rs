//! Narrative analysis of an evaluation.
//!
//! The text generator is an external collaborator behind [`Analyzer`]. Any
//! failure (transport, quota, unparsable reply) is absorbed here and replaced
//! by [`fallback_analysis`], so a failing generator never blocks a submission.

use crate::{
    model::{AnalysisResult, ComplianceLevel, Criterion, Employee},
    stats::{ComplianceTier, MID_TIER_MIN},
};

pub trait Analyzer {
    /// Stable name for logs.
    fn name(&self) -> &'static str;

    fn analyze(&self, employee: &Employee, criteria: &[Criterion]) -> anyhow::Result<AnalysisResult>;
}

/// Analyzer used when generation is switched off. Always yields the fallback.
pub struct DisabledAnalyzer;

impl Analyzer for DisabledAnalyzer {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn analyze(&self, _employee: &Employee, _criteria: &[Criterion]) -> anyhow::Result<AnalysisResult> {
        anyhow::bail!("analysis generation disabled")
    }
}

pub fn fallback_analysis() -> AnalysisResult {
    AnalysisResult {
        summary: "No fue posible generar el análisis automático. Revise las puntuaciones \
                  y comentarios registrados para esta evaluación."
            .into(),
        strengths: vec!["Evaluación registrada correctamente.".into()],
        weaknesses: vec!["Análisis automático no disponible.".into()],
        training_plan: vec!["Revisar resultados con el supervisor directo.".into()],
        iso_compliance_level: ComplianceLevel::Medio,
    }
}

pub fn analyze_or_fallback(
    analyzer: &dyn Analyzer,
    employee: &Employee,
    criteria: &[Criterion],
) -> AnalysisResult {
    match analyzer.analyze(employee, criteria) {
        Ok(result) => result,
        Err(e) => {
            log::warn!(
                "Analyzer '{}' failed for employee {}: {e:#}; using fallback analysis",
                analyzer.name(),
                employee.id
            );
            fallback_analysis()
        }
    }
}

pub fn build_prompt(employee: &Employee, criteria: &[Criterion]) -> String {
    let mut lines = String::new();
    for c in criteria {
        lines.push_str(&format!("- {} [{}]: {}/10", c.name, c.category, c.score));
        if let Some(f) = &c.feedback {
            lines.push_str(&format!(" (comentario: {f})"));
        }
        lines.push('\n');
    }
    let mean = if criteria.is_empty() {
        0.0
    } else {
        criteria.iter().map(|c| c.score).sum::<f64>() / criteria.len() as f64
    };
    let hint = match ComplianceTier::from_score(mean) {
        ComplianceTier::High => "alto",
        ComplianceTier::Mid => "medio",
        ComplianceTier::Low => "bajo",
    };

    format!(
        r#"Eres un consultor de recursos humanos en una empresa manufacturera certificándose en ISO 9001:2015.

Empleado: {name}
Puesto: {title}
Departamento: {dept}
Promedio: {mean:.2} (nivel orientativo: {hint}; umbral medio {mid})

Puntuaciones:
{lines}
Responde ÚNICAMENTE con un objeto JSON con esta forma:
{{"summary": "...", "strengths": ["..."], "weaknesses": ["..."], "trainingPlan": ["..."], "isoComplianceLevel": "Excelente|Alto|Medio|Bajo"}}
"#,
        name = employee.name,
        title = employee.job_title,
        dept = employee.department,
        mid = MID_TIER_MIN,
    )
}

/// Extract the JSON object from a model reply, tolerating code fences and prose.
pub fn parse_analysis(text: &str) -> anyhow::Result<AnalysisResult> {
    let start = text
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("no JSON object in analysis reply"))?;
    let end = text
        .rfind('}')
        .filter(|&e| e > start)
        .ok_or_else(|| anyhow::anyhow!("unterminated JSON object in analysis reply"))?;
    let result: AnalysisResult = serde_json::from_str(&text[start..=end])?;
    if result.summary.trim().is_empty() {
        anyhow::bail!("analysis reply has an empty summary");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Analyzer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn analyze(&self, _: &Employee, _: &[Criterion]) -> anyhow::Result<AnalysisResult> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[test]
    fn failure_yields_fixed_fallback() {
        let e = Employee::new("2", "Luis", "Producción", "Operario");
        let result = analyze_or_fallback(&Failing, &e, &[]);
        assert_eq!(result, fallback_analysis());
        assert_eq!(result.iso_compliance_level, ComplianceLevel::Medio);
    }

    #[test]
    fn parses_fenced_reply() {
        let reply = "Aquí está:\n```json\n{\"summary\":\"Buen desempeño\",\"strengths\":[\"Orden\"],\
                     \"weaknesses\":[],\"trainingPlan\":[\"5S\"],\"isoComplianceLevel\":\"Nivel Alto\"}\n```";
        let parsed = parse_analysis(reply).unwrap();
        assert_eq!(parsed.summary, "Buen desempeño");
        assert_eq!(parsed.training_plan, vec!["5S".to_string()]);
        assert_eq!(parsed.iso_compliance_level, ComplianceLevel::Alto);
    }

    #[test]
    fn rejects_reply_without_json() {
        assert!(parse_analysis("lo siento, no puedo").is_err());
        assert!(parse_analysis("} {").is_err());
    }

    #[test]
    fn prompt_mentions_every_criterion() {
        let e = Employee::new("2", "Luis", "Producción", "Operario");
        let criteria = crate::rubric::Rubric::builtin()
            .score(&crate::rubric::Rubric::builtin()
                .criteria
                .iter()
                .map(|c| crate::rubric::ScoreInput::new(&c.id, 9.0))
                .collect::<Vec<_>>())
            .unwrap();
        let prompt = build_prompt(&e, &criteria);
        for c in &criteria {
            assert!(prompt.contains(&c.name), "prompt missing {}", c.name);
        }
        assert!(prompt.contains("nivel orientativo: alto"));
    }
}

//! Entity model: employees, roles, criteria and saved evaluations.
//!
//! These are the canonical shapes. Records written by older stores use
//! differently-cased keys (`reportsto`, `additional_roles`, ...), numeric ids
//! or JSON-encoded role lists; the deserializers below fold all of them into
//! this one schema so nothing downstream sees the drift.

use crate::types::{DepartmentName, EmployeeId, EvaluationId};
use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ── Roles ───────────────────────────────────────────────────────────────────

/// A secondary capacity an employee holds concurrently with the primary one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(alias = "jobtitle", alias = "job_title", alias = "JobTitle")]
    pub job_title: String,
    #[serde(alias = "Department")]
    pub department: DepartmentName,
    #[serde(
        default,
        alias = "reportsto",
        alias = "reports_to",
        alias = "ReportsTo",
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub reports_to: Option<EmployeeId>,
}

/// Which of an employee's roles an edge or label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum EdgeKind {
    Primary,
    /// Position in `Employee::additional_roles`.
    Additional(usize),
}

impl EdgeKind {
    pub fn is_additional(self) -> bool {
        matches!(self, EdgeKind::Additional(_))
    }
}

/// Borrowed view over either the primary role or one additional role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleView<'a> {
    pub kind: EdgeKind,
    pub job_title: &'a str,
    pub department: &'a str,
    pub reports_to: Option<&'a str>,
}

// ── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(deserialize_with = "required_id")]
    pub id: EmployeeId,
    pub name: String,
    #[serde(alias = "Department")]
    pub department: DepartmentName,
    #[serde(alias = "jobtitle", alias = "job_title", alias = "JobTitle")]
    pub job_title: String,
    #[serde(
        default,
        alias = "reportsto",
        alias = "reports_to",
        alias = "ReportsTo",
        deserialize_with = "optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub reports_to: Option<EmployeeId>,
    /// Cached mean of this employee's evaluations; recomputed, never edited.
    #[serde(
        default,
        alias = "averagescore",
        alias = "average_score",
        alias = "AverageScore",
        skip_serializing_if = "Option::is_none"
    )]
    pub average_score: Option<f64>,
    #[serde(
        default,
        alias = "additionalroles",
        alias = "additional_roles",
        alias = "AdditionalRoles",
        deserialize_with = "lenient_roles"
    )]
    pub additional_roles: Vec<Role>,
}

impl Employee {
    pub fn new(id: &str, name: &str, department: &str, job_title: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            department: department.to_string(),
            job_title: job_title.to_string(),
            reports_to: None,
            average_score: None,
            additional_roles: Vec::new(),
        }
    }

    pub fn reporting_to(mut self, supervisor: &str) -> Self {
        self.reports_to = Some(supervisor.to_string());
        self
    }

    pub fn with_role(mut self, job_title: &str, department: &str, reports_to: Option<&str>) -> Self {
        self.additional_roles.push(Role {
            job_title: job_title.to_string(),
            department: department.to_string(),
            reports_to: reports_to.map(str::to_string),
        });
        self
    }

    pub fn primary_role(&self) -> RoleView<'_> {
        RoleView {
            kind: EdgeKind::Primary,
            job_title: &self.job_title,
            department: &self.department,
            reports_to: self.reports_to.as_deref(),
        }
    }

    /// Primary role first, then additional roles in declaration order.
    pub fn roles(&self) -> impl Iterator<Item = RoleView<'_>> {
        std::iter::once(self.primary_role()).chain(self.additional_roles.iter().enumerate().map(
            |(i, r)| RoleView {
                kind: EdgeKind::Additional(i),
                job_title: &r.job_title,
                department: &r.department,
                reports_to: r.reports_to.as_deref(),
            },
        ))
    }

    pub fn role(&self, kind: EdgeKind) -> Option<RoleView<'_>> {
        self.roles().find(|r| r.kind == kind)
    }

    /// True if the primary role or any additional role reports to `supervisor_id`.
    pub fn reports_to_in_any_role(&self, supervisor_id: &str) -> bool {
        self.roles().any(|r| r.reports_to == Some(supervisor_id))
    }

    /// True if the primary role or any additional role sits in `department`.
    pub fn works_in(&self, department: &str) -> bool {
        self.roles().any(|r| r.department == department)
    }
}

// ── Criteria and analysis ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// ISO 9001 compliance level reported by an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComplianceLevel {
    Excelente,
    Alto,
    Medio,
    Bajo,
}

impl ComplianceLevel {
    pub const ALL: [ComplianceLevel; 4] = [
        ComplianceLevel::Excelente,
        ComplianceLevel::Alto,
        ComplianceLevel::Medio,
        ComplianceLevel::Bajo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ComplianceLevel::Excelente => "Excelente",
            ComplianceLevel::Alto      => "Alto",
            ComplianceLevel::Medio     => "Medio",
            ComplianceLevel::Bajo      => "Bajo",
        }
    }

    /// Map legacy free-text labels ("Nivel Alto", "high", ...) to a level.
    pub fn from_label(text: &str) -> Option<Self> {
        let t = text.trim().to_lowercase();
        if t.contains("excel") {
            Some(ComplianceLevel::Excelente)
        } else if t.contains("alto") || t.contains("high") {
            Some(ComplianceLevel::Alto)
        } else if t.contains("medio") || t.contains("mid") || t.contains("medium") {
            Some(ComplianceLevel::Medio)
        } else if t.contains("bajo") || t.contains("low") {
            Some(ComplianceLevel::Bajo)
        } else {
            None
        }
    }

    /// Counts toward the "compliant" figure on the dashboard.
    pub fn is_compliant(self) -> bool {
        matches!(self, ComplianceLevel::Excelente | ComplianceLevel::Alto)
    }
}

impl Serialize for ComplianceLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ComplianceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(ComplianceLevel::from_label(&text).unwrap_or_else(|| {
            log::warn!("Unrecognised compliance level '{text}', defaulting to Medio");
            ComplianceLevel::Medio
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(
        default,
        alias = "trainingplan",
        alias = "training_plan",
        alias = "TrainingPlan"
    )]
    pub training_plan: Vec<String>,
    #[serde(
        alias = "isocompliancelevel",
        alias = "iso_compliance_level",
        alias = "IsoComplianceLevel"
    )]
    pub iso_compliance_level: ComplianceLevel,
}

// ── Saved evaluation ────────────────────────────────────────────────────────

/// An evaluation as stored in history. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEvaluation {
    #[serde(deserialize_with = "required_id")]
    pub id: EvaluationId,
    pub date: DateTime<Utc>,
    #[serde(
        alias = "employeeid",
        alias = "employee_id",
        alias = "EmployeeId",
        deserialize_with = "required_id"
    )]
    pub employee_id: EmployeeId,
    #[serde(
        alias = "evaluatorid",
        alias = "evaluator_id",
        alias = "EvaluatorId",
        deserialize_with = "required_id"
    )]
    pub evaluator_id: EmployeeId,
    pub criteria: Vec<Criterion>,
    pub analysis: AnalysisResult,
}

impl SavedEvaluation {
    pub fn new(
        employee_id: &str,
        evaluator_id: &str,
        criteria: Vec<Criterion>,
        analysis: AnalysisResult,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            employee_id: employee_id.to_string(),
            evaluator_id: evaluator_id.to_string(),
            criteria,
            analysis,
        }
    }
}

// ── Lenient field decoders ──────────────────────────────────────────────────

fn id_from_value<E: de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(E::custom(format!("expected an id, got {other}"))),
    }
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)
}

fn required_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    id_from_value(Value::deserialize(deserializer)?)?
        .ok_or_else(|| de::Error::custom("id must not be empty"))
}

fn lenient_roles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Role>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) => serde_json::from_str(&s).map_err(de::Error::custom),
        v @ Value::Array(_) => serde_json::from_value(v).map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected a role list, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_store_keys_normalise() {
        let raw = r#"{
            "id": 7, "name": "Rosa", "department": "Producción",
            "jobtitle": "Operaria", "reportsto": "",
            "additionalroles": "[{\"jobtitle\":\"Auditora\",\"department\":\"Calidad\",\"reportsto\":3}]"
        }"#;
        let e: Employee = serde_json::from_str(raw).unwrap();
        assert_eq!(e.id, "7");
        assert_eq!(e.reports_to, None);
        assert_eq!(e.additional_roles.len(), 1);
        assert_eq!(e.additional_roles[0].reports_to.as_deref(), Some("3"));
        assert_eq!(e.additional_roles[0].job_title, "Auditora");
    }

    #[test]
    fn canonical_output_is_camel_case() {
        let e = Employee::new("1", "Ana", "Calidad", "Jefa").with_role("Asistente", "Producción", Some("2"));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["jobTitle"], "Jefa");
        assert_eq!(json["additionalRoles"][0]["reportsTo"], "2");
        assert!(json.get("reportsTo").is_none());
    }

    #[test]
    fn compliance_labels_map_from_free_text() {
        assert_eq!(ComplianceLevel::from_label("Nivel ALTO de cumplimiento"), Some(ComplianceLevel::Alto));
        assert_eq!(ComplianceLevel::from_label("Excelente"), Some(ComplianceLevel::Excelente));
        assert_eq!(ComplianceLevel::from_label("bajo"), Some(ComplianceLevel::Bajo));
        assert_eq!(ComplianceLevel::from_label("???"), None);

        let level: ComplianceLevel = serde_json::from_str("\"desconocido\"").unwrap();
        assert_eq!(level, ComplianceLevel::Medio);
    }

    #[test]
    fn roles_iterate_primary_first() {
        let e = Employee::new("1", "Ana", "Calidad", "Jefa")
            .reporting_to("9")
            .with_role("Asistente", "Producción", Some("2"));
        let kinds: Vec<EdgeKind> = e.roles().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![EdgeKind::Primary, EdgeKind::Additional(0)]);
        assert!(e.reports_to_in_any_role("2"));
        assert!(e.works_in("Producción"));
    }
}

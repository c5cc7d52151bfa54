//! Persistence: whole-dataset replacement, delete-one, lossless round-trip.

use chrono::{TimeZone, Utc};
use evaluation_core::{
    dataset::Dataset,
    error::EvalError,
    model::{AnalysisResult, ComplianceLevel, Criterion, Employee, SavedEvaluation},
    seed::builtin_dataset,
    store::EvalStore,
};

fn migrated() -> EvalStore {
    let store = EvalStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn sample_evaluation(subject: &str, evaluator: &str) -> SavedEvaluation {
    SavedEvaluation::new(
        subject,
        evaluator,
        vec![
            Criterion {
                id: "quality_of_work".into(),
                name: "Calidad del trabajo".into(),
                description: "Cumple especificaciones.".into(),
                category: "Calidad".into(),
                score: 8.5,
                feedback: Some("Sin retrabajos este trimestre".into()),
            },
            Criterion {
                id: "safety".into(),
                name: "Seguridad e higiene".into(),
                description: "Usa EPP.".into(),
                category: "Seguridad".into(),
                score: 6.0,
                feedback: None,
            },
        ],
        AnalysisResult {
            summary: "Desempeño sólido".into(),
            strengths: vec!["Precisión".into(), "Orden".into()],
            weaknesses: vec!["Uso de EPP".into()],
            training_plan: vec!["Curso de seguridad".into()],
            iso_compliance_level: ComplianceLevel::Alto,
        },
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
    )
}

/// Two additional roles with distinct supervisors survive a save/load cycle.
#[test]
fn round_trip_is_lossless() {
    let mut store = migrated();
    let mut ds = builtin_dataset();
    ds.employees.push(
        Employee::new("10", "Marta Gil", "Calidad", "Analista")
            .reporting_to("3")
            .with_role("Brigadista", "Mantenimiento", Some("4"))
            .with_role("Capacitadora", "Producción", Some("2")),
    );
    ds.employees[5].average_score = Some(7.25);
    ds.evaluations.push(sample_evaluation("6", "5"));
    ds.evaluations.push(sample_evaluation("7", "3"));

    store.replace_all(&ds).unwrap();
    let loaded = store.load_dataset().unwrap();

    assert_eq!(loaded, ds, "dataset changed across a save/load cycle");
    let marta = loaded.employee("10").unwrap();
    assert_eq!(marta.additional_roles.len(), 2);
    assert_eq!(marta.additional_roles[0].reports_to.as_deref(), Some("4"));
    assert_eq!(marta.additional_roles[1].reports_to.as_deref(), Some("2"));
}

#[test]
fn replace_all_discards_previous_contents() {
    let mut store = migrated();
    store.replace_all(&builtin_dataset()).unwrap();

    let small = Dataset {
        employees: vec![Employee::new("1", "Ana", "Dirección", "Gerente")],
        departments: vec!["Dirección".into()],
        evaluations: Vec::new(),
    };
    store.replace_all(&small).unwrap();

    assert_eq!(store.employee_count().unwrap(), 1);
    assert_eq!(store.role_count().unwrap(), 0);
    assert_eq!(store.load_dataset().unwrap(), small);
}

/// A failing insert rolls back the delete: the old dataset stays intact.
#[test]
fn failed_replace_leaves_previous_dataset() {
    let mut store = migrated();
    let original = builtin_dataset();
    store.replace_all(&original).unwrap();

    let mut broken = builtin_dataset();
    broken.employees.push(Employee::new("1", "Duplicada", "Dirección", "Gerente"));
    assert!(matches!(store.replace_all(&broken), Err(EvalError::Database(_))));

    assert_eq!(store.load_dataset().unwrap(), original);
}

#[test]
fn delete_one_evaluation_leaves_the_rest() {
    let mut store = migrated();
    let mut ds = builtin_dataset();
    let keep = sample_evaluation("6", "5");
    let drop = sample_evaluation("8", "3");
    ds.evaluations = vec![keep.clone(), drop.clone()];
    store.replace_all(&ds).unwrap();

    store.delete_evaluation(&drop.id).unwrap();

    assert_eq!(store.evaluation_count().unwrap(), 1);
    assert_eq!(store.criterion_count().unwrap(), 2, "criteria must cascade");
    assert_eq!(store.employee_count().unwrap(), ds.employees.len() as i64);
    let loaded = store.load_dataset().unwrap();
    assert_eq!(loaded.evaluations, vec![keep]);

    assert!(matches!(
        store.delete_evaluation(&drop.id),
        Err(EvalError::UnknownEvaluation { .. })
    ));
}

#[test]
fn file_backed_store_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eval.db");
    let path = path.to_str().unwrap();

    {
        let mut store = EvalStore::open(path).unwrap();
        store.migrate().unwrap();
        store.replace_all(&builtin_dataset()).unwrap();
    }

    let store = EvalStore::open(path).unwrap();
    store.migrate().unwrap();
    assert_eq!(store.load_dataset().unwrap(), builtin_dataset());
}

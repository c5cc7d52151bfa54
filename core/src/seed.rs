//! Seed organization used when the store is empty or unreachable.

use crate::{dataset::Dataset, model::Employee};

/// Load `{data_dir}/seed/organization.json`, or the built-in organization if
/// the file is absent or unreadable.
pub fn load_seed(data_dir: &str) -> Dataset {
    let path = format!("{data_dir}/seed/organization.json");
    match std::fs::read_to_string(&path) {
        Ok(text) => match serde_json::from_str::<Dataset>(&text) {
            Ok(ds) => {
                log::info!("Loaded seed organization from {path}");
                ds
            }
            Err(e) => {
                log::warn!("Invalid seed file {path}: {e}; using built-in organization");
                builtin_dataset()
            }
        },
        Err(_) => builtin_dataset(),
    }
}

pub fn builtin_dataset() -> Dataset {
    let employees = vec![
        Employee::new("1", "Carmen Ruiz", "Dirección", "Directora General"),
        Employee::new("2", "Jorge Salinas", "Producción", "Jefe de Producción").reporting_to("1"),
        Employee::new("3", "Lucía Méndez", "Calidad", "Jefa de Calidad")
            .reporting_to("1")
            .with_role("Asistente de Producción", "Producción", Some("2")),
        Employee::new("4", "Raúl Torres", "Mantenimiento", "Jefe de Mantenimiento").reporting_to("1"),
        Employee::new("5", "Diana Flores", "Producción", "Supervisora de Línea").reporting_to("2"),
        Employee::new("6", "Tomás Ibarra", "Producción", "Operador").reporting_to("5"),
        Employee::new("7", "Sofía Navarro", "Producción", "Operadora")
            .reporting_to("5")
            .with_role("Auditora Interna", "Calidad", Some("3")),
        Employee::new("8", "Héctor Vega", "Calidad", "Inspector de Calidad").reporting_to("3"),
        Employee::new("9", "Andrés Campos", "Mantenimiento", "Técnico Electromecánico").reporting_to("4"),
    ];
    Dataset {
        employees,
        departments: ["Dirección", "Producción", "Calidad", "Mantenimiento"]
            .into_iter()
            .map(String::from)
            .collect(),
        evaluations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::OrgChart;

    #[test]
    fn builtin_seed_is_consistent() {
        let ds = builtin_dataset();
        assert!(ds.orphaned_departments().is_empty());
        let chart = OrgChart::new(&ds.employees);
        assert!(chart.orphaned_references().is_empty());
        assert_eq!(chart.roots().len(), 1);
        assert!(chart.unreachable().is_empty());
    }

    #[test]
    fn missing_seed_file_falls_back_to_builtin() {
        assert_eq!(load_seed("/nonexistent/dir"), builtin_dataset());
    }
}

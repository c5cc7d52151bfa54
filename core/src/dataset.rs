//! The snapshot exchanged with the store: employees, departments, evaluations.
//!
//! Administrative edits go through the methods here so the referential rules
//! hold: a department is not removed while referenced, and the primary
//! reporting spine stays a forest.

use crate::{
    error::{EvalError, EvalResult},
    model::{Employee, SavedEvaluation},
    stats::employee_average,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub evaluations: Vec<SavedEvaluation>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty() && self.departments.is_empty() && self.evaluations.is_empty()
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    /// Resolve an employee by id, falling back to an exact (case-insensitive) name.
    pub fn find_employee(&self, identity: &str) -> Option<&Employee> {
        let identity = identity.trim();
        self.employee(identity).or_else(|| {
            self.employees
                .iter()
                .find(|e| e.name.trim().eq_ignore_ascii_case(identity))
        })
    }

    // ── Departments ──────────────────────────────────────────────────────

    pub fn has_department(&self, name: &str) -> bool {
        self.departments.iter().any(|d| d == name)
    }

    /// Number of employees referencing `name` in their primary or any additional role.
    pub fn department_usage(&self, name: &str) -> usize {
        self.employees.iter().filter(|e| e.works_in(name)).count()
    }

    pub fn add_department(&mut self, name: &str) -> EvalResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(anyhow::anyhow!("Department name must not be empty").into());
        }
        if self.has_department(name) {
            return Err(EvalError::DuplicateDepartment { name: name.to_string() });
        }
        self.departments.push(name.to_string());
        Ok(())
    }

    /// Rename a department and every role that points at it.
    pub fn rename_department(&mut self, old: &str, new: &str) -> EvalResult<()> {
        let new = new.trim();
        if new.is_empty() {
            return Err(anyhow::anyhow!("Department name must not be empty").into());
        }
        if !self.has_department(old) {
            return Err(EvalError::UnknownDepartment { name: old.to_string() });
        }
        if old == new {
            return Ok(());
        }
        if self.has_department(new) {
            return Err(EvalError::DuplicateDepartment { name: new.to_string() });
        }
        for d in &mut self.departments {
            if d == old {
                *d = new.to_string();
            }
        }
        for e in &mut self.employees {
            if e.department == old {
                e.department = new.to_string();
            }
            for r in &mut e.additional_roles {
                if r.department == old {
                    r.department = new.to_string();
                }
            }
        }
        Ok(())
    }

    /// Refused while any employee (primary or additional role) is assigned to it.
    pub fn remove_department(&mut self, name: &str) -> EvalResult<()> {
        if !self.has_department(name) {
            return Err(EvalError::UnknownDepartment { name: name.to_string() });
        }
        let employees = self.department_usage(name);
        if employees > 0 {
            return Err(EvalError::DepartmentInUse {
                department: name.to_string(),
                employees,
            });
        }
        self.departments.retain(|d| d != name);
        Ok(())
    }

    /// Departments referenced by some role but missing from the department list.
    pub fn orphaned_departments(&self) -> Vec<String> {
        let known: HashSet<&str> = self.departments.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for e in &self.employees {
            for r in e.roles() {
                if !known.contains(r.department) && seen.insert(r.department) {
                    missing.push(r.department.to_string());
                }
            }
        }
        missing
    }

    // ── Employees ────────────────────────────────────────────────────────

    /// Insert a new employee or replace the one with the same id.
    ///
    /// Every role must name a known department and an existing supervisor
    /// other than the employee itself; the primary supervisor must not sit
    /// below the employee on the primary spine.
    pub fn upsert_employee(&mut self, mut employee: Employee) -> EvalResult<()> {
        for role in employee.roles() {
            if !self.has_department(role.department) {
                return Err(EvalError::UnknownDepartment { name: role.department.to_string() });
            }
            if let Some(sup) = role.reports_to {
                if sup == employee.id {
                    return Err(EvalError::HierarchyCycle {
                        employee: employee.id.clone(),
                        supervisor: sup.to_string(),
                    });
                }
                if self.employee(sup).is_none() {
                    return Err(EvalError::UnknownEmployee { id: sup.to_string() });
                }
            }
        }
        if let Some(sup) = employee.reports_to.as_deref() {
            if self.primary_chain_reaches(sup, &employee.id) {
                return Err(EvalError::HierarchyCycle {
                    employee: employee.id.clone(),
                    supervisor: sup.to_string(),
                });
            }
        }

        // Cached score belongs to the history, not to the edit form.
        employee.average_score = employee_average(&employee.id, &self.evaluations);
        match self.employees.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => *existing = employee,
            None => self.employees.push(employee),
        }
        Ok(())
    }

    /// Remove an employee. Evaluations stay in history; roles that pointed at
    /// the removed employee become orphaned references.
    pub fn remove_employee(&mut self, id: &str) -> EvalResult<Employee> {
        let pos = self
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EvalError::UnknownEmployee { id: id.to_string() })?;
        let removed = self.employees.remove(pos);
        let dangling = self.employees.iter().filter(|e| e.reports_to_in_any_role(id)).count();
        if dangling > 0 {
            log::warn!("Removed employee {id}; {dangling} employee(s) now reference a missing supervisor");
        }
        Ok(removed)
    }

    // ── Evaluations ──────────────────────────────────────────────────────

    pub fn remove_evaluation(&mut self, id: &str) -> EvalResult<SavedEvaluation> {
        let pos = self
            .evaluations
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EvalError::UnknownEvaluation { id: id.to_string() })?;
        Ok(self.evaluations.remove(pos))
    }

    /// Follow primary `reports_to` links upward from `start`; true if `target` is met.
    fn primary_chain_reaches(&self, start: &str, target: &str) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if id == target {
                return true;
            }
            if !visited.insert(id) {
                return false;
            }
            current = self.employee(id).and_then(|e| e.reports_to.as_deref());
        }
        false
    }
}

use super::EvalStore;
use crate::{
    error::EvalResult,
    model::{Employee, Role},
};
use rusqlite::{params, Connection};
use std::collections::HashMap;

// ── Departments ─────────────────────────────────────────────────────

pub(super) fn read_departments(conn: &Connection) -> EvalResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM department ORDER BY position ASC")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

pub(super) fn insert_departments(conn: &Connection, departments: &[String]) -> EvalResult<()> {
    let mut stmt = conn.prepare("INSERT INTO department (name, position) VALUES (?1, ?2)")?;
    for (i, name) in departments.iter().enumerate() {
        stmt.execute(params![name, i as i64])?;
    }
    Ok(())
}

// ── Employees ───────────────────────────────────────────────────────

pub(super) fn read_employees(conn: &Connection) -> EvalResult<Vec<Employee>> {
    let mut roles: HashMap<String, Vec<Role>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT employee_id, job_title, department, reports_to
             FROM employee_role ORDER BY employee_id, position ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                Role {
                    job_title: row.get(1)?,
                    department: row.get(2)?,
                    reports_to: row.get(3)?,
                },
            ))
        })?;
        for row in rows {
            let (employee_id, role) = row?;
            roles.entry(employee_id).or_default().push(role);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, department, job_title, reports_to, average_score
         FROM employee ORDER BY position ASC",
    )?;
    let employees = stmt
        .query_map([], |row| {
            Ok(Employee {
                id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                job_title: row.get(3)?,
                reports_to: row.get(4)?,
                average_score: row.get(5)?,
                additional_roles: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(employees
        .into_iter()
        .map(|mut e| {
            e.additional_roles = roles.remove(&e.id).unwrap_or_default();
            e
        })
        .collect())
}

pub(super) fn insert_employees(conn: &Connection, employees: &[Employee]) -> EvalResult<()> {
    let mut emp_stmt = conn.prepare(
        "INSERT INTO employee (id, position, name, department, job_title, reports_to, average_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut role_stmt = conn.prepare(
        "INSERT INTO employee_role (employee_id, position, job_title, department, reports_to)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (i, e) in employees.iter().enumerate() {
        emp_stmt.execute(params![
            &e.id,
            i as i64,
            &e.name,
            &e.department,
            &e.job_title,
            &e.reports_to,
            e.average_score,
        ])?;
        for (j, r) in e.additional_roles.iter().enumerate() {
            role_stmt.execute(params![&e.id, j as i64, &r.job_title, &r.department, &r.reports_to])?;
        }
    }
    Ok(())
}

impl EvalStore {
    // ── Test / summary helpers ────────────────────────────────────────

    pub fn employee_count(&self) -> EvalResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employee", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn role_count(&self) -> EvalResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employee_role", [], |row| row.get(0))?;
        Ok(count)
    }
}

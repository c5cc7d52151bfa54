//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The write path replaces the whole dataset inside one transaction, so a
//! reader never observes a half-cleared store.

use crate::{dataset::Dataset, error::EvalResult};
mod employee;
mod evaluation;
use rusqlite::Connection;

pub struct EvalStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl EvalStore {
    pub fn open(path: &str) -> EvalResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EvalResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EvalResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    /// Read the full snapshot in one read transaction.
    pub fn load_dataset(&self) -> EvalResult<Dataset> {
        let tx = self.conn.unchecked_transaction()?;
        let departments = employee::read_departments(&tx)?;
        let employees = employee::read_employees(&tx)?;
        let evaluations = evaluation::read_evaluations(&tx)?;
        tx.commit()?;
        log::debug!(
            "Loaded {} employees, {} departments, {} evaluations",
            employees.len(),
            departments.len(),
            evaluations.len()
        );
        Ok(Dataset {
            employees,
            departments,
            evaluations,
        })
    }

    /// Replace the entire stored dataset: delete everything, then insert.
    /// All-or-nothing; on error the previous contents remain.
    pub fn replace_all(&mut self, dataset: &Dataset) -> EvalResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM evaluation_criterion;
             DELETE FROM evaluation;
             DELETE FROM employee_role;
             DELETE FROM employee;
             DELETE FROM department;",
        )?;
        employee::insert_departments(&tx, &dataset.departments)?;
        employee::insert_employees(&tx, &dataset.employees)?;
        evaluation::insert_evaluations(&tx, &dataset.evaluations)?;
        tx.commit()?;
        log::info!(
            "Persisted {} employees, {} departments, {} evaluations",
            dataset.employees.len(),
            dataset.departments.len(),
            dataset.evaluations.len()
        );
        Ok(())
    }
}

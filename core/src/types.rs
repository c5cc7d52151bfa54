//! Shared primitive types used across the crate.

/// Stable, unique identifier of an employee.
pub type EmployeeId = String;

/// Unique identifier of a saved evaluation.
pub type EvaluationId = String;

/// Department names double as their identifiers.
pub type DepartmentName = String;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Employee '{id}' not found")]
    UnknownEmployee { id: String },

    #[error("Evaluation '{id}' not found")]
    UnknownEvaluation { id: String },

    #[error("Employee '{id}' cannot evaluate themselves")]
    SelfEvaluation { id: String },

    #[error("Employee '{target}' does not report to '{viewer}' in any role")]
    NotSubordinate { viewer: String, target: String },

    #[error("Score {score} for criterion '{criterion}' is outside [1, 10]")]
    ScoreOutOfRange { criterion: String, score: f64 },

    #[error("Criterion '{criterion}' has no score")]
    MissingScore { criterion: String },

    #[error("Criterion '{criterion}' was scored more than once")]
    DuplicateScore { criterion: String },

    #[error("Criterion '{id}' is not part of the rubric")]
    UnknownCriterion { id: String },

    #[error("Department '{department}' is still referenced by {employees} employee(s)")]
    DepartmentInUse { department: String, employees: usize },

    #[error("Department '{name}' already exists")]
    DuplicateDepartment { name: String },

    #[error("Department '{name}' not found")]
    UnknownDepartment { name: String },

    #[error("Assigning '{supervisor}' as supervisor of '{employee}' would create a reporting cycle")]
    HierarchyCycle { employee: String, supervisor: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EvalResult<T> = Result<T, EvalError>;

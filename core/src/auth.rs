//! Shared-password login: pick your own identity, type the system password.

use crate::{
    dataset::Dataset,
    error::{EvalError, EvalResult},
    types::EmployeeId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub viewer_id: EmployeeId,
    pub started_at: DateTime<Utc>,
}

/// `identity` is an employee id or exact name. Unknown identity and wrong
/// password fail the same way.
pub fn login(dataset: &Dataset, identity: &str, password: &str, system_password: &str) -> EvalResult<Session> {
    if password != system_password {
        log::info!("Rejected login for '{identity}': bad password");
        return Err(EvalError::InvalidCredentials);
    }
    let employee = dataset.find_employee(identity).ok_or_else(|| {
        log::info!("Rejected login for unknown identity '{identity}'");
        EvalError::InvalidCredentials
    })?;
    log::info!("Employee {} logged in", employee.id);
    Ok(Session {
        viewer_id: employee.id.clone(),
        started_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::builtin_dataset;

    #[test]
    fn login_by_name_or_id() {
        let ds = builtin_dataset();
        assert_eq!(login(&ds, "2", "pw", "pw").unwrap().viewer_id, "2");
        assert_eq!(login(&ds, "Lucía Méndez", "pw", "pw").unwrap().viewer_id, "3");
    }

    #[test]
    fn bad_password_and_unknown_name_look_alike() {
        let ds = builtin_dataset();
        assert!(matches!(login(&ds, "2", "nope", "pw"), Err(EvalError::InvalidCredentials)));
        assert!(matches!(login(&ds, "Nadie", "pw", "pw"), Err(EvalError::InvalidCredentials)));
    }
}

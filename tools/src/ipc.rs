//! JSON-lines command loop on stdin/stdout for an embedding UI.
//!
//! One command per line in, one JSON document per line out. Domain errors are
//! answered with `{"error": ...}`; only I/O failures end the loop.

use crate::views::{TreeView, UiState};
use anyhow::Result;
use evaluation_core::{
    analysis::Analyzer,
    auth::Session,
    error::{EvalError, EvalResult},
    model::Employee,
    rubric::ScoreInput,
    workspace::Workspace,
};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Login {
        identity: String,
        password: String,
    },
    Logout,
    Tree,
    Stats,
    Rubric,
    Evaluate {
        employee_id: String,
        scores: Vec<ScoreInput>,
    },
    DeleteEvaluation {
        id: String,
    },
    AddDepartment {
        name: String,
    },
    RenameDepartment {
        old: String,
        new: String,
    },
    RemoveDepartment {
        name: String,
    },
    UpsertEmployee {
        employee: Employee,
    },
    RemoveEmployee {
        id: String,
    },
    Reload,
    Quit,
}

pub fn run_ipc_loop(ws: &mut Workspace, analyzer: &dyn Analyzer) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut session: Option<Session> = None;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let reply = match handle_command(ws, analyzer, &mut session, cmd) {
            Ok(v) => v,
            Err(e) => json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn require(session: &Option<Session>) -> EvalResult<&Session> {
    session
        .as_ref()
        .ok_or(EvalError::InvalidCredentials)
}

fn handle_command(
    ws: &mut Workspace,
    analyzer: &dyn Analyzer,
    session: &mut Option<Session>,
    cmd: IpcCommand,
) -> EvalResult<Value> {
    let value = match cmd {
        IpcCommand::GetState => serde_json::to_value(UiState::build(ws, session.as_ref())?)?,
        IpcCommand::Login { identity, password } => {
            let s = ws.login(&identity, &password)?;
            let state = serde_json::to_value(UiState::build(ws, Some(&s))?)?;
            *session = Some(s);
            state
        }
        IpcCommand::Logout => {
            *session = None;
            json!({ "ok": true })
        }
        IpcCommand::Tree => serde_json::to_value(TreeView::build(ws))?,
        IpcCommand::Stats => serde_json::to_value(ws.stats())?,
        IpcCommand::Rubric => serde_json::to_value(&ws.config.rubric)?,
        IpcCommand::Evaluate { employee_id, scores } => {
            let s = require(session)?;
            let (evaluation, outcome) =
                ws.submit_evaluation(s, &employee_id, &scores, analyzer, chrono::Utc::now())?;
            json!({ "evaluation": evaluation, "outcome": outcome })
        }
        IpcCommand::DeleteEvaluation { id } => {
            require(session)?;
            serde_json::to_value(ws.delete_evaluation(&id)?)?
        }
        IpcCommand::AddDepartment { name } => {
            require(session)?;
            serde_json::to_value(ws.add_department(&name)?)?
        }
        IpcCommand::RenameDepartment { old, new } => {
            require(session)?;
            serde_json::to_value(ws.rename_department(&old, &new)?)?
        }
        IpcCommand::RemoveDepartment { name } => {
            require(session)?;
            serde_json::to_value(ws.remove_department(&name)?)?
        }
        IpcCommand::UpsertEmployee { employee } => {
            require(session)?;
            serde_json::to_value(ws.upsert_employee(employee)?)?
        }
        IpcCommand::RemoveEmployee { id } => {
            require(session)?;
            serde_json::to_value(ws.remove_employee(&id)?)?
        }
        IpcCommand::Reload => {
            ws.reload()?;
            serde_json::to_value(UiState::build(ws, session.as_ref())?)?
        }
        IpcCommand::Quit => Value::Null,
    };
    Ok(value)
}

//! JSON command layer over the editor.
//!
//! A [`Command`] names an operation and carries its payload. The executor
//! validates it into a [`Request`], runs it and folds every outcome,
//! success or failure, into a [`CommandResponse`].

mod handlers;
mod request;

pub use request::{
    AddSheetPayload, CellWrite, CreatePayload, DeleteSheetPayload, ExportFormat, ExportPayload,
    ExportSettings, FormatPayload, GetDataPayload, InsertChartPayload, RenameSheetPayload,
    Request, SetCellsPayload, SheetSeed, COMMAND_TYPES,
};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::SpreadsheetEditor;
use crate::engine::GridEngine;
use crate::error::XlgridError;

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidCommand,
    InvalidPayload,
    InvalidRange,
    SheetNotFound,
    ExportFailed,
    ImportFailed,
    /// Reserved: commands run to completion synchronously.
    Timeout,
    NotInitialized,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCommand => "INVALID_COMMAND",
            Self::InvalidPayload => "INVALID_PAYLOAD",
            Self::InvalidRange => "INVALID_RANGE",
            Self::SheetNotFound => "SHEET_NOT_FOUND",
            Self::ExportFailed => "EXPORT_FAILED",
            Self::ImportFailed => "IMPORT_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&XlgridError> for CommandError {
    fn from(err: &XlgridError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Incoming command envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Command {
    pub fn new(id: &str, kind: &str, payload: Value) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            payload,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub command_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
    pub duration_ms: u64,
}

impl CommandResponse {
    fn finish(command_id: &str, outcome: Result<Value, CommandError>, started: Instant) -> Self {
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(result) => Self {
                command_id: command_id.to_string(),
                success: true,
                result: Some(result),
                error: None,
                duration_ms,
            },
            Err(error) => Self {
                command_id: command_id.to_string(),
                success: false,
                result: None,
                error: Some(error),
                duration_ms,
            },
        }
    }
}

/// Runs commands against an editor.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    /// Execute one command. Never fails: errors become unsuccessful responses.
    pub fn execute<E: GridEngine>(
        editor: Option<&mut SpreadsheetEditor<E>>,
        command: &Command,
    ) -> CommandResponse {
        let started = Instant::now();
        let outcome = Self::run(editor, command).map_err(|err| CommandError::from(&err));
        match outcome {
            Ok(_) => log::debug!("command {} ({}) succeeded", command.id, command.kind),
            Err(ref err) => log::info!(
                "command {} ({}) failed with {}: {}",
                command.id,
                command.kind,
                err.code.as_str(),
                err.message
            ),
        }
        CommandResponse::finish(&command.id, outcome, started)
    }

    fn run<E: GridEngine>(
        editor: Option<&mut SpreadsheetEditor<E>>,
        command: &Command,
    ) -> crate::error::Result<Value> {
        if !Request::is_known(&command.kind) {
            return Err(XlgridError::UnknownCommand(command.kind.clone()));
        }
        let editor = editor.ok_or(XlgridError::EngineUnavailable)?;
        let request = Request::parse(&command.kind, &command.payload)?;
        handlers::dispatch(editor, request)
    }

    /// Execute a JSON-encoded command and return the JSON response. An
    /// envelope that does not parse answers with `INVALID_COMMAND`.
    pub fn execute_json<E: GridEngine>(
        editor: Option<&mut SpreadsheetEditor<E>>,
        json: &str,
    ) -> String {
        let started = Instant::now();
        let response = match serde_json::from_str::<Command>(json) {
            Ok(command) => Self::execute(editor, &command),
            Err(err) => {
                log::info!("rejecting malformed command envelope: {err}");
                let error = CommandError {
                    code: ErrorCode::InvalidCommand,
                    message: format!("Malformed command: {err}"),
                };
                CommandResponse::finish("", Err(error), started)
            }
        };
        serde_json::to_string(&response).unwrap_or_else(|err| {
            format!(
                r#"{{"commandId":"","success":false,"error":{{"code":"INTERNAL_ERROR","message":"{}"}},"durationMs":0}}"#,
                err.to_string().replace('"', "'")
            )
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use serde_json::json;

    fn run(editor: &mut SpreadsheetEditor, kind: &str, payload: Value) -> CommandResponse {
        CommandExecutor::execute(Some(editor), &Command::new("cmd-1", kind, payload))
    }

    #[test]
    fn test_error_code_names() {
        assert_eq!(
            serde_json::to_value(ErrorCode::NotInitialized).unwrap(),
            json!("NOT_INITIALIZED")
        );
        for code in [ErrorCode::InvalidRange, ErrorCode::Timeout, ErrorCode::ExportFailed] {
            assert_eq!(serde_json::to_value(code).unwrap(), json!(code.as_str()));
        }
    }

    #[test]
    fn test_missing_editor() {
        let response = CommandExecutor::execute::<MemoryEngine>(
            None,
            &Command::new("c1", "sheet.getData", json!({})),
        );
        assert!(!response.success);
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::NotInitialized);
        assert_eq!(error.message, "Spreadsheet editor not initialized");
    }

    #[test]
    fn test_unknown_command() {
        let mut editor = SpreadsheetEditor::default();
        let response = run(&mut editor, "sheet.teleport", json!({}));
        assert_eq!(response.command_id, "cmd-1");
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::InvalidCommand);
        assert_eq!(error.message, "Unknown command type: sheet.teleport");
    }

    #[test]
    fn test_response_shape() {
        let mut editor = SpreadsheetEditor::default();
        let response = run(&mut editor, "sheet.addSheet", json!({"name": "Extra"}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], json!(true));
        assert_eq!(json["result"]["sheetName"], json!("Extra"));
        assert_eq!(json["result"]["index"], json!(1));
        assert!(json.get("error").is_none());
        assert!(json["durationMs"].is_u64());
    }

    #[test]
    fn test_json_round_trip() {
        let mut editor: SpreadsheetEditor = SpreadsheetEditor::default();
        let out = CommandExecutor::execute_json(
            Some(&mut editor),
            r#"{"id":"x","type":"sheet.renameSheet","payload":{"index":0,"name":"Main"},"timestamp":1}"#,
        );
        let response: CommandResponse = serde_json::from_str(&out).unwrap();
        assert!(response.success);
        assert_eq!(
            response.result.unwrap(),
            json!({"oldName": "Sheet1", "newName": "Main"})
        );

        let out = CommandExecutor::execute_json(Some(&mut editor), "{not json");
        let response: CommandResponse = serde_json::from_str(&out).unwrap();
        assert_eq!(response.error.unwrap().code, ErrorCode::InvalidCommand);
    }
}

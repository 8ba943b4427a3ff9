//! Flattened execution result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of an execution, flattened from the service's stage-keyed body.
///
/// Each field is `None` when its stage did not run or did not report that
/// stream. `Some(String::new())` means the stage ran and printed nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Standard output of the install stage.
    pub install_output: Option<String>,
    /// Standard error of the install stage.
    pub install_error: Option<String>,
    /// Standard output of the execute stage.
    pub execute_output: Option<String>,
    /// Standard error of the execute stage.
    pub execute_error: Option<String>,
    /// URL of a web application started by the execution, if any.
    pub web_app_url: Option<String>,
}

impl ExecutionResult {
    /// Parse a `POST /execute` response body.
    ///
    /// Unknown stages and top-level keys are ignored.
    pub fn from_response(response: &Value) -> Result<Self, serde_json::Error> {
        let body = ExecuteResponse::deserialize(response)?;
        let stages = body.stages.unwrap_or_default();
        let (install_output, install_error) =
            stages.install.map(StageOutput::split).unwrap_or_default();
        let (execute_output, execute_error) =
            stages.execute.map(StageOutput::split).unwrap_or_default();

        Ok(Self {
            install_output,
            install_error,
            execute_output,
            execute_error,
            web_app_url: body.web_app_url,
        })
    }

    /// Check whether the execute stage ran.
    pub fn executed(&self) -> bool {
        self.execute_output.is_some() || self.execute_error.is_some()
    }
}

// Internal response types matching the service's JSON structure

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    stages: Option<Stages>,
    #[serde(default, rename = "webAppUrl")]
    web_app_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Stages {
    #[serde(default)]
    install: Option<StageOutput>,
    #[serde(default)]
    execute: Option<StageOutput>,
}

#[derive(Debug, Deserialize)]
struct StageOutput {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
}

impl StageOutput {
    fn split(self) -> (Option<String>, Option<String>) {
        (self.stdout, self.stderr)
    }
}

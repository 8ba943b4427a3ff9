//! Execution request payload and its builder.
//!
//! Every tuning field is an `Option`. `None` is left out of the payload so
//! the service applies its own default; `Some(vec![])` is sent as `[]`,
//! which the service reads as "explicitly none".

use serde::{Deserialize, Serialize};

/// File name used for the primary source file when none is given.
pub const DEFAULT_FILE_NAME: &str = "main";

/// Encoding of a [`SourceFile`]'s content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEncoding {
    /// Plain UTF-8 text.
    #[default]
    Utf8,
    /// Base64-encoded bytes.
    Base64,
    /// Hex-encoded bytes.
    Hex,
}

/// One named file sent with an execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name inside the sandbox.
    pub name: String,
    /// File content, encoded per `encoding`.
    pub content: String,
    /// Content encoding.
    #[serde(default)]
    pub encoding: FileEncoding,
}

impl SourceFile {
    /// Create a UTF-8 source file.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            encoding: FileEncoding::Utf8,
        }
    }

    /// Set the content encoding.
    pub fn with_encoding(mut self, encoding: FileEncoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Request body for `POST /execute`.
///
/// Memory limits are in bytes, time limits in milliseconds. A value of `-1`
/// is forwarded as-is; the service reads it as "unlimited".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Language name or alias.
    pub language: String,
    /// Language version.
    pub version: String,
    /// Source files; the first one is the entry point.
    pub files: Vec<SourceFile>,
    /// Packages to install before running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    /// Command-line arguments for the program.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Standard input content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_memory_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_memory_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_cpu_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_cpu_time: Option<i64>,
}

impl ExecutionRequest {
    /// Start building a request for a single source file.
    ///
    /// The file is named `main` and UTF-8 encoded unless changed with
    /// [`ExecutionRequestBuilder::name`] or [`ExecutionRequestBuilder::encoding`].
    pub fn builder(
        language: impl Into<String>,
        version: impl Into<String>,
        code: impl Into<String>,
    ) -> ExecutionRequestBuilder {
        ExecutionRequestBuilder {
            request: Self {
                language: language.into(),
                version: version.into(),
                files: vec![SourceFile::new(DEFAULT_FILE_NAME, code)],
                dependencies: None,
                args: None,
                stdin: None,
                compile_memory_limit: None,
                run_memory_limit: None,
                compile_timeout: None,
                run_timeout: None,
                compile_cpu_time: None,
                run_cpu_time: None,
            },
        }
    }
}

/// Builder for [`ExecutionRequest`].
#[derive(Debug, Clone)]
pub struct ExecutionRequestBuilder {
    request: ExecutionRequest,
}

impl ExecutionRequestBuilder {
    fn primary_file(&mut self) -> &mut SourceFile {
        // builder() always seeds one file and nothing removes it
        &mut self.request.files[0]
    }

    /// Set the primary file's name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.primary_file().name = name.into();
        self
    }

    /// Set the primary file's encoding.
    pub fn encoding(mut self, encoding: FileEncoding) -> Self {
        self.primary_file().encoding = encoding;
        self
    }

    /// Append an additional file after the primary one.
    pub fn file(mut self, file: SourceFile) -> Self {
        self.request.files.push(file);
        self
    }

    /// Set the dependency list. An empty list is sent as `[]`.
    pub fn dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.request.dependencies = Some(dependencies);
        self
    }

    /// Set the argument list. An empty list is sent as `[]`.
    pub fn args(mut self, args: Vec<String>) -> Self {
        self.request.args = Some(args);
        self
    }

    /// Set standard input.
    pub fn stdin(mut self, stdin: impl Into<String>) -> Self {
        self.request.stdin = Some(stdin.into());
        self
    }

    /// Set the compile-phase memory limit in bytes.
    pub fn compile_memory_limit(mut self, bytes: i64) -> Self {
        self.request.compile_memory_limit = Some(bytes);
        self
    }

    /// Set the run-phase memory limit in bytes.
    pub fn run_memory_limit(mut self, bytes: i64) -> Self {
        self.request.run_memory_limit = Some(bytes);
        self
    }

    /// Set the compile-phase wall-clock timeout in milliseconds.
    pub fn compile_timeout(mut self, millis: i64) -> Self {
        self.request.compile_timeout = Some(millis);
        self
    }

    /// Set the run-phase wall-clock timeout in milliseconds.
    pub fn run_timeout(mut self, millis: i64) -> Self {
        self.request.run_timeout = Some(millis);
        self
    }

    /// Set the compile-phase CPU time limit in milliseconds.
    pub fn compile_cpu_time(mut self, millis: i64) -> Self {
        self.request.compile_cpu_time = Some(millis);
        self
    }

    /// Set the run-phase CPU time limit in milliseconds.
    pub fn run_cpu_time(mut self, millis: i64) -> Self {
        self.request.run_cpu_time = Some(millis);
        self
    }

    /// Finish the request.
    pub fn build(self) -> ExecutionRequest {
        self.request
    }
}

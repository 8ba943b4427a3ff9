//! # codux-protocol
//!
//! Wire types for the codux code-execution service.
//!
//! Everything in this crate is plain serde data: no I/O, no async. The
//! `codux-client` crate sends and receives these types over HTTP and
//! WebSocket.
//!
//! ## Payloads
//!
//! ```text
//! POST /execute    ExecutionRequest  ──▶  { stages: { install?, execute? }, webAppUrl? }
//!                                                 │
//!                                                 ▼
//!                                          ExecutionResult (flat)
//!
//! GET  /runtimes   ──▶  [Runtime]
//! GET  /packages   ──▶  [Package]
//! POST /packages   PackageSpec
//! DEL  /packages   PackageSpec
//!
//! WS   /connect    ClientMessage  ◀──▶  ServerMessage
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use codux_protocol::ExecutionRequest;
//!
//! let request = ExecutionRequest::builder("python", "3.11.0", "print('hi')")
//!     .args(vec!["--verbose".into()])
//!     .run_timeout(3000)
//!     .build();
//!
//! let payload = serde_json::to_value(&request).unwrap();
//! assert_eq!(payload["files"][0]["name"], "main");
//! assert!(payload.get("stdin").is_none());
//! ```

mod execute;
mod inventory;
mod result;
mod session;

pub use execute::{
    ExecutionRequest, ExecutionRequestBuilder, FileEncoding, SourceFile, DEFAULT_FILE_NAME,
};
pub use inventory::{Package, PackageSpec, Runtime};
pub use result::ExecutionResult;
pub use session::{ClientMessage, ServerMessage, StreamName};

//! # codux-client
//!
//! Client for a remote sandboxed code-execution service.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      codux-client                        │
//! ├──────────────────────────────────────────────────────────┤
//! │                                                          │
//! │  ┌──────────────────────┐                                │
//! │  │ Client               │   ExecutionRequest (builder)   │
//! │  │  - list_runtimes()   │   ExecutionResult  (parser)    │
//! │  │  - list_packages()   │   from codux-protocol          │
//! │  │  - install_package() │                                │
//! │  │  - execute()         │                                │
//! │  │  - connect() ────────┼──────────┐                     │
//! │  └──────────────────────┘          │                     │
//! │           │                        ▼                     │
//! │           ▼              ┌──────────────────────────┐    │
//! │  ┌──────────────────┐    │  Session                 │    │
//! │  │ Transport        │    │   writer task ─▶ ws sink │    │
//! │  │  - request()     │    │   reader task ◀─ ws recv │    │
//! │  └──────────────────┘    └──────────────────────────┘    │
//! │           │                        │                     │
//! │           ▼                        │                     │
//! │  ┌──────────────────┐              │                     │
//! │  │ classify         │              │                     │
//! │  │  404 / 409 / *   │              │                     │
//! │  └──────────────────┘              │                     │
//! └───────────│────────────────────────│─────────────────────┘
//!             ▼ HTTP                   ▼ WebSocket
//!      {base_url}/{endpoint}    ws(s)://…/connect
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use codux_client::{Client, ClientConfig, ExecutionRequest};
//!
//! # async fn example() -> codux_client::Result<()> {
//! let client = Client::new(
//!     ClientConfig::builder()
//!         .base_url("http://localhost/api/v2")
//!         .timeout_secs(30)
//!         .header("Authorization", "Bearer token")
//!         .build()?,
//! )?;
//!
//! // One-shot execution
//! let result = client
//!     .execute_code("python", "3.11.0", "print('Hello, World!')", None)
//!     .await?;
//! println!("{}", result.execute_output.unwrap_or_default());
//!
//! // Tuned execution: unset fields are left to the service
//! let request = ExecutionRequest::builder("python", "3.11.0", "print(input())")
//!     .stdin("hi\n")
//!     .run_timeout(3000)
//!     .build();
//! let result = client.execute(&request, None).await?;
//!
//! // Inventory
//! if client.install_package("python", "3.11.0", None).await? {
//!     println!("installed");
//! }
//! for runtime in client.list_runtimes(None).await? {
//!     println!("{} {}", runtime.language, runtime.version);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Typed errors**: every HTTP outcome maps to one [`CoduxError`] variant
//! - **Presence-aware requests**: unset tuning fields never reach the wire
//! - **Interactive sessions**: full-duplex WebSocket with serialized sends
//! - **Header overlay**: per-call headers on top of configured defaults

mod classify;
mod client;
mod config;
mod error;
mod session;
mod transport;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{CoduxError, Result};
pub use session::{Session, SessionReceiver, SessionSender};
pub use transport::Transport;

pub use codux_protocol::{
    ClientMessage, ExecutionRequest, ExecutionRequestBuilder, ExecutionResult, FileEncoding,
    Package, PackageSpec, Runtime, ServerMessage, SourceFile, StreamName,
};
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::Method;

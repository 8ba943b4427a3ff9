//! High-level client for the execution service.
//!
//! Inventory and execution calls are thin wrappers over [`Transport`]: build
//! the body, send it, decode the reply strictly.

use crate::classify::PACKAGES_ENDPOINT;
use crate::config::ClientConfig;
use crate::error::CoduxError;
use crate::session::Session;
use crate::transport::Transport;
use codux_protocol::{ExecutionRequest, ExecutionResult, Package, PackageSpec, Runtime};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Client for one execution service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Transport,
}

impl Client {
    /// Create a client from a configuration.
    pub fn new(config: ClientConfig) -> Result<Self, CoduxError> {
        Ok(Self {
            transport: Transport::new(&config)?,
        })
    }

    /// Create a client from `CODUX_*` environment variables.
    pub fn from_env() -> Result<Self, CoduxError> {
        Self::new(ClientConfig::from_env())
    }

    /// The underlying transport, for calls this client does not wrap.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// List the runtimes the service can execute.
    ///
    /// Fails as a whole if any entry is malformed.
    pub async fn list_runtimes(
        &self,
        headers: Option<&HeaderMap>,
    ) -> Result<Vec<Runtime>, CoduxError> {
        let response = self
            .transport
            .request::<()>(Method::GET, "/runtimes", headers, None)
            .await?;
        let runtimes: Vec<Runtime> = decode("runtimes", response)?;
        tracing::debug!(count = runtimes.len(), "Runtimes listed");
        Ok(runtimes)
    }

    /// List the packages known to the service and their install state.
    pub async fn list_packages(
        &self,
        headers: Option<&HeaderMap>,
    ) -> Result<Vec<Package>, CoduxError> {
        let response = self
            .transport
            .request::<()>(Method::GET, PACKAGES_ENDPOINT, headers, None)
            .await?;
        let packages: Vec<Package> = decode(PACKAGES_ENDPOINT, response)?;
        tracing::debug!(count = packages.len(), "Packages listed");
        Ok(packages)
    }

    /// Install a language package.
    ///
    /// Returns `true` if the package was installed by this call and `false`
    /// if it was already installed.
    pub async fn install_package(
        &self,
        language: &str,
        version: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<bool, CoduxError> {
        tracing::debug!(language = %language, version = %version, "Installing package");
        let spec = PackageSpec::new(language, version);
        match self
            .transport
            .request(Method::POST, PACKAGES_ENDPOINT, headers, Some(&spec))
            .await
        {
            Ok(_) => Ok(true),
            Err(CoduxError::AlreadyExists(message)) => {
                tracing::debug!(
                    language = %language,
                    version = %version,
                    message = %message,
                    "Package already installed"
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Uninstall a language package.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the package is not installed.
    pub async fn uninstall_package(
        &self,
        language: &str,
        version: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<(), CoduxError> {
        tracing::debug!(language = %language, version = %version, "Uninstalling package");
        let spec = PackageSpec::new(language, version);
        self.transport
            .request(Method::DELETE, PACKAGES_ENDPOINT, headers, Some(&spec))
            .await?;
        Ok(())
    }

    /// Terminate a running process on the service.
    pub async fn terminate_process(
        &self,
        process_id: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<(), CoduxError> {
        tracing::debug!(process_id = %process_id, "Terminating process");
        self.transport
            .request::<()>(
                Method::DELETE,
                &format!("/process/{process_id}"),
                headers,
                None,
            )
            .await?;
        Ok(())
    }

    /// Execute a request and wait for its result.
    pub async fn execute(
        &self,
        request: &ExecutionRequest,
        headers: Option<&HeaderMap>,
    ) -> Result<ExecutionResult, CoduxError> {
        tracing::debug!(
            language = %request.language,
            version = %request.version,
            files = request.files.len(),
            "Executing code"
        );
        let response = self
            .transport
            .request(Method::POST, "/execute", headers, Some(request))
            .await?;
        ExecutionResult::from_response(&response).map_err(|e| CoduxError::TransportFailure {
            status: None,
            message: format!("failed to decode execute response: {e}"),
        })
    }

    /// Execute a single source file with service defaults for every limit.
    pub async fn execute_code(
        &self,
        language: &str,
        version: &str,
        code: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<ExecutionResult, CoduxError> {
        let request = ExecutionRequest::builder(language, version, code).build();
        self.execute(&request, headers).await
    }

    /// Open an interactive session on `/connect`.
    pub async fn connect(&self, headers: Option<&HeaderMap>) -> Result<Session, CoduxError> {
        Session::connect(&self.transport, headers).await
    }
}

/// Strictly decode a JSON reply.
fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, CoduxError> {
    serde_json::from_value(value).map_err(|e| {
        tracing::warn!(endpoint = %endpoint, error = %e, "Malformed response");
        CoduxError::TransportFailure {
            status: None,
            message: format!("failed to decode {endpoint} response: {e}"),
        }
    })
}

use crate::{
    bulk::{BulkExecutor, BulkExecutorConfig},
    control::ControlPlane,
    error::AdapterError,
};
use async_trait::async_trait;
use std::{fmt, path::PathBuf, str::FromStr};

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreEndpoint {
    /// Temporary store that disappears with the process, e.g. `memory://` or
    /// `memory://scratch`.
    Memory(String),
    /// On-disk store rooted at the given directory, e.g. `sled:///var/lib/bulk`.
    Sled(PathBuf),
}

impl FromStr for StoreEndpoint {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix("memory://") {
            return Ok(StoreEndpoint::Memory(name.to_string()));
        }
        if let Some(path) = s.strip_prefix("sled://") {
            if path.is_empty() {
                return Err(AdapterError::UnsupportedEndpoint(format!(
                    "{s} (missing store directory)"
                )));
            }
            return Ok(StoreEndpoint::Sled(PathBuf::from(path)));
        }
        Err(AdapterError::UnsupportedEndpoint(s.to_string()))
    }
}

impl fmt::Display for StoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreEndpoint::Memory(name) => write!(f, "memory://{name}"),
            StoreEndpoint::Sled(path) => write!(f, "sled://{}", path.display()),
        }
    }
}

/// Opens control-plane connections and bulk executors for an endpoint.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn connect(
        &self,
        endpoint: &str,
        credential: &str,
    ) -> Result<Box<dyn ControlPlane>, AdapterError>;

    async fn bulk_executor(
        &self,
        config: BulkExecutorConfig,
    ) -> Result<Box<dyn BulkExecutor>, AdapterError>;
}

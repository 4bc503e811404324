//! Cluster access via the kubectl and helm CLIs.
//!
//! All cluster reads and writes funnel through [`ClusterClient`], so tools
//! never spawn processes themselves and tests can swap in a fake cluster.
//! Commands run without a shell; arguments are passed as discrete argv
//! entries and never interpolated.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Command timed out after {0} ms")]
    Timeout(u64),
    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    CommandFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability surface the tools operate against.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Run kubectl with the given argv, returning stdout on success.
    async fn kubectl(&self, args: &[String], timeout_ms: Option<u64>)
        -> Result<String, ClusterError>;

    /// Run helm with the given argv, returning stdout on success.
    async fn helm(&self, args: &[String], timeout_ms: Option<u64>) -> Result<String, ClusterError>;
}

/// Production client shelling out to the configured binaries.
pub struct KubectlClient {
    kubectl_path: String,
    helm_path: String,
}

impl KubectlClient {
    pub fn new(kubectl_path: impl Into<String>, helm_path: impl Into<String>) -> Self {
        Self {
            kubectl_path: kubectl_path.into(),
            helm_path: helm_path.into(),
        }
    }

    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout_ms: Option<u64>,
    ) -> Result<String, ClusterError> {
        let timeout_ms = timeout_ms.unwrap_or(DEFAULT_COMMAND_TIMEOUT_MS);
        debug!("Running {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ClusterError::Spawn {
                command: program.to_string(),
                source,
            })?;

        // Dropping the future on timeout kills the child via kill_on_drop.
        let output = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ClusterError::Timeout(timeout_ms))??;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() {
                format!("{program} exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            Err(ClusterError::CommandFailed(detail))
        }
    }
}

#[async_trait]
impl ClusterClient for KubectlClient {
    async fn kubectl(
        &self,
        args: &[String],
        timeout_ms: Option<u64>,
    ) -> Result<String, ClusterError> {
        self.run(&self.kubectl_path, args, timeout_ms).await
    }

    async fn helm(&self, args: &[String], timeout_ms: Option<u64>) -> Result<String, ClusterError> {
        self.run(&self.helm_path, args, timeout_ms).await
    }
}

/// Recording fake used by unit tests across the crate.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedCall {
        pub program: &'static str,
        pub args: Vec<String>,
        pub timeout_ms: Option<u64>,
    }

    /// Returns a canned response and records every argv it sees.
    pub struct RecordingCluster {
        pub response: String,
        pub fail_with: Option<String>,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    impl RecordingCluster {
        pub fn new(response: impl Into<String>) -> Self {
            Self {
                response: response.into(),
                fail_with: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(detail: impl Into<String>) -> Self {
            Self {
                response: String::new(),
                fail_with: Some(detail.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn last_call(&self) -> RecordedCall {
            self.calls.lock().unwrap().last().cloned().expect("no calls recorded")
        }

        fn record(
            &self,
            program: &'static str,
            args: &[String],
            timeout_ms: Option<u64>,
        ) -> Result<String, ClusterError> {
            self.calls.lock().unwrap().push(RecordedCall {
                program,
                args: args.to_vec(),
                timeout_ms,
            });
            match &self.fail_with {
                Some(detail) => Err(ClusterError::CommandFailed(detail.clone())),
                None => Ok(self.response.clone()),
            }
        }
    }

    #[async_trait]
    impl ClusterClient for RecordingCluster {
        async fn kubectl(
            &self,
            args: &[String],
            timeout_ms: Option<u64>,
        ) -> Result<String, ClusterError> {
            self.record("kubectl", args, timeout_ms)
        }

        async fn helm(
            &self,
            args: &[String],
            timeout_ms: Option<u64>,
        ) -> Result<String, ClusterError> {
            self.record("helm", args, timeout_ms)
        }
    }
}

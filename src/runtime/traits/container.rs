// ABOUTME: Container inspection trait.
// ABOUTME: Exposes the declared labels the boot command is read from.

use crate::types::ContainerId;
use async_trait::async_trait;
use std::collections::HashMap;

/// The part of a container's inspect output the gate looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub id: ContainerId,
    /// Labels from the container's declared configuration.
    pub labels: HashMap<String, String>,
}

#[async_trait]
pub trait ContainerOps: Send + Sync {
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError>;
}

/// Errors from container operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("container not found: {0}")]
    NotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

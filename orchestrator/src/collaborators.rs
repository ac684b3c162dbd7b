//! Trait seams for the external collaborators this core runs against.
//!
//! Import/parse and cluster bootstrap are implemented elsewhere; the core
//! only depends on these interfaces and on the resulting handles.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::{error::Error, fmt, io};

use ml_core::Frame;

/// Source encodings the import collaborator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    CsvGz,
}

/// Failures during import and parse.
#[derive(Debug)]
pub enum ImportError {
    Io(io::Error),
    Parse { line: usize, reason: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(e) => write!(f, "io error: {e}"),
            ImportError::Parse { line, reason } => {
                write!(f, "parse error at line {line}: {reason}")
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ImportError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Parses an external source into a columnar frame registered under
/// `destination_key`. The core consumes only the handle's row/column
/// metadata.
pub trait DatasetImporter {
    fn import_and_parse(
        &self,
        source: &str,
        format: DataFormat,
        destination_key: &str,
    ) -> Result<Arc<Frame>, ImportError>;
}

/// An opaque handle to a provisioned compute cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterHandle {
    nodes: NonZeroUsize,
    base_port: u16,
}

impl ClusterHandle {
    pub fn new(nodes: NonZeroUsize, base_port: u16) -> Self {
        Self { nodes, base_port }
    }

    #[inline]
    pub fn nodes(&self) -> NonZeroUsize {
        self.nodes
    }

    #[inline]
    pub fn base_port(&self) -> u16 {
        self.base_port
    }
}

/// Failures while provisioning a cluster.
#[derive(Debug)]
pub enum BootstrapError {
    NodeUnreachable { node: usize },
    Io(io::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::NodeUnreachable { node } => {
                write!(f, "node {node} did not come up")
            }
            BootstrapError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BootstrapError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Provisions `nodes` workers with the given heap budget, listening from
/// `base_port` upwards.
pub trait ClusterBootstrap {
    fn build_cluster(
        &self,
        nodes: NonZeroUsize,
        heap_mb_per_node: usize,
        base_port: u16,
    ) -> Result<ClusterHandle, BootstrapError>;
}

mod single_node;
mod single_thread;

use std::num::NonZeroUsize;

use ml_core::{FeatureLayout, Frame, HyperParameters, NeuralNet};

use crate::TrainError;

/// How one logical training job is executed.
///
/// A closed set: adding a mode means adding a variant here and teaching every
/// dispatch site about it, so "unsupported mode" can never hide behind a
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Whole dataset on one thread, deterministic given the seed.
    SingleThread,

    /// Disjoint row shards across a worker pool on one machine, replicas
    /// averaged at epoch boundaries. `None` sizes the pool from the rayon
    /// runtime.
    SingleNode { workers: Option<NonZeroUsize> },

    /// Shards across network-connected workers with an order-invariant
    /// reduction. Declared, but not available in this build.
    MultiNode { nodes: NonZeroUsize },
}

impl ExecutionMode {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionMode::SingleThread => "SingleThread",
            ExecutionMode::SingleNode { .. } => "SingleNode",
            ExecutionMode::MultiNode { .. } => "MultiNode",
        }
    }
}

/// Which execution modes a build supports, passed in at call time.
///
/// Requesting an absent capability fails fast with a distinct error; there is
/// no silent fallback and no process-wide switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    single_thread: bool,
    single_node: bool,
    multi_node: bool,
}

impl Capabilities {
    pub fn new(single_thread: bool, single_node: bool, multi_node: bool) -> Self {
        Self {
            single_thread,
            single_node,
            multi_node,
        }
    }

    /// The capability set of this build: multi-node reduction exists as a
    /// combine operation, but its network execution is not implemented.
    pub fn this_build() -> Self {
        Self::new(true, true, false)
    }

    pub fn supports(&self, mode: &ExecutionMode) -> bool {
        match mode {
            ExecutionMode::SingleThread => self.single_thread,
            ExecutionMode::SingleNode { .. } => self.single_node,
            ExecutionMode::MultiNode { .. } => self.multi_node,
        }
    }
}

/// Everything one epoch pass needs to see, borrowed from the trainer.
pub(crate) struct EpochCtx<'a> {
    pub frame: &'a Frame,
    pub layout: &'a FeatureLayout,
    pub params: &'a HyperParameters,
    /// 0-based epoch index.
    pub epoch: usize,
    /// Samples processed before this epoch started; drives the schedules.
    pub samples_seen: u64,
    /// Rows to process this epoch; a prefix of the dataset on the final
    /// fractional epoch.
    pub rows: usize,
}

/// Per-run strategy state, created once so SingleThread momentum carries
/// across epochs.
pub(crate) enum EpochRunner {
    SingleThread(single_thread::SingleThread),
    SingleNode(single_node::SingleNode),
}

impl EpochRunner {
    /// Builds the runner for a supported mode.
    ///
    /// # Panics
    /// On `MultiNode`: capability checks reject it before a trainer is
    /// constructed, so reaching here is a bug in the caller.
    pub fn new(mode: &ExecutionMode, net: &NeuralNet, params: &HyperParameters) -> Self {
        match mode {
            ExecutionMode::SingleThread => {
                Self::SingleThread(single_thread::SingleThread::new(net, params))
            }
            ExecutionMode::SingleNode { workers } => {
                Self::SingleNode(single_node::SingleNode::new(net, params, *workers))
            }
            ExecutionMode::MultiNode { .. } => {
                unreachable!("MultiNode passed capability check but has no runner")
            }
        }
    }

    /// Runs one epoch and returns the mean training loss over its rows.
    pub fn run_epoch(&mut self, net: &mut NeuralNet, ctx: &EpochCtx<'_>) -> Result<f64, TrainError> {
        match self {
            EpochRunner::SingleThread(r) => r.run_epoch(net, ctx),
            EpochRunner::SingleNode(r) => r.run_epoch(net, ctx),
        }
    }
}

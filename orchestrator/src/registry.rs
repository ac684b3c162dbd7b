use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use ml_core::{Frame, NeuralNet};

/// Keyed store of datasets and trained models.
///
/// Frames enter once and are shared read-only; models are published here when
/// their training job completes.
#[derive(Default)]
pub struct Registry {
    frames: RwLock<HashMap<String, Arc<Frame>>>,
    models: RwLock<HashMap<String, Arc<NeuralNet>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a frame, replacing any previous frame under the same key.
    pub fn insert_frame(&self, key: impl Into<String>, frame: Frame) -> Arc<Frame> {
        let frame = Arc::new(frame);
        self.frames
            .write()
            .insert(key.into(), Arc::clone(&frame));
        frame
    }

    pub fn frame(&self, key: &str) -> Option<Arc<Frame>> {
        self.frames.read().get(key).cloned()
    }

    pub fn insert_model(&self, key: impl Into<String>, model: Arc<NeuralNet>) {
        self.models.write().insert(key.into(), model);
    }

    pub fn model(&self, key: &str) -> Option<Arc<NeuralNet>> {
        self.models.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ml_core::Column;

    #[test]
    fn frames_round_trip_by_key() {
        let registry = Registry::new();
        assert!(registry.frame("train").is_none());

        let frame =
            Frame::new(vec![Column::new("x", vec![1.0, 2.0])]).unwrap();
        registry.insert_frame("train", frame);

        let found = registry.frame("train").unwrap();
        assert_eq!(found.rows(), 2);
        assert!(registry.frame("other").is_none());
    }
}

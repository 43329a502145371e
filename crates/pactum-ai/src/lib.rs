//! AI inference layer: ONNX Runtime sequence classification for contracts.

mod classifier;

pub use classifier::{Classifier, ClassifierError};

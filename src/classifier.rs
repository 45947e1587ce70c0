//! Disease classification adapter.
//!
//! Wraps whatever model implements [`Classifier`] and turns its raw
//! probabilities into a [`Diagnosis`] a farmer can read.

use std::collections::HashMap;
use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::preprocess::{self, ImageTensor};

pub const MODEL_NOT_LOADED: &str = "Model not loaded";
pub const NOT_IDENTIFIED: &str = "Could not identify a specific disease from this image.";
pub const UNKNOWN_LABEL: &str = "Unknown";

const BACKGROUND_MARKER: &str = "background";

/// Black-box image model: one probability per class index.
pub trait Classifier: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub label: String,
    /// Probability of the predicted class, in `[0, 1]`.
    pub confidence: f32,
}

impl Diagnosis {
    fn sentinel(label: &str) -> Self {
        Self {
            label: label.to_string(),
            confidence: 0.0,
        }
    }

    /// False for the "not identified" and "model not loaded" results.
    pub fn is_identified(&self) -> bool {
        self.label != NOT_IDENTIFIED && self.label != MODEL_NOT_LOADED
    }

    /// Confidence as a percentage with one decimal, e.g. `93.4%`.
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}%", self.confidence * 100.0)
    }
}

/// Index → label table, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    labels: HashMap<usize, String>,
}

impl ClassIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parses the `{"label": index}` file written at training time.
    pub fn from_json(raw: &str) -> Result<Self> {
        let by_name: HashMap<String, usize> = serde_json::from_str(raw)?;
        if by_name.is_empty() {
            return Err(Error::ClassIndex("class index is empty".into()));
        }

        let mut labels = HashMap::with_capacity(by_name.len());
        for (name, index) in by_name {
            if let Some(previous) = labels.insert(index, name) {
                return Err(Error::ClassIndex(format!(
                    "index {index} is assigned to more than one class (including '{previous}')"
                )));
            }
        }

        Ok(Self { labels })
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub struct DiseaseClassifier {
    model: Option<Box<dyn Classifier>>,
    classes: ClassIndex,
    image_size: u32,
}

impl DiseaseClassifier {
    pub fn new(model: Box<dyn Classifier>, classes: ClassIndex, image_size: u32) -> Self {
        info!(classes = classes.len(), image_size, "disease classifier ready");
        Self {
            model: Some(model),
            classes,
            image_size,
        }
    }

    /// A classifier that answers every request with [`MODEL_NOT_LOADED`].
    pub fn disabled() -> Self {
        Self {
            model: None,
            classes: ClassIndex::default(),
            image_size: 0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn diagnose(&self, image: &DynamicImage) -> Result<Diagnosis> {
        let Some(model) = &self.model else {
            return Ok(Diagnosis::sentinel(MODEL_NOT_LOADED));
        };

        let tensor = preprocess::to_tensor(image, self.image_size);
        let probabilities = model.predict(&tensor)?;
        let (index, confidence) = argmax(&probabilities)
            .ok_or_else(|| Error::Model("model returned no probabilities".into()))?;

        let raw_label = self.classes.label(index).unwrap_or(UNKNOWN_LABEL);
        debug!(index, raw_label, confidence, "top prediction");

        if raw_label.to_lowercase().contains(BACKGROUND_MARKER) {
            return Ok(Diagnosis::sentinel(NOT_IDENTIFIED));
        }

        Ok(Diagnosis {
            label: readable_label(raw_label),
            confidence,
        })
    }
}

fn argmax(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, top)) if top >= p || p.is_nan() => best,
            _ => Some((i, p)),
        })
}

/// `Tomato___Early_blight` becomes `Tomato Early blight`.
fn readable_label(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use image::RgbImage;

    use super::*;

    struct Fixed {
        probabilities: Vec<f32>,
        calls: Arc<AtomicUsize>,
    }

    impl Classifier for Fixed {
        fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>> {
            assert_eq!(input.dims(), [1, 8, 8, 3]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probabilities.clone())
        }
    }

    const CLASSES: &str = r#"{
        "Apple___healthy": 0,
        "Background_without_leaves": 1,
        "Tomato___Early_blight": 2
    }"#;

    fn classifier(probabilities: Vec<f32>) -> (DiseaseClassifier, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = Fixed {
            probabilities,
            calls: calls.clone(),
        };
        let classes = ClassIndex::from_json(CLASSES).unwrap();
        (DiseaseClassifier::new(Box::new(model), classes, 8), calls)
    }

    fn leaf() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(16, 16))
    }

    #[test]
    fn picks_the_most_probable_class() {
        let (classifier, calls) = classifier(vec![0.1, 0.2, 0.7]);
        let diagnosis = classifier.diagnose(&leaf()).unwrap();

        assert_eq!(diagnosis.label, "Tomato Early blight");
        assert!((diagnosis.confidence - 0.7).abs() < 1e-6);
        assert_eq!(diagnosis.confidence_percent(), "70.0%");
        assert!(diagnosis.is_identified());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn background_is_reported_as_not_identified() {
        let (classifier, _) = classifier(vec![0.05, 0.9, 0.05]);
        let diagnosis = classifier.diagnose(&leaf()).unwrap();

        assert_eq!(diagnosis, Diagnosis::sentinel(NOT_IDENTIFIED));
        assert_eq!(diagnosis.confidence, 0.0);
        assert!(!diagnosis.is_identified());
    }

    #[test]
    fn index_missing_from_table_is_unknown() {
        let (classifier, _) = classifier(vec![0.1, 0.1, 0.1, 0.7]);
        assert_eq!(classifier.diagnose(&leaf()).unwrap().label, UNKNOWN_LABEL);
    }

    #[test]
    fn ties_resolve_to_the_lowest_index() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some((0, 0.4)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn empty_output_is_a_model_error() {
        let (classifier, _) = classifier(Vec::new());
        assert!(matches!(classifier.diagnose(&leaf()), Err(Error::Model(_))));
    }

    #[test]
    fn disabled_classifier_short_circuits() {
        let classifier = DiseaseClassifier::disabled();
        assert!(!classifier.is_loaded());

        let diagnosis = classifier.diagnose(&leaf()).unwrap();
        assert_eq!(diagnosis.label, MODEL_NOT_LOADED);
        assert!(!diagnosis.is_identified());
        assert_eq!(diagnosis.confidence, 0.0);
    }

    #[test]
    fn class_index_rejects_duplicate_indices() {
        let err = ClassIndex::from_json(r#"{"a": 0, "b": 0}"#).unwrap_err();
        assert!(matches!(err, Error::ClassIndex(_)));
        assert!(ClassIndex::from_json("{}").is_err());
    }
}

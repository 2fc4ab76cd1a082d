use crate::model::preprocess::ImageTensor;
use ort::session::Session;
use ort::value::TensorRef;
use shared::Prediction;
use std::path::Path;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("failed to load model from {path}: {source}")]
    ModelLoad { path: String, source: ort::Error },
    #[error("failed to read labels from {path}: {source}")]
    Labels {
        path: String,
        source: std::io::Error,
    },
    #[error("model is unusable: {0}")]
    ModelShape(String),
    #[error("inference failed: {0}")]
    Session(#[from] ort::Error),
    #[error("inference session lock was poisoned")]
    Poisoned,
    #[error("model produced no class scores")]
    EmptyOutput,
    #[error("model produced {got} class scores but {expected} labels are loaded")]
    LabelMismatch { got: usize, expected: usize },
}

/// A pretrained image classifier. Implementations must be safe to call from
/// concurrent requests.
pub trait Classifier: Send + Sync {
    /// Ranked predictions, highest confidence first. Never empty on success.
    fn classify(&self, input: &ImageTensor) -> Result<Vec<Prediction>, InferenceError>;
}

/// ONNX Runtime classifier with a label table.
///
/// One session is loaded at startup and shared by every request. Running a
/// session takes `&mut`, so inference is serialized behind a mutex: a single
/// inference slot rather than a data race.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    labels: Vec<String>,
    top_k: usize,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, labels_path: &Path, top_k: usize) -> Result<Self, InferenceError> {
        let session = Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| InferenceError::ModelLoad {
                path: model_path.display().to_string(),
                source: e,
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| InferenceError::ModelShape("model declares no inputs".into()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| InferenceError::ModelShape("model declares no outputs".into()))?;

        let labels = read_labels(labels_path)?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            labels,
            top_k: top_k.max(1),
        })
    }

    pub fn class_count(&self) -> usize {
        self.labels.len()
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, input: &ImageTensor) -> Result<Vec<Prediction>, InferenceError> {
        let tensor = TensorRef::from_array_view(input.view())?;
        let inputs = ort::inputs![self.input_name.as_str() => tensor];

        let mut session = self.session.lock().map_err(|_| InferenceError::Poisoned)?;
        let outputs = session.run(inputs)?;
        let (_, scores) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        if scores.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }
        if scores.len() != self.labels.len() {
            return Err(InferenceError::LabelMismatch {
                got: scores.len(),
                expected: self.labels.len(),
            });
        }

        Ok(rank_predictions(scores, &self.labels, self.top_k))
    }
}

/// Softmaxes raw class scores and returns the top-k labeled predictions,
/// highest confidence first.
pub fn rank_predictions(scores: &[f32], labels: &[String], top_k: usize) -> Vec<Prediction> {
    let probabilities = softmax(scores);
    let mut ranked: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_k.max(1));
    ranked
        .into_iter()
        .map(|(idx, confidence)| Prediction {
            label: labels[idx].clone(),
            confidence,
        })
        .collect()
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

fn read_labels(path: &Path) -> Result<Vec<String>, InferenceError> {
    let labels_err = |source| InferenceError::Labels {
        path: path.display().to_string(),
        source,
    };
    let contents = std::fs::read_to_string(path).map_err(labels_err)?;
    let labels: Vec<String> = contents
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        return Err(labels_err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "label file contains no labels",
        )));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn ranking_orders_by_confidence_descending() {
        let preds = rank_predictions(
            &[1.0, 3.0, 2.0],
            &labels(&["tabby cat", "African elephant", "water buffalo"]),
            3,
        );
        assert_eq!(preds[0].label, "African elephant");
        assert_eq!(preds[1].label, "water buffalo");
        assert_eq!(preds[2].label, "tabby cat");
        assert!(preds[0].confidence > preds[1].confidence);
        assert!(preds[1].confidence > preds[2].confidence);
    }

    #[test]
    fn ranking_truncates_to_top_k() {
        let preds = rank_predictions(&[0.1, 0.9, 0.5], &labels(&["a", "b", "c"]), 1);
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].label, "b");
    }

    #[test]
    fn confidences_are_a_probability_distribution() {
        let preds = rank_predictions(&[2.0, -1.0, 0.5, 0.0], &labels(&["a", "b", "c", "d"]), 4);
        let total: f32 = preds.iter().map(|p| p.confidence).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!(preds.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
    }

    #[test]
    fn top_k_of_zero_still_yields_the_top_prediction() {
        let preds = rank_predictions(&[0.2, 0.8], &labels(&["a", "b"]), 0);
        assert_eq!(preds.len(), 1);
    }

    #[test]
    fn label_file_is_read_line_per_class() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "tabby cat\n\nAfrican elephant  ").unwrap();
        let labels = read_labels(&path).unwrap();
        assert_eq!(labels, vec!["tabby cat", "African elephant"]);
    }

    #[test]
    fn empty_label_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "\n\n").unwrap();
        assert!(matches!(
            read_labels(&path),
            Err(InferenceError::Labels { .. })
        ));
    }
}

use crate::model::classifier::InferenceError;
use crate::model::preprocess::DecodeError;
use crate::storage::image_store::StoreError;

/// Pipeline stage at which a request failed. Dispatch has no entry here:
/// notification outcomes are observational and never fail a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Store,
    Decode,
    Infer,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Store => "store",
            Stage::Decode => "decode",
            Stage::Infer => "infer",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("upload rejected: {0}")]
    Store(#[from] StoreError),
    #[error("image could not be decoded: {0}")]
    Decode(#[from] DecodeError),
    #[error("classification failed: {0}")]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Store(_) => Stage::Store,
            PipelineError::Decode(_) => Stage::Decode,
            PipelineError::Inference(_) => Stage::Infer,
        }
    }
}

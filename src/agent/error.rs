use super::state::Phase;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),
    #[error("Answer generation failed: {0}")]
    AnswerGenerationFailed(String),
    #[error("Reflection failed: {0}")]
    ReflectionFailed(String),
    #[error("Stage {stage} cannot run in phase {phase:?}")]
    StageOrder { stage: &'static str, phase: Phase },
}

//! The question-answering pipeline: plan, retrieve, answer, reflect.
//!
//! Each stage takes the [`ConversationState`] by value and hands it back with
//! the fields it owns filled in. [`MedicalAgent::invoke`] applies [`STAGES`]
//! in order; a stage refuses to run unless the state sits in its
//! predecessor's phase.

pub mod error;
pub mod prompt;
pub mod state;

pub use error::AgentError;
pub use prompt::FALLBACK_ANSWER;
pub use state::{
    ConversationState, Phase, Reflection, RetrievedContext, RoutingDecision, NO_RETRIEVAL_SENTINEL,
};

use crate::llm::semantic_search::VectorIndex;
use crate::providers::traits::{CompletionProvider, Prompt};
use std::sync::Arc;

pub const CLINICAL_KEYWORDS: [&str; 6] = ["disease", "symptom", "treatment", "medicine", "drug", "diagnosis"];

pub const DEFAULT_TOP_K: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Plan,
    Retrieve,
    Answer,
    Reflect,
}

pub const STAGES: [Stage; 4] = [Stage::Plan, Stage::Retrieve, Stage::Answer, Stage::Reflect];

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Retrieve => "retrieve",
            Stage::Answer => "answer",
            Stage::Reflect => "reflect",
        }
    }

    fn requires(&self) -> Phase {
        match self {
            Stage::Plan => Phase::Created,
            Stage::Retrieve => Phase::Planned,
            Stage::Answer => Phase::Retrieved,
            Stage::Reflect => Phase::Answered,
        }
    }

    fn check(&self, state: &ConversationState) -> Result<(), AgentError> {
        if state.phase == self.requires() {
            Ok(())
        } else {
            Err(AgentError::StageOrder { stage: self.name(), phase: state.phase })
        }
    }
}

/// Substring match of the lower-cased question against [`CLINICAL_KEYWORDS`].
pub fn route_question(question: &str) -> RoutingDecision {
    let query = question.to_lowercase();
    if CLINICAL_KEYWORDS.iter().any(|keyword| query.contains(keyword)) {
        RoutingDecision::NeedsRetrieval
    } else {
        RoutingDecision::NoRetrieval
    }
}

pub struct MedicalAgent {
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn CompletionProvider>,
    top_k: u64,
}

impl MedicalAgent {
    pub fn new(index: Arc<dyn VectorIndex>, model: Arc<dyn CompletionProvider>) -> Self {
        Self { index, model, top_k: DEFAULT_TOP_K }
    }

    pub fn with_top_k(mut self, top_k: u64) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn invoke(&self, question: impl Into<String>) -> Result<ConversationState, AgentError> {
        let mut state = ConversationState::new(question);
        for stage in STAGES {
            state = self.run_stage(stage, state).await?;
        }
        Ok(state)
    }

    pub async fn run_stage(&self, stage: Stage, state: ConversationState) -> Result<ConversationState, AgentError> {
        log::debug!("Running {} stage", stage.name());
        match stage {
            Stage::Plan => plan(state),
            Stage::Retrieve => self.retrieve(state).await,
            Stage::Answer => self.answer(state).await,
            Stage::Reflect => self.reflect(state).await,
        }
    }

    pub async fn retrieve(&self, mut state: ConversationState) -> Result<ConversationState, AgentError> {
        Stage::Retrieve.check(&state)?;

        let retrieved = match state.routing {
            Some(RoutingDecision::NeedsRetrieval) => {
                let documents = self.index.search(state.input(), self.top_k).await
                    .map_err(|e| AgentError::RetrievalUnavailable(e.to_string()))?;
                log::debug!("Retrieved {} documents", documents.len());

                if documents.is_empty() {
                    RetrievedContext::Skipped
                } else {
                    let joined = documents
                        .into_iter()
                        .map(|doc| doc.text)
                        .collect::<Vec<_>>()
                        .join("\n\n");
                    RetrievedContext::Documents(joined)
                }
            }
            _ => RetrievedContext::Skipped,
        };

        state.retrieved = Some(retrieved);
        state.phase = Phase::Retrieved;
        Ok(state)
    }

    pub async fn answer(&self, mut state: ConversationState) -> Result<ConversationState, AgentError> {
        Stage::Answer.check(&state)?;

        let answer = match &state.retrieved {
            Some(RetrievedContext::Documents(context)) => {
                let prompt = prompt::grounded_prompt(context, state.input());
                let completion = self.model.complete(&prompt).await
                    .map_err(|e| AgentError::AnswerGenerationFailed(e.to_string()))?;
                completion.text.unwrap_or_else(|| {
                    log::warn!("Model returned no text for a grounded prompt, using fallback answer");
                    FALLBACK_ANSWER.to_string()
                })
            }
            _ => {
                let prompt = Prompt::Text(state.input().to_string());
                let completion = self.model.complete(&prompt).await
                    .map_err(|e| AgentError::AnswerGenerationFailed(e.to_string()))?;
                completion.text.ok_or_else(|| {
                    AgentError::AnswerGenerationFailed("model returned no text".to_string())
                })?
            }
        };

        state.answer = Some(answer);
        state.phase = Phase::Answered;
        Ok(state)
    }

    /// Never fails once the state is in order: a model error leaves the
    /// answer untouched and records [`Reflection::Unavailable`].
    pub async fn reflect(&self, mut state: ConversationState) -> Result<ConversationState, AgentError> {
        Stage::Reflect.check(&state)?;

        let prompt = prompt::reflection_prompt(state.input(), state.answer().unwrap_or_default());
        let reflection = match self.model.complete(&prompt).await {
            Ok(completion) => match completion.text {
                Some(text) => Reflection::Verdict(text),
                None => {
                    log::warn!("{}", AgentError::ReflectionFailed("model returned no text".to_string()));
                    Reflection::Unavailable
                }
            },
            Err(e) => {
                log::warn!("{}", AgentError::ReflectionFailed(e.to_string()));
                Reflection::Unavailable
            }
        };

        state.reflection = Some(reflection);
        state.phase = Phase::Reflected;
        Ok(state)
    }
}

pub fn plan(mut state: ConversationState) -> Result<ConversationState, AgentError> {
    Stage::Plan.check(&state)?;

    let routing = route_question(state.input());
    log::debug!("Routing decision: {}", routing.as_tag());

    state.routing = Some(routing);
    state.phase = Phase::Planned;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::traits::{Completion, Message};
    use crate::testing::{StubIndex, StubModel};
    use anyhow::anyhow;

    fn agent(index: StubIndex, model: StubModel) -> (MedicalAgent, Arc<StubIndex>, Arc<StubModel>) {
        let index = Arc::new(index);
        let model = Arc::new(model);
        (MedicalAgent::new(index.clone(), model.clone()), index, model)
    }

    fn at_phase(question: &str, routing: RoutingDecision, retrieved: Option<RetrievedContext>) -> ConversationState {
        let mut state = ConversationState::new(question);
        state.routing = Some(routing);
        state.phase = Phase::Planned;
        if let Some(retrieved) = retrieved {
            state.retrieved = Some(retrieved);
            state.phase = Phase::Retrieved;
        }
        state
    }

    #[test]
    fn every_keyword_routes_to_retrieval_in_any_case() {
        for keyword in CLINICAL_KEYWORDS {
            for question in [
                format!("tell me about {}", keyword),
                format!("{} FACTS", keyword.to_uppercase()),
                format!("Which {}s exist?", keyword),
            ] {
                assert_eq!(route_question(&question), RoutingDecision::NeedsRetrieval, "{}", question);
            }
        }
    }

    #[test]
    fn questions_without_keywords_skip_retrieval() {
        for question in ["What's the weather today?", "Tell me a joke", "", "How do vaccines work?"] {
            assert_eq!(route_question(question), RoutingDecision::NoRetrieval, "{}", question);
        }
    }

    #[test]
    fn plan_sets_tag_and_phase() {
        let state = plan(ConversationState::new("Best TREATMENT for flu?")).unwrap();
        assert_eq!(state.routing().map(|r| r.as_tag()), Some("needs retrieval"));
        assert_eq!(state.phase(), Phase::Planned);
    }

    #[tokio::test]
    async fn retrieve_joins_documents_in_ranked_order() {
        let (agent, index, _) = agent(StubIndex::with_texts(&["first", "second"]), StubModel::scripted());

        let state = agent
            .retrieve(at_phase("diabetes symptom", RoutingDecision::NeedsRetrieval, None))
            .await
            .unwrap();

        assert_eq!(state.retrieved().unwrap().as_text(), "first\n\nsecond");
        assert_eq!(index.queries(), vec![("diabetes symptom".to_string(), 3)]);
    }

    #[tokio::test]
    async fn retrieve_without_routing_need_yields_sentinel_and_skips_index() {
        let (agent, index, _) = agent(StubIndex::with_texts(&["unused"]), StubModel::scripted());

        for question in ["hello", "anything at all", ""] {
            let state = agent
                .retrieve(at_phase(question, RoutingDecision::NoRetrieval, None))
                .await
                .unwrap();
            assert_eq!(state.retrieved().unwrap().as_text(), "no retrieval performed");
        }
        assert!(index.queries().is_empty());
    }

    #[tokio::test]
    async fn empty_search_result_is_treated_as_skipped() {
        let (agent, _, _) = agent(StubIndex::with_texts(&[]), StubModel::scripted());
        let state = agent
            .retrieve(at_phase("drug", RoutingDecision::NeedsRetrieval, None))
            .await
            .unwrap();
        assert_eq!(state.retrieved(), Some(&RetrievedContext::Skipped));
    }

    #[tokio::test]
    async fn unreachable_index_is_retrieval_unavailable() {
        let (agent, _, _) = agent(StubIndex::unavailable(), StubModel::scripted());
        let err = agent.invoke("What medicine treats gout?").await.unwrap_err();
        assert!(matches!(err, AgentError::RetrievalUnavailable(_)));
    }

    #[tokio::test]
    async fn ungrounded_answer_sends_exactly_the_raw_question() {
        let (agent, _, model) = agent(StubIndex::with_texts(&[]), StubModel::scripted());
        let state = agent
            .answer(at_phase("What's up?", RoutingDecision::NoRetrieval, Some(RetrievedContext::Skipped)))
            .await
            .unwrap();

        assert_eq!(model.prompts(), vec![Prompt::Text("What's up?".to_string())]);
        assert_eq!(state.answer(), Some("Direct reply to: What's up?"));
    }

    #[tokio::test]
    async fn grounded_answer_without_text_falls_back() {
        let (agent, _, _) = agent(StubIndex::with_texts(&[]), StubModel::new(|_| Ok(Completion::empty())));
        let state = agent
            .answer(at_phase(
                "disease?",
                RoutingDecision::NeedsRetrieval,
                Some(RetrievedContext::Documents("doc".into())),
            ))
            .await
            .unwrap();
        assert_eq!(state.answer(), Some("Sorry, I couldn't find that information."));
    }

    #[tokio::test]
    async fn ungrounded_answer_without_text_is_a_failure() {
        let (agent, _, _) = agent(StubIndex::with_texts(&[]), StubModel::new(|_| Ok(Completion::empty())));
        let err = agent
            .answer(at_phase("hi", RoutingDecision::NoRetrieval, Some(RetrievedContext::Skipped)))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::AnswerGenerationFailed(_)));
    }

    #[tokio::test]
    async fn model_failure_during_answer_propagates() {
        let (agent, _, model) = agent(StubIndex::with_texts(&[]), StubModel::new(|_| Err(anyhow!("429 rate limited"))));
        let err = agent.invoke("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::AnswerGenerationFailed(ref msg) if msg.contains("429")));
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn reflection_failure_keeps_the_answer() {
        let model = StubModel::new(|prompt| match prompt {
            Prompt::Text(text) if text.starts_with("Question: ") => Err(anyhow!("timeout")),
            _ => Ok(Completion::text("Stay hydrated.")),
        });
        let (agent, _, _) = agent(StubIndex::with_texts(&[]), model);

        let state = agent.invoke("Any tips for hot days?").await.unwrap();
        assert_eq!(state.answer(), Some("Stay hydrated."));
        assert_eq!(state.reflection(), Some(&Reflection::Unavailable));
        assert_eq!(state.phase(), Phase::Reflected);
    }

    #[tokio::test]
    async fn stages_refuse_to_run_out_of_order() {
        let (agent, _, model) = agent(StubIndex::with_texts(&[]), StubModel::scripted());

        let err = agent.answer(ConversationState::new("q")).await.unwrap_err();
        assert!(matches!(err, AgentError::StageOrder { stage: "answer", phase: Phase::Created }));

        let planned = plan(ConversationState::new("q")).unwrap();
        assert!(plan(planned).is_err());
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn diabetes_question_is_answered_from_retrieved_documents() {
        let docs = ["Diabetes raises blood sugar.", "Symptoms include thirst.", "Fatigue is common."];
        let (agent, index, model) = agent(StubIndex::with_texts(&docs), StubModel::scripted());

        let state = agent.invoke("What are the symptoms of diabetes?").await.unwrap();

        assert_eq!(state.routing(), Some(RoutingDecision::NeedsRetrieval));
        assert_eq!(index.queries().len(), 1);
        assert_eq!(state.retrieved().unwrap().as_text(), docs.join("\n\n"));

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        let Prompt::Messages(messages) = &prompts[0] else {
            panic!("grounded answer should use structured messages");
        };
        assert!(docs.iter().all(|doc| messages[0].content.contains(doc)));
        assert_eq!(messages[1], Message::user("What are the symptoms of diabetes?"));

        assert_eq!(state.answer(), Some("Common symptoms include thirst and fatigue."));
        let reflection = state.reflection().and_then(|r| r.text()).unwrap();
        assert!(!reflection.is_empty());
        assert_eq!(state.reflection().unwrap().verdict(), Some(true));
    }

    #[tokio::test]
    async fn weather_question_goes_straight_to_the_model() {
        let (agent, index, model) = agent(StubIndex::with_texts(&["unused"]), StubModel::scripted());

        let state = agent.invoke("What's the weather today?").await.unwrap();

        assert_eq!(state.routing(), Some(RoutingDecision::NoRetrieval));
        assert_eq!(state.retrieved().unwrap().as_text(), NO_RETRIEVAL_SENTINEL);
        assert!(index.queries().is_empty());

        let prompts = model.prompts();
        assert_eq!(prompts[0], Prompt::Text("What's the weather today?".to_string()));
        assert!(matches!(&prompts[1], Prompt::Text(text) if text.starts_with("Question: What's the weather today?")));
        assert!(state.reflection().and_then(|r| r.text()).is_some());
    }

    #[tokio::test]
    async fn repeated_runs_are_identical_with_deterministic_collaborators() {
        let (agent, _, _) = agent(StubIndex::with_texts(&["a", "b", "c"]), StubModel::scripted());

        let first = agent.invoke("drug interactions?").await.unwrap();
        let second = agent.invoke("drug interactions?").await.unwrap();

        assert_eq!(first.answer(), second.answer());
        assert_eq!(first.reflection(), second.reflection());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn top_k_is_forwarded_to_the_index() {
        let index = Arc::new(StubIndex::with_texts(&["a", "b", "c", "d", "e"]));
        let agent = MedicalAgent::new(index.clone(), Arc::new(StubModel::scripted())).with_top_k(5);

        let state = agent.invoke("disease list").await.unwrap();
        assert_eq!(index.queries()[0].1, 5);
        assert_eq!(state.retrieved().unwrap().as_text(), "a\n\nb\n\nc\n\nd\n\ne");
    }
}

pub const NO_RETRIEVAL_SENTINEL: &str = "no retrieval performed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Planned,
    Retrieved,
    Answered,
    Reflected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    NeedsRetrieval,
    NoRetrieval,
}

impl RoutingDecision {
    pub fn as_tag(&self) -> &'static str {
        match self {
            RoutingDecision::NeedsRetrieval => "needs retrieval",
            RoutingDecision::NoRetrieval => "no retrieval",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievedContext {
    Documents(String),
    Skipped,
}

impl RetrievedContext {
    pub fn as_text(&self) -> &str {
        match self {
            RetrievedContext::Documents(text) => text,
            RetrievedContext::Skipped => NO_RETRIEVAL_SENTINEL,
        }
    }

    pub fn is_grounded(&self) -> bool {
        matches!(self, RetrievedContext::Documents(_))
    }
}

/// Advisory self-critique of an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reflection {
    Verdict(String),
    Unavailable,
}

impl Reflection {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reflection::Verdict(text) => Some(text),
            Reflection::Unavailable => None,
        }
    }

    /// Reads the leading Yes/No the critique prompt asks for.
    pub fn verdict(&self) -> Option<bool> {
        let text = self.text()?;
        let first_word: String = text
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .chars()
            .take_while(|c| c.is_alphabetic())
            .collect::<String>()
            .to_lowercase();

        match first_word.as_str() {
            "yes" => Some(true),
            "no" => Some(false),
            _ => None,
        }
    }
}

/// Per-question working state threaded through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    input: String,
    pub(crate) phase: Phase,
    pub(crate) routing: Option<RoutingDecision>,
    pub(crate) retrieved: Option<RetrievedContext>,
    pub(crate) answer: Option<String>,
    pub(crate) reflection: Option<Reflection>,
}

impl ConversationState {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            phase: Phase::Created,
            routing: None,
            retrieved: None,
            answer: None,
            reflection: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn routing(&self) -> Option<RoutingDecision> {
        self.routing
    }

    pub fn retrieved(&self) -> Option<&RetrievedContext> {
        self.retrieved.as_ref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    pub fn reflection(&self) -> Option<&Reflection> {
        self.reflection.as_ref()
    }
}

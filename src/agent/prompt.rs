use crate::providers::traits::{Message, Prompt};

pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't find that information.";

pub const SYSTEM_PROMPT: &str = "You are a medical assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, say that you don't know. \
Use three sentences maximum and keep the answer concise. \
Do not give a diagnosis; suggest consulting a healthcare professional when appropriate.";

/// System persona plus retrieved passages, followed by the user's question.
pub fn grounded_prompt(context: &str, question: &str) -> Prompt {
    Prompt::Messages(vec![
        Message::system(format!("{}\n\n{}", SYSTEM_PROMPT, context)),
        Message::user(question),
    ])
}

pub fn reflection_prompt(question: &str, answer: &str) -> Prompt {
    Prompt::Text(format!(
        "Question: {}\nAnswer: {}\n\n\
         Does the answer correctly and directly address the question? \
         Respond with 'Yes' or 'No' and a short reason.",
        question, answer
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::traits::Role;

    #[test]
    fn grounded_prompt_puts_context_in_system_turn() {
        let Prompt::Messages(messages) = grounded_prompt("doc one\n\ndoc two", "What is flu?") else {
            panic!("expected structured prompt");
        };
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.starts_with(SYSTEM_PROMPT));
        assert!(messages[0].content.ends_with("doc one\n\ndoc two"));
        assert_eq!(messages[1], Message::user("What is flu?"));
    }

    #[test]
    fn reflection_prompt_quotes_question_and_answer() {
        let Prompt::Text(text) = reflection_prompt("Q?", "A.") else {
            panic!("expected raw prompt");
        };
        assert!(text.starts_with("Question: Q?\nAnswer: A.\n\n"));
        assert!(text.ends_with("Respond with 'Yes' or 'No' and a short reason."));
    }
}

use crate::config::ProviderConfig;
use crate::providers::traits::{Completion, CompletionProvider, Prompt, Role};
use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::time::Duration;

#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    chat_model: String,
    temperature: f32,
}

impl OpenAIProvider {
    pub fn new(api_key: String, config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = Client::with_config(openai_config(api_key, config))
            .with_http_client(reqwest::Client::builder().timeout(timeout).build()?);

        Ok(Self {
            client,
            chat_model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

pub(crate) fn openai_config(api_key: String, config: &ProviderConfig) -> OpenAIConfig {
    OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(config.api_url.trim_end_matches('/'))
}

fn to_request_messages(prompt: &Prompt) -> Result<Vec<ChatCompletionRequestMessage>> {
    let messages = match prompt {
        Prompt::Text(text) => vec![ChatCompletionRequestUserMessageArgs::default()
            .content(text.as_str())
            .build()?
            .into()],
        Prompt::Messages(messages) => messages
            .iter()
            .map(|message| -> Result<ChatCompletionRequestMessage> {
                Ok(match message.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(message.content.as_str())
                        .build()?
                        .into(),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(message.content.as_str())
                        .build()?
                        .into(),
                })
            })
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(messages)
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<Completion> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .temperature(self.temperature)
            .messages(to_request_messages(prompt)?)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty());

        Ok(Completion { text })
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

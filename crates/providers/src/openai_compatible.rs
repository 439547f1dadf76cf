use crate::schema::{parse_groups, response_schema, user_message, SYSTEM_PROMPT};
use crate::traits::*;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tab_sorter_core::GroupProposal;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                ProviderError::Transport(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(
        &self,
        tabs: &[TabSummary],
        config: &ModelConfig,
    ) -> Result<serde_json::Value, ProviderError> {
        Ok(json!({
            "model": config.model_id,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_message(tabs)? },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "tab_groups",
                    "strict": true,
                    "schema": response_schema(),
                }
            }
        }))
    }
}

#[async_trait]
impl ClassificationProvider for OpenAICompatibleProvider {
    async fn classify(
        &self,
        tabs: &[TabSummary],
        config: &ModelConfig,
    ) -> Result<Vec<GroupProposal>, ProviderError> {
        if !config.has_credential() {
            return Err(ProviderError::Configuration);
        }

        let body = self.request_body(tabs, config)?;
        tracing::debug!(
            "Requesting classification of {} tabs from {}",
            tabs.len(),
            config.model_id
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let content = json["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| ProviderError::Schema("No message content in response".to_string()))?;

        parse_groups(content)
    }

    fn name(&self) -> &str {
        "OpenAI Compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider =
            OpenAICompatibleProvider::new("https://api.openai.com/v1/".to_string()).unwrap();
        assert_eq!(provider.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let provider =
            OpenAICompatibleProvider::new("http://localhost:8080".to_string()).unwrap();
        let tabs = vec![TabSummary {
            id: 3,
            title: "Crates".to_string(),
            url: "https://crates.io".to_string(),
        }];
        let body = provider
            .request_body(&tabs, &ModelConfig::new("key", "gpt-4o-mini"))
            .unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("crates.io"));
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[tokio::test]
    async fn test_missing_key_rejected_before_request() {
        // Unroutable address: reaching the network would surface a transport error.
        let provider =
            OpenAICompatibleProvider::new("http://127.0.0.1:9".to_string()).unwrap();
        let err = provider
            .classify(&[], &ModelConfig::new("   ", "gpt-4o-mini"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration));
    }
}

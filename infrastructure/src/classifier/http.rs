//! HTTP intent classifier.
//!
//! POSTs the utterance and a compact view of the catalog to a classification
//! endpoint and expects a [`ModelIntent`] back:
//!
//! ```text
//! → {"utterance": "..", "tools": [{"name", "description", "risk", "parameters": [..]}]}
//! ← {"steps": [{"tool": "install_package", "params": {..}}], "confidence": 0.9}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use steward_application::{ClassifierError, IntentClassifier, ModelIntent};
use steward_domain::{ParamKind, RiskLevel, ToolCatalog};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    utterance: &'a str,
    tools: Vec<ToolSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct ToolSummary<'a> {
    name: &'a str,
    description: &'a str,
    risk: RiskLevel,
    parameters: Vec<ParamSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct ParamSummary<'a> {
    name: &'a str,
    description: &'a str,
    kind: ParamKind,
    required: bool,
    #[serde(skip_serializing_if = "no_values")]
    allowed: &'a [String],
}

fn no_values(values: &&[String]) -> bool {
    values.is_empty()
}

fn request_body<'a>(utterance: &'a str, catalog: &'a ToolCatalog) -> ClassifyRequest<'a> {
    ClassifyRequest {
        utterance,
        tools: catalog
            .iter()
            .map(|(_, d)| ToolSummary {
                name: d.name.as_str(),
                description: &d.description,
                risk: d.risk_hint,
                parameters: d
                    .parameters
                    .iter()
                    .map(|p| ParamSummary {
                        name: &p.name,
                        description: &p.description,
                        kind: p.kind,
                        required: p.required,
                        allowed: &p.allowed,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Classifier backed by a remote model endpoint
#[derive(Debug, Clone)]
pub struct HttpIntentClassifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpIntentClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn map_error(e: reqwest::Error) -> ClassifierError {
    if e.is_timeout() {
        ClassifierError::Timeout
    } else if e.is_connect() {
        ClassifierError::Unavailable(e.to_string())
    } else {
        ClassifierError::RequestFailed(e.to_string())
    }
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(
        &self,
        utterance: &str,
        catalog: &ToolCatalog,
    ) -> Result<ModelIntent, ClassifierError> {
        debug!(endpoint = %self.endpoint, tools = catalog.len(), "Classifying utterance");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request_body(utterance, catalog))
            .send()
            .await
            .map_err(map_error)?;

        if !response.status().is_success() {
            return Err(ClassifierError::RequestFailed(format!(
                "classifier returned {}",
                response.status()
            )));
        }

        let intent: ModelIntent = response
            .json()
            .await
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;
        if !(0.0..=1.0).contains(&intent.confidence) {
            return Err(ClassifierError::Malformed(format!(
                "confidence {} outside [0, 1]",
                intent.confidence
            )));
        }
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_domain::{ToolDescriptor, ToolName, ToolParameter};

    #[test]
    fn test_request_body_summarizes_catalog() {
        let catalog = ToolCatalog::new().with(
            ToolDescriptor::new(
                ToolName::new("manage_service").unwrap(),
                "Manage a service",
                RiskLevel::Moderate,
            )
            .with_parameter(ToolParameter::new("service", "Unit name", true))
            .with_parameter(
                ToolParameter::new("action", "Action", true).with_allowed(["start", "stop"]),
            ),
        );

        let body = serde_json::to_value(request_body("restart nginx", &catalog)).unwrap();
        assert_eq!(body["utterance"], "restart nginx");
        assert_eq!(body["tools"][0]["name"], "manage_service");
        assert_eq!(body["tools"][0]["risk"], "moderate");
        assert!(body["tools"][0]["parameters"][0].get("allowed").is_none());
        assert_eq!(body["tools"][0]["parameters"][1]["allowed"][1], "stop");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let classifier =
            HttpIntentClassifier::new("http://127.0.0.1:9/classify", Duration::from_secs(2))
                .unwrap();
        let result = classifier.classify("install nginx", &ToolCatalog::new()).await;
        assert!(result.is_err());
    }
}

//! Conversational Language Understanding client
//!
//! Talks to an Azure CLU deployment over its `:analyze-conversations` REST
//! endpoint and maps the prediction into [`Recognition`]. Any transport or
//! decoding failure is logged and collapsed to [`Recognition::none`].

use super::{IntentRecognizer, Recognition, RecognizedEntities};
use crate::error::{RecognizerError, RecognizerResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const API_VERSION: &str = "2023-04-01";

/// Connection settings for a CLU deployment
#[derive(Debug, Clone)]
pub struct CluConfig {
    /// Service endpoint, e.g. `https://my-resource.cognitiveservices.azure.com`
    pub endpoint: String,
    /// Subscription key
    pub api_key: String,
    /// CLU project name
    pub project_name: String,
    /// Deployment name within the project
    pub deployment_name: String,
}

/// Recognizer backed by a remote CLU deployment
#[derive(Debug, Clone)]
pub struct CluRecognizer {
    http: reqwest::Client,
    config: CluConfig,
}

impl CluRecognizer {
    pub fn new(config: CluConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn analyze(&self, utterance: &str) -> RecognizerResult<Recognition> {
        let url = format!(
            "{}/language/:analyze-conversations?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            API_VERSION
        );

        let body = json!({
            "kind": "Conversation",
            "analysisInput": {
                "conversationItem": {
                    "id": "1",
                    "participantId": "user",
                    "text": utterance,
                }
            },
            "parameters": {
                "projectName": self.config.project_name,
                "deploymentName": self.config.deployment_name,
                "stringIndexType": "TextElement_V8",
            }
        });

        let response = self
            .http
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognizerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let analysis: AnalyzeResponse = response
            .json()
            .await
            .map_err(|err| RecognizerError::Malformed(err.to_string()))?;

        Ok(analysis.into_recognition(utterance))
    }
}

#[async_trait]
impl IntentRecognizer for CluRecognizer {
    async fn recognize(&self, utterance: &str) -> Recognition {
        match self.analyze(utterance).await {
            Ok(recognition) => {
                debug!(
                    intent = ?recognition.top_intent(),
                    "clu recognition complete"
                );
                recognition
            }
            Err(err) => {
                warn!(error = %err, "clu recognition failed, treating as None intent");
                Recognition::none(utterance)
            }
        }
    }
}

// Wire shapes for the slice of the CLU response we consume.

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    result: AnalyzeResult,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    prediction: Prediction,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    intents: Vec<PredictedIntent>,
    #[serde(default)]
    entities: Vec<PredictedEntity>,
}

#[derive(Debug, Deserialize)]
struct PredictedIntent {
    category: String,
    #[serde(rename = "confidenceScore")]
    confidence_score: f32,
}

#[derive(Debug, Deserialize)]
struct PredictedEntity {
    category: String,
    text: String,
    #[serde(default, rename = "resolutions")]
    resolutions: Vec<Resolution>,
}

#[derive(Debug, Deserialize)]
struct Resolution {
    #[serde(default)]
    timex: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

impl AnalyzeResponse {
    fn into_recognition(self, utterance: &str) -> Recognition {
        let prediction = self.result.prediction;

        let intents = prediction
            .intents
            .into_iter()
            .map(|intent| (intent.category, intent.confidence_score))
            .collect();

        let mut entities = RecognizedEntities::default();
        for entity in prediction.entities {
            match entity.category.as_str() {
                "fromCity" | "From" => {
                    entities.from_city.get_or_insert(entity.text);
                }
                "toCity" | "To" => {
                    entities.to_city.get_or_insert(entity.text);
                }
                "datetime" | "datetimeV2" => {
                    if entities.date.is_none() {
                        entities.date = resolve_date(&entity);
                    }
                }
                "travelers" | "number" => {
                    if entities.travelers.is_none() {
                        entities.travelers = resolve_number(&entity);
                    }
                }
                "flightClass" | "class" => {
                    entities.cabin_class.get_or_insert(entity.text);
                }
                _ => {}
            }
        }

        Recognition {
            text: utterance.to_string(),
            intents,
            entities,
        }
    }
}

/// Pull a plain date out of a datetime entity, preferring the timex
/// resolution ("2025-07-15T09" becomes "2025-07-15") and falling back to the
/// raw entity text.
fn resolve_date(entity: &PredictedEntity) -> Option<String> {
    for resolution in &entity.resolutions {
        if let Some(timex) = &resolution.timex {
            let date = timex.split('T').next().unwrap_or(timex);
            if !date.is_empty() {
                return Some(date.to_string());
            }
        }
    }
    Some(entity.text.clone())
}

fn resolve_number(entity: &PredictedEntity) -> Option<u32> {
    for resolution in &entity.resolutions {
        match &resolution.value {
            Some(serde_json::Value::Number(n)) => {
                if let Some(n) = n.as_u64() {
                    return u32::try_from(n).ok();
                }
            }
            Some(serde_json::Value::String(s)) => {
                if let Ok(n) = s.parse() {
                    return Some(n);
                }
            }
            _ => {}
        }
    }
    entity.text.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::Intent;

    fn sample_response() -> AnalyzeResponse {
        serde_json::from_value(json!({
            "result": {
                "query": "book a business class flight from delhi to mumbai on 2025-07-15 for 2 people",
                "prediction": {
                    "topIntent": "BookFlight",
                    "intents": [
                        { "category": "BookFlight", "confidenceScore": 0.97 },
                        { "category": "SearchFlights", "confidenceScore": 0.34 }
                    ],
                    "entities": [
                        { "category": "fromCity", "text": "delhi" },
                        { "category": "toCity", "text": "mumbai" },
                        {
                            "category": "datetime",
                            "text": "2025-07-15",
                            "resolutions": [{ "timex": "2025-07-15T00", "value": "2025-07-15" }]
                        },
                        {
                            "category": "number",
                            "text": "2",
                            "resolutions": [{ "value": 2 }]
                        },
                        { "category": "flightClass", "text": "business class" }
                    ]
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_response_mapping() {
        let recognition = sample_response().into_recognition("book a flight");

        assert_eq!(recognition.top_intent(), Intent::BookFlight);
        assert_eq!(recognition.entities.from_city.as_deref(), Some("delhi"));
        assert_eq!(recognition.entities.to_city.as_deref(), Some("mumbai"));
        assert_eq!(recognition.entities.date.as_deref(), Some("2025-07-15"));
        assert_eq!(recognition.entities.travelers, Some(2));
        assert_eq!(
            recognition.entities.cabin_class.as_deref(),
            Some("business class")
        );
    }

    #[test]
    fn test_timex_trimmed_to_date() {
        let entity = PredictedEntity {
            category: "datetime".to_string(),
            text: "next tuesday".to_string(),
            resolutions: vec![Resolution {
                timex: Some("2025-07-15T09:00".to_string()),
                value: None,
            }],
        };
        assert_eq!(resolve_date(&entity).as_deref(), Some("2025-07-15"));
    }

    #[test]
    fn test_number_from_text_fallback() {
        let entity = PredictedEntity {
            category: "number".to_string(),
            text: "3".to_string(),
            resolutions: vec![],
        };
        assert_eq!(resolve_number(&entity), Some(3));
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_none() {
        let recognizer = CluRecognizer::new(CluConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            api_key: "key".to_string(),
            project_name: "flightdesk".to_string(),
            deployment_name: "production".to_string(),
        });
        let recognition = recognizer.recognize("book a flight").await;
        assert_eq!(recognition.top_intent(), Intent::None);
    }
}

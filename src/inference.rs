use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::InferenceConfig;

/// Food recognition: image bytes in, ordered label list out. An empty list is
/// a valid answer ("nothing recognized"), not an error.
#[async_trait]
pub trait FoodClassifier: Send + Sync {
    async fn classify(&self, image: &Bytes) -> anyhow::Result<Vec<String>>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct MacroPrediction {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: Option<f64>,
}

/// Macronutrient prediction: image bytes in, grams (and maybe calories) out.
#[async_trait]
pub trait MacroPredictor: Send + Sync {
    async fn predict(&self, image: &Bytes) -> anyhow::Result<MacroPrediction>;
}

// Vendor's "everything went fine" status code.
const CLARIFAI_SUCCESS: i64 = 10_000;

#[derive(Debug, Deserialize)]
struct ClarifaiStatus {
    code: i64,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ClarifaiConcept {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ClarifaiData {
    #[serde(default)]
    concepts: Vec<ClarifaiConcept>,
}

#[derive(Debug, Deserialize)]
struct ClarifaiOutput {
    data: ClarifaiData,
}

#[derive(Debug, Deserialize)]
struct ClarifaiResponse {
    status: ClarifaiStatus,
    #[serde(default)]
    outputs: Vec<ClarifaiOutput>,
}

#[derive(Clone)]
pub struct ClarifaiClassifier {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl ClarifaiClassifier {
    pub fn new(http: Client, config: &InferenceConfig) -> Self {
        Self {
            http,
            endpoint: config.classifier_url.clone(),
            api_key: config.classifier_key.clone(),
        }
    }
}

#[async_trait]
impl FoodClassifier for ClarifaiClassifier {
    async fn classify(&self, image: &Bytes) -> anyhow::Result<Vec<String>> {
        let body = json!({
            "inputs": [{ "data": { "image": { "base64": BASE64.encode(image) } } }]
        });

        let response: ClarifaiResponse = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("classifier request")?
            .error_for_status()
            .context("classifier status")?
            .json()
            .await
            .context("classifier response body")?;

        anyhow::ensure!(
            response.status.code == CLARIFAI_SUCCESS,
            "classifier API error: {}",
            response.status.description
        );

        let foods: Vec<String> = response
            .outputs
            .into_iter()
            .flat_map(|o| o.data.concepts)
            .map(|c| c.name)
            .collect();
        debug!(count = foods.len(), "foods identified");
        Ok(foods)
    }
}

#[derive(Clone)]
pub struct HttpMacroPredictor {
    http: Client,
    endpoint: String,
}

impl HttpMacroPredictor {
    pub fn new(http: Client, config: &InferenceConfig) -> Self {
        Self {
            http,
            endpoint: config.predictor_url.clone(),
        }
    }
}

#[async_trait]
impl MacroPredictor for HttpMacroPredictor {
    async fn predict(&self, image: &Bytes) -> anyhow::Result<MacroPrediction> {
        let prediction = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "image": BASE64.encode(image) }))
            .send()
            .await
            .context("predictor request")?
            .error_for_status()
            .context("predictor status")?
            .json::<MacroPrediction>()
            .await
            .context("predictor response body")?;
        Ok(prediction)
    }
}

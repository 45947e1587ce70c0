//! Immutable application context shared by every request.

use std::sync::Arc;

use axum::body::Bytes;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::artifacts::ensure_artifact;
use crate::classifier::{ClassIndex, Diagnosis, DiseaseClassifier};
use crate::config::Config;
use crate::conversation::ConversationContext;
use crate::crops::CropRecommender;
use crate::error::{Error, Result};
use crate::fallback;
use crate::gemini::GeminiClient;
use crate::preprocess;
use crate::prompts;
use crate::retry::Outcome;

const UNREADABLE_IMAGE: &str = "I couldn't read that image. Please upload a clear JPEG or PNG \
                                photo of a single plant leaf.";
const ANALYSIS_FAILED: &str = "I'm sorry, I ran into a problem while analysing that image. \
                               Please try again in a moment.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease_name: Option<String>,
    /// Only set on analysis turns that identified a disease; the page sends
    /// it back as `context_confidence`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ChatResponse {
    pub(crate) fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            image: None,
            disease_name: None,
            confidence: None,
        }
    }
}

/// A follow-up chat turn, as submitted by the page.
#[derive(Debug, Clone, Default)]
pub struct FollowUp {
    pub message: String,
    pub context_disease: Option<String>,
    pub context_confidence: Option<f32>,
    pub district: Option<String>,
}

pub struct AppContext {
    classifier: DiseaseClassifier,
    gemini: GeminiClient,
    crops: Option<CropRecommender>,
}

pub type SharedContext = Arc<AppContext>;

impl AppContext {
    pub fn new(
        classifier: DiseaseClassifier,
        gemini: GeminiClient,
        crops: Option<CropRecommender>,
    ) -> Self {
        Self {
            classifier,
            gemini,
            crops,
        }
    }

    /// Loads every startup artifact. Anything missing degrades the service
    /// instead of stopping it.
    pub async fn load(config: &Config) -> Result<Self> {
        let gemini = GeminiClient::new(config.llm_settings())?;
        let classifier = load_classifier(config).await;

        let crops = match CropRecommender::load(&config.crop_data_path) {
            Ok(crops) => Some(crops),
            Err(e) => {
                warn!(
                    path = %config.crop_data_path.display(),
                    error = %e,
                    "crop recommendations disabled"
                );
                None
            }
        };

        Ok(Self::new(classifier, gemini, crops))
    }

    pub fn model_loaded(&self) -> bool {
        self.classifier.is_loaded()
    }

    pub fn llm_configured(&self) -> bool {
        self.gemini.is_configured()
    }

    pub fn recommend_crop(&self, district: &str) -> Option<String> {
        self.crops
            .as_ref()
            .and_then(|crops| crops.recommend(district))
            .map(str::to_string)
    }

    /// Handles an upload: diagnose, echo the image, and phrase the result.
    pub async fn analyze(self: &Arc<Self>, image_data: Bytes) -> ChatResponse {
        let ctx = Arc::clone(self);
        let work = tokio::task::spawn_blocking(move || -> Result<(Diagnosis, String)> {
            let image = preprocess::decode(&image_data)?;
            let diagnosis = ctx.classifier.diagnose(&image)?;
            let encoded = preprocess::to_base64_png(&image)?;
            Ok((diagnosis, encoded))
        })
        .await;

        let (diagnosis, encoded) = match work {
            Ok(Ok(done)) => done,
            Ok(Err(Error::Image(e))) => {
                warn!(error = %e, "uploaded file is not a readable image");
                return ChatResponse::text(UNREADABLE_IMAGE);
            }
            Ok(Err(e)) => {
                error!(error = %e, "image analysis failed");
                return ChatResponse::text(ANALYSIS_FAILED);
            }
            Err(e) => {
                error!(error = %e, "image analysis task panicked");
                return ChatResponse::text(ANALYSIS_FAILED);
            }
        };

        info!(label = %diagnosis.label, confidence = diagnosis.confidence, "diagnosis");

        let prompt = prompts::analysis_prompt(&diagnosis);
        let response = match self.gemini.generate(&prompt).await {
            Outcome::Completed(text) => text,
            Outcome::Unavailable => fallback::diagnosis_summary(&diagnosis),
        };

        let confidence = diagnosis
            .is_identified()
            .then_some(diagnosis.confidence);
        ChatResponse {
            response,
            image: Some(encoded),
            disease_name: Some(diagnosis.label),
            confidence,
        }
    }

    /// Handles a text turn, optionally about an earlier diagnosis.
    pub async fn follow_up(&self, turn: FollowUp) -> ChatResponse {
        let context = turn.context_disease.as_ref().map(|disease| {
            let recommended_crop = turn
                .district
                .as_deref()
                .and_then(|district| self.recommend_crop(district));
            ConversationContext {
                disease_name: disease.clone(),
                confidence: turn.context_confidence,
                district: turn.district.clone(),
                recommended_crop,
            }
        });

        let prompt = match &context {
            Some(ctx) if ctx.district.is_some() => prompts::advisor_prompt(ctx, &turn.message),
            _ => prompts::follow_up_prompt(&turn.message, turn.context_disease.as_deref()),
        };

        let response = match self.gemini.generate(&prompt).await {
            Outcome::Completed(text) => text,
            Outcome::Unavailable => {
                let reply = fallback::respond(&turn.message, context.as_ref());
                info!(category = ?reply.category, "answered with canned reply");
                reply.text
            }
        };

        ChatResponse {
            response,
            image: None,
            disease_name: turn.context_disease,
            confidence: None,
        }
    }
}

async fn load_classifier(config: &Config) -> DiseaseClassifier {
    let client = reqwest::Client::new();
    let token = config.artifact_token.as_deref();

    for (path, url) in [
        (&config.model_path, config.model_url.as_deref()),
        (&config.class_indices_path, config.class_indices_url.as_deref()),
    ] {
        if let Err(e) = ensure_artifact(&client, path, url, token).await {
            error!(path = %path.display(), error = %e, "inference disabled");
            return DiseaseClassifier::disabled();
        }
    }

    let classes = match ClassIndex::load(&config.class_indices_path) {
        Ok(classes) => classes,
        Err(e) => {
            error!(error = %e, "could not read class index, inference disabled");
            return DiseaseClassifier::disabled();
        }
    };

    match open_model(config) {
        Ok(model) => DiseaseClassifier::new(model, classes, config.image_size),
        Err(e) => {
            error!(error = %e, "could not load disease model, inference disabled");
            DiseaseClassifier::disabled()
        }
    }
}

#[cfg(feature = "tensorflow")]
fn open_model(config: &Config) -> Result<Box<dyn crate::classifier::Classifier>> {
    let model = crate::model::TfModel::load(&config.model_path, &config.input_op, &config.output_op)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "tensorflow"))]
fn open_model(_config: &Config) -> Result<Box<dyn crate::classifier::Classifier>> {
    Err(Error::Model(
        "built without the `tensorflow` feature".into(),
    ))
}

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::gemini::LlmSettings;
use crate::retry::RetryPolicy;

/// Agri-Sage plant disease assistant
#[derive(Parser, Debug, Clone)]
#[command(name = "agri-sage")]
#[command(version)]
#[command(about = "Diagnoses plant-leaf diseases and chats about treatment")]
pub struct Config {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Maximum request body size in megabytes
    #[arg(long, env = "BODY_LIMIT_MB", default_value_t = 16)]
    pub body_limit_mb: usize,

    /// Frozen TensorFlow graph of the disease classifier
    #[arg(long, env = "MODEL_PATH", default_value = "./model/plant_disease_model.pb")]
    pub model_path: PathBuf,

    /// JSON file mapping class labels to output indices
    #[arg(long, env = "CLASS_INDICES_PATH", default_value = "./model/class_indices.json")]
    pub class_indices_path: PathBuf,

    /// Where to fetch the model from when it is missing
    #[arg(long, env = "MODEL_URL")]
    pub model_url: Option<String>,

    /// Where to fetch the class index from when it is missing
    #[arg(long, env = "CLASS_INDICES_URL")]
    pub class_indices_url: Option<String>,

    /// Bearer token sent with artifact downloads
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub artifact_token: Option<String>,

    #[arg(long, env = "MODEL_INPUT_OP", default_value = "x")]
    pub input_op: String,

    #[arg(long, env = "MODEL_OUTPUT_OP", default_value = "Identity")]
    pub output_op: String,

    /// Square input resolution expected by the classifier
    #[arg(
        long,
        env = "IMAGE_SIZE",
        default_value_t = 224,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub image_size: u32,

    /// CSV of district,recommended_crop rows
    #[arg(
        long,
        env = "CROP_DATA_PATH",
        default_value = "./model/crop_recommendation_data.csv"
    )]
    pub crop_data_path: PathBuf,

    /// Hosted LLM key; without it the assistant runs in fallback mode
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,

    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub gemini_base_url: String,

    /// Per-call timeout for the LLM endpoint
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 15)]
    pub llm_timeout_secs: u64,

    #[arg(long, env = "LLM_MAX_ATTEMPTS", default_value_t = 2)]
    pub llm_max_attempts: u32,

    #[arg(long, env = "LLM_INITIAL_DELAY_MS", default_value_t = 1000)]
    pub llm_initial_delay_ms: u64,
}

impl Config {
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.llm_max_attempts.max(1),
            initial_delay: Duration::from_millis(self.llm_initial_delay_ms),
        }
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self
                .gemini_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
            retry: self.retry_policy(),
        }
    }
}

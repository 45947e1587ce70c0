/// What the client carries forward from an earlier analysis turn.
/// Nothing is stored server-side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationContext {
    pub disease_name: String,
    pub confidence: Option<f32>,
    pub district: Option<String>,
    pub recommended_crop: Option<String>,
}

impl ConversationContext {
    pub fn new(disease_name: impl Into<String>) -> Self {
        Self {
            disease_name: disease_name.into(),
            ..Self::default()
        }
    }

    pub fn confidence_text(&self) -> String {
        self.confidence
            .map(|c| format!("{:.1}%", c * 100.0))
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn district_text(&self) -> &str {
        self.district.as_deref().unwrap_or("Unknown")
    }

    pub fn crop_text(&self) -> &str {
        self.recommended_crop.as_deref().unwrap_or("Unknown")
    }
}

use crate::classifier::Diagnosis;
use crate::conversation::ConversationContext;

const PERSONA: &str = "You are Agri-Sage, a friendly and concise AI agricultural advisor for Nepal.";

/// Follow-up words that ask for a treatment plan rather than conversation.
const TREATMENT_KEYWORDS: &[&str] = &["treat", "help", "fix", "cure", "plan", "advice"];

pub fn analysis_prompt(diagnosis: &Diagnosis) -> String {
    format!(
        "You are Agri-Sage, a friendly AI agricultural advisor. Your local model diagnosed an \
         image with: '{}' ({} confidence). Present this result briefly. Then ask if the user \
         wants treatment advice.",
        diagnosis.label,
        diagnosis.confidence_percent()
    )
}

pub fn follow_up_prompt(message: &str, context_disease: Option<&str>) -> String {
    let lowered = message.to_lowercase();
    match context_disease {
        Some(disease) if TREATMENT_KEYWORDS.iter().any(|k| lowered.contains(k)) => format!(
            "{PERSONA} A user was diagnosed with '{disease}' and is asking for help: \
             \"{message}\". Provide a brief, bullet-point summary of treatment options."
        ),
        Some(disease) => format!(
            "{PERSONA} You were discussing '{disease}'. The user now says: \"{message}\". \
             Respond helpfully and concisely."
        ),
        None => format!(
            "{PERSONA} A user just said: '{message}'. Respond in a brief, conversational manner."
        ),
    }
}

/// Full advisory prompt used once the user has told us where they farm.
pub fn advisor_prompt(context: &ConversationContext, message: &str) -> String {
    format!(
        "You are Agri-Sage AI, a specialized agricultural assistant for Nepal. You have analyzed \
a plant leaf image and detected the following:

**Plant Analysis Results:**
- Disease Detected: {disease}
- Confidence Level: {confidence}
- Location: {district}, Nepal
- Recommended Crop for this area: {crop}

**Your Role:**
- Give practical advice that Nepali farmers can act on
- Explain the disease in plain language
- Suggest treatment and prevention that uses locally available resources
- Recommend crops that suit the local climate and soil

**Guidelines:**
- Keep a natural, encouraging tone
- Prefer simple words over technical terms
- When unsure, recommend consulting local agricultural experts

User Question: {message}",
        disease = context.disease_name,
        confidence = context.confidence_text(),
        district = context.district_text(),
        crop = context.crop_text(),
    )
}

//! Canned replies for when the hosted LLM cannot be reached.
//!
//! Dispatch is an ordered table of keyword rules; the first rule whose
//! keywords appear in the lower-cased message wins, and the last entry of
//! each table is a catch-all. Output depends only on the inputs.

use crate::classifier::Diagnosis;
use crate::conversation::ConversationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Treatment,
    Symptoms,
    Prevention,
    GeneralInfo,
    /// Catch-all when a diagnosis is in context.
    Overview,
    Greeting,
    Help,
    /// Catch-all when nothing has been diagnosed yet.
    Introduction,
}

struct Rule {
    category: Category,
    keywords: &'static [&'static str],
}

impl Rule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.is_empty() || self.keywords.iter().any(|k| lowered.contains(k))
    }
}

const ADVISORY_RULES: &[Rule] = &[
    Rule {
        category: Category::Treatment,
        keywords: &["treat", "cure", "fix", "solution", "medicine", "help", "save"],
    },
    Rule {
        category: Category::Symptoms,
        keywords: &["symptom", "sign", "look", "appear", "show"],
    },
    Rule {
        category: Category::Prevention,
        keywords: &["prevent", "avoid", "stop", "future", "protect"],
    },
    Rule {
        category: Category::GeneralInfo,
        keywords: &["tell me more", "explain", "what is", "about this disease"],
    },
    Rule {
        category: Category::Overview,
        keywords: &[],
    },
];

const SMALL_TALK_RULES: &[Rule] = &[
    Rule {
        category: Category::Greeting,
        keywords: &["hello", "hi", "hey"],
    },
    Rule {
        category: Category::Help,
        keywords: &["help", "what can you do"],
    },
    Rule {
        category: Category::Introduction,
        keywords: &[],
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedReply {
    pub category: Category,
    pub text: String,
}

pub fn select(message: &str, context: Option<&ConversationContext>) -> Category {
    let lowered = message.to_lowercase();
    let rules = if context.is_some() {
        ADVISORY_RULES
    } else {
        SMALL_TALK_RULES
    };

    rules
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or(Category::Introduction, |rule| rule.category)
}

pub fn respond(message: &str, context: Option<&ConversationContext>) -> CannedReply {
    let category = select(message, context);

    let text = match (category, context) {
        (Category::Treatment, Some(ctx)) => treatment(ctx),
        (Category::Symptoms, Some(ctx)) => symptoms(ctx),
        (Category::Prevention, Some(ctx)) => prevention(ctx),
        (Category::GeneralInfo, Some(ctx)) => general_info(ctx),
        (Category::Overview, Some(ctx)) => overview(ctx),
        (Category::Greeting, _) => GREETING.to_string(),
        (Category::Help, _) => HELP.to_string(),
        (_, None) | (Category::Introduction, _) => INTRODUCTION.to_string(),
    };

    CannedReply { category, text }
}

/// Reply for an analysis turn when the LLM could not phrase it.
pub fn diagnosis_summary(diagnosis: &Diagnosis) -> String {
    format!(
        "**Diagnosis Complete**\n\nMy analysis indicates this could be **{}** with a confidence \
         of {}.\n\n*(Note: Conversational features are temporarily unavailable.)*",
        diagnosis.label,
        diagnosis.confidence_percent()
    )
}

fn treatment(ctx: &ConversationContext) -> String {
    let disease = &ctx.disease_name;
    let district = ctx.district_text();
    format!(
        "Here is how you can treat {disease}.

**Act now:**
• Cut off and destroy infected leaves so the disease does not spread
• Space plants so air can move between them
• Water at the base of the plant, never over the leaves

**Home remedies:**
• Neem oil spray: 2 tablespoons of neem oil in 4 litres of water
• Baking soda spray: 1 tablespoon of baking soda and a few drops of soap in 4 litres of water
• Garlic spray: steep 3-4 crushed cloves in hot water, strain, then spray

**If the disease keeps spreading:**
• Copper-based fungicides work well against most fungal diseases
• Follow the label and wear protection while spraying

**Afterwards:**
• Clear plant debris from the field
• Rotate crops every season
• Choose resistant varieties for the next planting

These steps suit conditions in {district}. Start with the gentle remedies; better airflow alone often makes a visible difference.

Would you like more detail on any of these treatments?"
    )
}

fn symptoms(ctx: &ConversationContext) -> String {
    let disease = &ctx.disease_name;
    let district = ctx.district_text();
    format!(
        "Good question. This is what {disease} usually looks like.

**Visible signs:**
• Brown or black spots on the leaves, sometimes with rings
• Yellowing around the spots
• Wilting or drooping leaves
• Grey or white powdery growth under the leaves in some cases

**How it progresses:**
• It usually starts on the older, lower leaves
• Spots grow larger and more numerous over time
• Badly affected leaves turn yellow and drop
• Untreated, it can reach stems and fruit

**What to check:**
• Inspect both sides of the leaves once a week
• Look again after rain or very humid days
• Watch for spots that spread between inspections

In {district}, keep a close eye on your plants during the monsoon. Catching it early makes treatment much easier.

Would you like to know how to tell it apart from similar diseases?"
    )
}

fn prevention(ctx: &ConversationContext) -> String {
    let disease = &ctx.disease_name;
    let district = ctx.district_text();
    format!(
        "Prevention is always cheaper than cure. Here is how to keep {disease} away.

**Field hygiene:**
• Remove fallen leaves and plant debris regularly
• Keep enough space between plants
• Avoid handling plants while they are wet
• Rotate crops to break the disease cycle

**Watering:**
• Water the soil, not the leaves
• Water early in the morning so leaves dry quickly
• Let the soil dry a little between waterings
• Use drip irrigation if you can

**Healthy plants:**
• Plant resistant varieties when they are available
• Make sure plants get enough sunlight and nutrients
• Pull out diseased plants straight away

**Seasonal tips for {district}:**
• Be extra careful during the monsoon
• Prune to let air through the canopy
• Mulch to stop soil splashing onto the leaves

**Preventive sprays:**
• Neem oil every 7-10 days
• Baking soda spray in wet weather
• Compost tea for general plant health

Strong, well-kept plants resist disease far better. Would you like more detail on any of these methods?"
    )
}

fn general_info(ctx: &ConversationContext) -> String {
    let disease = &ctx.disease_name;
    let district = ctx.district_text();
    format!(
        "Happy to explain more about {disease}. Many farmers in Nepal deal with it.

**What it is:**
{disease} is usually caused by a fungus that thrives in warm, humid weather, which is common during the Nepali monsoon.

**How it spreads:**
• The fungus survives in plant debris and soil
• Wind, rain splash and tools carry the spores
• Infection starts when spores land on wet leaves

**Why it matters:**
• Damaged leaves make less food for the plant
• Yields can drop sharply if it is left untreated
• Weakened plants catch other problems more easily

**The good news:**
• It is very treatable when caught early
• Simple prevention greatly reduces outbreaks
• Plants can recover fully with proper care

**For {district}:**
• The local climate makes prevention especially important
• Local agricultural experts know this disease well and can advise you

Would you like treatment steps, or to know how it affects other crops?"
    )
}

fn overview(ctx: &ConversationContext) -> String {
    format!(
        "You are asking about {disease}, detected in your plant with {confidence} confidence.

Based on your analysis from {district}, I can help with:
• Treatment methods and solutions
• Recognising symptoms
• Preventing future outbreaks
• General information about this disease
• Tips for your local climate

**Questions farmers often ask:**
• \"How do I treat this disease?\"
• \"What are the symptoms to watch for?\"
• \"How can I prevent this in the future?\"
• \"Tell me more about this disease\"

What would you like to know?",
        disease = ctx.disease_name,
        confidence = ctx.confidence_text(),
        district = ctx.district_text(),
    )
}

const GREETING: &str = "Hello! I'm Agri-Sage AI, your agricultural assistant for Nepal.

I can help you with:
• Identifying and treating plant diseases
• Crop recommendations for your area
• Everyday farming advice
• Preventing common plant problems

Upload a photo of a plant leaf and I'll analyse it for you. What would you like to know today?";

const HELP: &str = "I'm here to help with all things farming.

**What I can do:**
• Analyse leaf photos to detect diseases
• Recommend treatments
• Suggest prevention strategies
• Recommend crops that suit your district
• Answer questions about plant care

**How to use me:**
1. Upload a photo of your plant leaf
2. Read the diagnosis
3. Ask about treatment, prevention or general care
4. Get advice tailored to your situation

Ready? Just upload a plant image!";

const INTRODUCTION: &str = "I'm Agri-Sage AI, your agricultural assistant for Nepal.

I can identify plant diseases, suggest treatments and give farming advice suited to local conditions.

For the most useful answers, please upload a photo of your plant leaf first.

What would you like to know about plant health or farming today?";

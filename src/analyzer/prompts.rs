//! Prompt construction for remote skin analysis calls.

use crate::user::UserContext;

/// Ingredients the model is allowed to recommend.
pub const AVAILABLE_INGREDIENTS: [&str; 22] = [
    "Salicylic Acid",
    "Azelaic Acid",
    "Niacinamide",
    "Vitamin C",
    "Retinol",
    "Retinal",
    "Hyaluronic Acid",
    "Ceramides",
    "Glycolic Acid",
    "Lactic Acid",
    "Mandelic Acid",
    "Benzoyl Peroxide",
    "Zinc",
    "Arbutin",
    "Kojic Acid",
    "Tranexamic Acid",
    "Bakuchiol",
    "Peptides",
    "Squalane",
    "Centella Asiatica",
    "Green Tea",
    "Licorice Root",
];

/// Conditions listed in the prompt, in the wording the model sees.
const FOCUS_CONDITIONS: &str = "acne, redness, dark spots, wrinkles, pigmentation, dryness, \
oiliness, sensitivity, dullness, dehydration, sun damage, pores, texture";

/// Build the "User Information" block, or an empty string when there is
/// nothing to personalize with.
pub fn build_user_context_block(user: Option<&UserContext>) -> String {
    let user = match user {
        Some(u) if !u.is_empty() => u,
        _ => return String::new(),
    };

    let name = if user.name.trim().is_empty() {
        "Not provided"
    } else {
        user.name.trim()
    };
    let age = if user.age.trim().is_empty() {
        "Not provided"
    } else {
        user.age.trim()
    };

    format!(
        r#"

User Information:
- Name: {name}
- Age: {age}

Please provide personalized recommendations considering the user's age and any age-related skin concerns."#
    )
}

/// Build the full skin analysis instruction prompt.
pub fn build_skin_analysis_prompt(user: Option<&UserContext>) -> String {
    let ingredients = AVAILABLE_INGREDIENTS.join(", ");
    let user_block = build_user_context_block(user);

    format!(
        r#"Analyze this facial skin image for visible concerns. Provide:
1. A brief paragraph describing the skin condition and overall assessment
2. Top 3-5 recommended ingredients from the available list that would help

Available ingredients: {ingredients}{user_block}

Focus on: {FOCUS_CONDITIONS}.

Return JSON format:
{{
  "skinAnalysis": "Brief paragraph describing skin condition",
  "recommendedIngredients": ["ingredient1", "ingredient2", "ingredient3"],
  "conditions": [{{"condition": "acne", "confidence": 0.8}}]
}}"#
    )
}

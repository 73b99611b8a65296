use serde::Deserialize;
use serde_json::json;

use crate::models::PlanFields;

// ===== MODEL CONFIGURATION =====

/// Candidate models tried in order. Overridable with HF_MODELS
/// (comma-separated, order preserved).
const DEFAULT_MODELS: &[&str] = &[
    "mistralai/Mistral-7B-Instruct-v0.2",
    "HuggingFaceH4/zephyr-7b-beta",
    "tiiuae/falcon-7b-instruct",
];

const INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// A completion shorter than this (after prompt stripping) is treated
/// as a failed attempt and the next candidate is tried.
const MIN_PLAN_CHARS: usize = 100;

// ===== INFERENCE API RESPONSE STRUCTURES =====

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

// ===== GENERATOR =====

/// A plan produced by one of the candidate models.
#[derive(Debug)]
pub struct GeneratedPlan {
    pub plan: String,
    pub model: String,
}

/// Every candidate was tried and none produced a usable plan. The last
/// error is kept for the log line only; the caller switches to the
/// deterministic fallback and does not surface it.
#[derive(Debug)]
pub struct Exhausted {
    pub last_error: Option<String>,
}

/// Text-generation client holding the shared reqwest client, the API
/// credential and the ordered candidate list. Built once at startup
/// and handed to handlers through axum state.
#[derive(Clone)]
pub struct PlanGenerator {
    client: reqwest::Client,
    api_key: String,
    models: Vec<String>,
}

impl PlanGenerator {
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("HF_API_KEY")
            .map_err(|_| "HF_API_KEY not set in .env".to_string())?;

        let models: Vec<String> = match std::env::var("HF_MODELS") {
            Ok(list) => parse_model_list(&list),
            Err(_) => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        if models.is_empty() {
            return Err("HF_MODELS is set but contains no model ids".to_string());
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            models,
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Try each candidate model in order and return the first plan that
    /// passes the length threshold. One attempt per model, no backoff,
    /// strictly sequential.
    pub async fn generate(&self, prompt: &str) -> Result<GeneratedPlan, Exhausted> {
        let mut last_error: Option<String> = None;

        println!("\x1b[1;30m┌── 🤖 PLAN GENERATION ──────────────────────\x1b[0m");

        for (index, model) in self.models.iter().enumerate() {
            println!(
                "│ 🔄 Model    : {} (Attempt {}/{})",
                model,
                index + 1,
                self.models.len()
            );

            match self.call_model(model, prompt).await {
                Ok(raw) => match qualify_completion(prompt, &raw) {
                    Some(plan) => {
                        println!("│ \x1b[32m✅ SUCCESS\x1b[0m  : {} chars generated", plan.chars().count());
                        println!("\x1b[1;30m└────────────────────────────────────────────\x1b[0m");
                        return Ok(GeneratedPlan {
                            plan,
                            model: model.clone(),
                        });
                    }
                    None => {
                        eprintln!("│ ⚠️  TOO SHORT: response under {} chars", MIN_PLAN_CHARS);
                        last_error = Some(format!("{}: response too short", model));
                    }
                },
                Err(e) => {
                    eprintln!("│ \x1b[31m❌ FAILED\x1b[0m   : {}", e);
                    last_error = Some(format!("{}: {}", model, e));
                }
            }
        }

        println!("\x1b[1;30m└────────────────────────────────────────────\x1b[0m");
        Err(Exhausted { last_error })
    }

    /// Probe a single model with a trivial input. Used by /check-models.
    pub async fn probe(&self, model: &str) -> Result<(), String> {
        let body = json!({
            "inputs": "Hello",
            "parameters": { "max_new_tokens": 10 }
        });

        let response = self
            .client
            .post(format!("{}/{}", INFERENCE_BASE_URL, model))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(format!("{} - {}", status, truncate_for_log(&detail, 120)))
        }
    }

    async fn call_model(&self, model: &str, prompt: &str) -> Result<String, String> {
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": 1024,
                "temperature": 0.7,
                "top_p": 0.9,
                "repetition_penalty": 1.2,
                "do_sample": true
            },
            "options": { "wait_for_model": true }
        });

        let response = self
            .client
            .post(format!("{}/{}", INFERENCE_BASE_URL, model))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!("{} - {}", status, truncate_for_log(&error_text, 120)));
        }

        let generations: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| format!("Failed to deserialize inference response: {}", e))?;

        generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| "Inference API returned no generations".to_string())
    }
}

// ===== HELPER FUNCTIONS =====

/// Split a comma-separated HF_MODELS value into an ordered model list,
/// dropping blank entries.
fn parse_model_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

/// The inference API echoes the prompt at the front of generated_text.
/// Strip it, trim, and accept only completions long enough to be a
/// real plan. Heuristic by design; this helper is its single owner.
fn qualify_completion(prompt: &str, generated: &str) -> Option<String> {
    let completion = generated.strip_prefix(prompt).unwrap_or(generated).trim();
    if completion.chars().count() >= MIN_PLAN_CHARS {
        Some(completion.to_string())
    } else {
        None
    }
}

/// Build the prompt sent to every candidate model, embedding all four
/// request fields and the seven required content sections.
pub fn build_plan_prompt(fields: PlanFields<'_>) -> String {
    format!(
        "Create a detailed study plan for the following request.\n\
         \n\
         Subject: {}\n\
         Level: {}\n\
         Duration: {}\n\
         Goals: {}\n\
         \n\
         The plan must include these sections:\n\
         1. Weekly breakdown of topics\n\
         2. Daily study schedule\n\
         3. Key topics to cover\n\
         4. Recommended resources\n\
         5. Practice exercises\n\
         6. Milestones and checkpoints\n\
         7. Tips for staying motivated\n\
         \n\
         Study plan:\n",
        fields.subject, fields.level, fields.duration, fields.goals
    )
}

/// Truncate text for logging
fn truncate_for_log(text: &str, max_len: usize) -> String {
    let clean_text: String = text.replace('\n', " ");
    if clean_text.chars().count() <= max_len {
        clean_text
    } else {
        let truncated: String = clean_text.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanFields;

    #[test]
    fn test_parse_model_list_preserves_order() {
        let models = parse_model_list("model-a, model-b,model-c");
        assert_eq!(models, vec!["model-a", "model-b", "model-c"]);
    }

    #[test]
    fn test_parse_model_list_drops_blank_entries() {
        assert_eq!(parse_model_list("model-a,, ,model-b"), vec!["model-a", "model-b"]);
        assert!(parse_model_list(" , ").is_empty());
    }

    #[test]
    fn test_qualify_strips_echoed_prompt() {
        let prompt = "Tell me about Rust.\n";
        let completion = "x".repeat(150);
        let raw = format!("{}{}", prompt, completion);
        assert_eq!(qualify_completion(prompt, &raw), Some(completion));
    }

    #[test]
    fn test_qualify_accepts_unechoed_output() {
        let completion = format!("  {}  ", "y".repeat(120));
        assert_eq!(
            qualify_completion("some prompt", &completion),
            Some("y".repeat(120))
        );
    }

    #[test]
    fn test_qualify_rejects_short_completions() {
        let prompt = "Tell me about Rust.\n";
        let raw = format!("{}too short", prompt);
        assert_eq!(qualify_completion(prompt, &raw), None);
    }

    #[test]
    fn test_qualify_rejects_whitespace_padding() {
        // 99 real chars surrounded by whitespace must not pass.
        let raw = format!("   {}   ", "z".repeat(99));
        assert_eq!(qualify_completion("", &raw), None);
    }

    #[test]
    fn test_prompt_embeds_all_fields_and_sections() {
        let prompt = build_plan_prompt(PlanFields {
            subject: "French",
            level: "beginner",
            duration: "8 weeks",
            goals: "hold a basic conversation",
        });
        for needle in ["French", "beginner", "8 weeks", "hold a basic conversation"] {
            assert!(prompt.contains(needle), "missing {}", needle);
        }
        for section in 1..=7 {
            assert!(prompt.contains(&format!("{}.", section)));
        }
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("this is a very long text", 10), "this is a ...");
    }
}

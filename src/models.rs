use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

// ===== INBOUND REQUEST TYPES =====

/// Body of POST /generate-plan. Fields are optional at the serde level
/// so a missing or blank field becomes a 400 with a helpful message
/// instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub subject: Option<String>,
    pub level: Option<String>,
    pub duration: Option<String>,
    pub goals: Option<String>,
}

impl PlanRequest {
    /// Returns the names of required fields that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.subject) {
            missing.push("subject");
        }
        if is_blank(&self.level) {
            missing.push("level");
        }
        if is_blank(&self.duration) {
            missing.push("duration");
        }
        if is_blank(&self.goals) {
            missing.push("goals");
        }
        missing
    }

    /// Validated view of the request. Only call after missing_fields()
    /// came back empty.
    pub fn fields(&self) -> PlanFields<'_> {
        PlanFields {
            subject: self.subject.as_deref().unwrap_or("").trim(),
            level: self.level.as_deref().unwrap_or("").trim(),
            duration: self.duration.as_deref().unwrap_or("").trim(),
            goals: self.goals.as_deref().unwrap_or("").trim(),
        }
    }
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map(str::trim).unwrap_or("").is_empty()
}

/// Borrowed, trimmed request fields handed to the prompt builder,
/// fallback generator and persistence layer.
#[derive(Debug, Clone, Copy)]
pub struct PlanFields<'a> {
    pub subject: &'a str,
    pub level: &'a str,
    pub duration: &'a str,
    pub goals: &'a str,
}

// ===== DATABASE MODELS =====

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlanRecord {
    pub id: Uuid,
    pub subject: String,
    pub level: String,
    pub duration: String,
    pub goals: String,
    pub plan: String,
    #[serde(rename = "modelUsed")]
    pub model_used: String,
    #[serde(rename = "isAiGenerated")]
    pub is_ai_generated: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewPlanRecord<'a> {
    pub subject: &'a str,
    pub level: &'a str,
    pub duration: &'a str,
    pub goals: &'a str,
    pub plan: &'a str,
    pub model_used: &'a str,
    pub is_ai_generated: bool,
}

// ===== RESPONSE TYPES =====

#[derive(Debug, Serialize)]
pub struct GeneratePlanResponse {
    pub success: bool,
    pub plan: String,
    #[serde(rename = "planId", skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,
    #[serde(rename = "modelUsed")]
    pub model_used: String,
    #[serde(rename = "isAiGenerated")]
    pub is_ai_generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanListResponse {
    pub success: bool,
    pub plans: Vec<PlanRecord>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub success: bool,
    pub plan: PlanRecord,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        subject: Option<&str>,
        level: Option<&str>,
        duration: Option<&str>,
        goals: Option<&str>,
    ) -> PlanRequest {
        PlanRequest {
            subject: subject.map(String::from),
            level: level.map(String::from),
            duration: duration.map(String::from),
            goals: goals.map(String::from),
        }
    }

    #[test]
    fn test_complete_request_has_no_missing_fields() {
        let req = request(Some("Rust"), Some("beginner"), Some("6 weeks"), Some("learn ownership"));
        assert!(req.missing_fields().is_empty());
    }

    #[test]
    fn test_absent_field_is_reported() {
        let req = request(Some("Rust"), None, Some("6 weeks"), Some("learn ownership"));
        assert_eq!(req.missing_fields(), vec!["level"]);
    }

    #[test]
    fn test_blank_field_counts_as_missing() {
        let req = request(Some("Rust"), Some("   "), Some("6 weeks"), Some(""));
        assert_eq!(req.missing_fields(), vec!["level", "goals"]);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let req = request(Some("  Rust  "), Some("beginner"), Some("6 weeks"), Some("goals"));
        assert_eq!(req.fields().subject, "Rust");
    }
}

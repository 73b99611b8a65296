use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json,
    Router,
};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::net::TcpListener;
use uuid::Uuid;

pub mod database;
pub mod fallback;
pub mod generator;
pub mod models;

use crate::database::crud;
use crate::fallback::generate_fallback_plan;
use crate::generator::{build_plan_prompt, PlanGenerator};
use crate::models::{
    ErrorResponse, GeneratePlanResponse, NewPlanRecord, PlanFields, PlanListResponse,
    PlanRequest, PlanResponse,
};

const BANNER: &str = r#"
\x1b[36m
███████╗████████╗██╗   ██╗██████╗ ██╗   ██╗
██╔════╝╚══██╔══╝██║   ██║██╔══██╗╚██╗ ██╔╝
███████╗   ██║   ██║   ██║██║  ██║ ╚████╔╝
╚════██║   ██║   ██║   ██║██║  ██║  ╚██╔╝
███████║   ██║   ╚██████╔╝██████╔╝   ██║
╚══════╝   ╚═╝    ╚═════╝ ╚═════╝    ╚═╝

          [Study Plan Generator v1.0]
\x1b[0m"#;

#[derive(Clone)]
struct AppState {
    pool: PgPool,
    generator: PlanGenerator,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    print!("\x1b[2J\x1b[1;1H");
    println!("{}", BANNER);
    println!("\x1b[1;30m━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\x1b[0m");

    let hf_status = if std::env::var("HF_API_KEY").is_ok() {
        "\x1b[32m✅ READY\x1b[0m"
    } else {
        "\x1b[31m❌ MISSING\x1b[0m"
    };

    println!(" 🔧 \x1b[1mSYSTEM CHECK\x1b[0m");
    println!("    ├─ 🧠 Inference API : {}", hf_status);

    let generator = match PlanGenerator::from_env() {
        Ok(g) => g,
        Err(e) => {
            eprintln!("    └─ ❌ {}", e);
            return;
        }
    };
    println!("    ├─ 📋 Models        : {}", generator.models().join(", "));

    let pool = match database::pool::create_pool().await {
        Ok(p) => {
            println!("    ├─ 🗄️  Database      : \x1b[32m✅ CONNECTED\x1b[0m");
            p
        }
        Err(e) => {
            println!("    ├─ 🗄️  Database      : \x1b[31m❌ FAILED\x1b[0m");
            eprintln!("       └─ Error: {}", e);
            return;
        }
    };

    if let Err(e) = crud::init_schema(&pool).await {
        eprintln!("    └─ ❌ Schema init failed: {}", e);
        return;
    }
    println!("    └─ 🏗️  Schema        : \x1b[32m✅ READY\x1b[0m");

    let state = AppState { pool, generator };

    let app = Router::new()
        .route("/generate-plan", post(generate_plan))
        .route("/study-plans", get(list_plans))
        .route("/study-plan/:id", get(get_plan))
        .route("/check-models", get(check_models))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    println!("\x1b[1;30m━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\x1b[0m");
    println!(" 🚀 \x1b[1;32mSTUDY PLAN BACKEND IS ONLINE!\x1b[0m");
    println!("    📡 Listening on : \x1b[36mhttp://0.0.0.0:{}\x1b[0m", port);
    println!("\x1b[1;30m━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\x1b[0m");
    println!("\nWaiting for requests...\n");

    let listener = TcpListener::bind(addr).await.unwrap();

    axum::serve(listener, app).await.unwrap();
}

// ===== HANDLERS =====

async fn generate_plan(
    State(state): State<AppState>,
    Json(payload): Json<PlanRequest>,
) -> Response {
    let request_start = Instant::now();

    let missing = payload.missing_fields();
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        )
            .into_response();
    }

    let fields = payload.fields();
    println!("\n| Plan request: \x1b[32m{}\x1b[0m ({})", fields.subject, fields.level);
    println!("| Duration    : \x1b[32m{}\x1b[0m", fields.duration);

    let prompt = build_plan_prompt(fields);

    let response = match state.generator.generate(&prompt).await {
        Ok(generated) => {
            respond_with_plan(&state.pool, fields, generated.plan, generated.model, true, None)
                .await
        }
        Err(exhausted) => {
            if let Some(err) = exhausted.last_error {
                eprintln!("⚠️  All models exhausted, last error: {}", err);
            }
            let plan = generate_fallback_plan(fields);
            respond_with_plan(
                &state.pool,
                fields,
                plan,
                "fallback".to_string(),
                false,
                Some("All AI models were unavailable; returned a template-based plan".to_string()),
            )
            .await
        }
    };

    println!("⏱️  Request processed in: {:.2?}\n", request_start.elapsed());
    response
}

/// Persist the plan and build the response. Persistence failure is
/// swallowed: the caller still gets the plan, with a warning and no id.
async fn respond_with_plan(
    pool: &PgPool,
    fields: PlanFields<'_>,
    plan: String,
    model_used: String,
    is_ai_generated: bool,
    message: Option<String>,
) -> Response {
    let new_plan = NewPlanRecord {
        subject: fields.subject,
        level: fields.level,
        duration: fields.duration,
        goals: fields.goals,
        plan: &plan,
        model_used: &model_used,
        is_ai_generated,
    };

    let (plan_id, warning) = match crud::create_plan(pool, new_plan).await {
        Ok(stored) => {
            println!("✅ Plan saved: {} ({})", stored.id, model_used);
            (Some(stored.id), None)
        }
        Err(e) => {
            eprintln!("❌ Failed to save plan: {}", e);
            (None, Some("Plan generated but could not be saved".to_string()))
        }
    };

    Json(GeneratePlanResponse {
        success: true,
        plan,
        plan_id,
        model_used,
        is_ai_generated,
        message,
        warning,
    })
    .into_response()
}

async fn list_plans(State(state): State<AppState>) -> Response {
    match crud::get_recent_plans(&state.pool).await {
        Ok(plans) => Json(PlanListResponse {
            success: true,
            plans,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_plan(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // An unparseable id cannot name a stored plan, so it is a 404 too.
    let Ok(id) = Uuid::parse_str(&id) else {
        return plan_not_found();
    };

    match crud::get_plan_by_id(&state.pool, id).await {
        Ok(Some(plan)) => Json(PlanResponse {
            success: true,
            plan,
        })
        .into_response(),
        Ok(None) => plan_not_found(),
        Err(e) => internal_error(e),
    }
}

async fn check_models(State(state): State<AppState>) -> Json<Value> {
    let mut model_status = serde_json::Map::new();

    for model in state.generator.models() {
        let status = match state.generator.probe(model).await {
            Ok(()) => "Available".to_string(),
            Err(reason) => format!("Unavailable: {}", reason),
        };
        println!("🔎 {} : {}", model, status);
        model_status.insert(model.clone(), Value::String(status));
    }

    Json(json!({
        "timestamp": Utc::now(),
        "modelStatus": model_status,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "studyplan-backend",
        "timestamp": Utc::now(),
    }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response()
}

fn plan_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Study plan not found")),
    )
        .into_response()
}

fn internal_error(e: sqlx::Error) -> Response {
    eprintln!("❌ Database error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(e.to_string())),
    )
        .into_response()
}

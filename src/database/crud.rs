use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewPlanRecord, PlanRecord};

/// Most recent plans returned by the listing query.
const RECENT_PLANS_LIMIT: i64 = 50;

/// Create the study_plans table if it does not exist yet. Run once at
/// startup, right after the pool comes up.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS study_plans (
            id UUID PRIMARY KEY,
            subject TEXT NOT NULL,
            level TEXT NOT NULL,
            duration TEXT NOT NULL,
            goals TEXT NOT NULL,
            plan TEXT NOT NULL,
            model_used TEXT NOT NULL,
            is_ai_generated BOOLEAN NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS study_plans_created_at_idx ON study_plans (created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ========================================
// CREATE OPERATIONS
// ========================================

/// Insert a new plan and return the stored row. Plans are insert-only;
/// there is no update or delete path.
pub async fn create_plan(
    pool: &PgPool,
    new_plan: NewPlanRecord<'_>,
) -> Result<PlanRecord, sqlx::Error> {
    sqlx::query_as::<_, PlanRecord>(
        r#"
        INSERT INTO study_plans (
            id, subject, level, duration, goals,
            plan, model_used, is_ai_generated
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_plan.subject)
    .bind(new_plan.level)
    .bind(new_plan.duration)
    .bind(new_plan.goals)
    .bind(new_plan.plan)
    .bind(new_plan.model_used)
    .bind(new_plan.is_ai_generated)
    .fetch_one(pool)
    .await
}

// ========================================
// READ OPERATIONS
// ========================================

pub async fn get_plan_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<PlanRecord>, sqlx::Error> {
    sqlx::query_as::<_, PlanRecord>("SELECT * FROM study_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Most recent plans first, capped at 50.
pub async fn get_recent_plans(pool: &PgPool) -> Result<Vec<PlanRecord>, sqlx::Error> {
    sqlx::query_as::<_, PlanRecord>(
        "SELECT * FROM study_plans ORDER BY created_at DESC LIMIT $1",
    )
    .bind(RECENT_PLANS_LIMIT)
    .fetch_all(pool)
    .await
}

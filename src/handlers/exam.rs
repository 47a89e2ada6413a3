// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::exam::{CreateExamRequest, Exam},
    utils::jwt::Claims,
};

/// Records a new exam result for the authenticated user.
///
/// Each subject can only be recorded once per user; a duplicate insert is
/// rejected by the storage constraint and surfaced as 409 with a message the
/// UI can show as-is. Existing records are never touched.
pub async fn create_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exam = sqlx::query_as::<_, Exam>(
        r#"
        INSERT INTO exams (user_id, name, grade, credits, date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, name, grade, credits, date
        "#,
    )
    .bind(claims.user_id())
    .bind(&payload.name)
    .bind(payload.grade)
    .bind(payload.credits)
    .bind(payload.date)
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(
            format!(
                "You already recorded a grade for '{}'. Delete the existing record or use a different name.",
                payload.name
            ),
        ),
        _ => {
            tracing::error!("Failed to create exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Lists all exam records of the authenticated user.
/// No ordering is guaranteed; callers sort as needed.
pub async fn list_exams(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, Exam>(
        r#"
        SELECT id, user_id, name, grade, credits, date
        FROM exams
        WHERE user_id = $1
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(exams))
}

/// Deletes one exam record by id, scoped to the authenticated user.
///
/// Deleting an id that does not exist (or belongs to someone else) is a
/// successful no-op, reported as `deleted: false`.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1 AND user_id = $2")
        .bind(exam_id)
        .bind(claims.user_id())
        .execute(&pool)
        .await?;

    Ok(Json(serde_json::json!({
        "deleted": result.rows_affected() > 0,
    })))
}

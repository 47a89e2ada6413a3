// src/handlers/dashboard.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::exam::{ChartPoint, ChartSeries, DashboardResponse, Exam},
    stats,
    utils::jwt::Claims,
};

/// Returns everything the dashboard screen displays.
///
/// Re-fetches the records and recomputes all statistics on every call;
/// nothing is cached between state-changing actions. With no records yet,
/// `stats` and `chart` are null and the response carries an informational
/// message instead.
pub async fn get_dashboard(
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

    let Some(career) = stats::career_stats(&exams) else {
        return Ok(Json(DashboardResponse {
            exams,
            stats: None,
            chart: None,
            simulation: Vec::new(),
            message: Some("Welcome! Add your first exam to see your statistics.".to_string()),
        }));
    };

    // Chronological series for the grade-over-time chart, with the weighted
    // mean as the horizontal reference line.
    let mut points: Vec<ChartPoint> = exams
        .iter()
        .map(|e| ChartPoint {
            date: e.date,
            grade: e.grade,
        })
        .collect();
    points.sort_by_key(|p| p.date);

    // The simulation and the reference line take the full-precision mean;
    // only the KPI fields are rounded.
    let simulation = stats::simulate_next_exam(career.weighted_mean_exact, career.total_credits);

    Ok(Json(DashboardResponse {
        exams,
        chart: Some(ChartSeries {
            points,
            reference: career.weighted_mean_exact,
        }),
        simulation,
        stats: Some(career),
        message: None,
    }))
}

// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::stats::{CareerStats, SimulationRow};

/// Represents the 'exams' table in the database.
/// One recorded grade for one subject; (name, user_id) is unique.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub user_id: i64,

    /// Subject name, e.g. "Analisi 1".
    pub name: String,

    /// Grade on the 18..30 scale; 31 encodes "30 e lode".
    pub grade: i64,

    /// Credit weight (CFU) of the subject.
    pub credits: i64,

    /// Date the grade was recorded.
    pub date: chrono::DateTime<chrono::Utc>,
}

/// DTO for recording a new exam result.
/// Ranges match the original entry form: grade 18..=31 (31 = lode),
/// credits 1..=30.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 100, message = "Subject name must not be empty."))]
    pub name: String,
    #[validate(range(min = 18, max = 31, message = "Grade must be between 18 and 31."))]
    pub grade: i64,
    #[validate(range(min = 1, max = 30, message = "Credits must be between 1 and 30."))]
    pub credits: i64,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// One point of the grade-over-time chart.
#[derive(Debug, Serialize)]
pub struct ChartPoint {
    pub date: chrono::DateTime<chrono::Utc>,
    pub grade: i64,
}

/// Chart series sorted by date, with the weighted mean as reference line.
#[derive(Debug, Serialize)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
    pub reference: f64,
}

/// Everything the dashboard screen displays, recomputed on every call.
/// `stats`, `chart` and `simulation` are absent until the first exam exists.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub exams: Vec<Exam>,
    pub stats: Option<CareerStats>,
    pub chart: Option<ChartSeries>,
    pub simulation: Vec<SimulationRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

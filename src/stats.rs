// src/stats.rs

use serde::Serialize;

use crate::models::exam::Exam;

/// Lowest passing grade on the Italian scale.
pub const MIN_GRADE: i64 = 18;

/// Stored encoding of "30 e lode". Counts as 30 in every average.
pub const HONORS_GRADE: i64 = 31;

// Credit weights assumed for the hypothetical next exam. Domain convention,
// deliberately not configurable.
const SIM_CREDITS_LOW: i64 = 6;
const SIM_CREDITS_HIGH: i64 = 9;

/// The four career KPIs, rounded to 2 decimals for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerStats {
    pub arithmetic_mean: f64,
    pub weighted_mean: f64,
    /// Weighted mean rescaled from the 30-point to the 110-point scale.
    pub graduation_projection: f64,
    pub total_credits: i64,

    /// Full-precision weighted mean. Further computation (simulation, chart
    /// reference) must use this, not the rounded display value: rounding
    /// first can shift simulation cells across a rounding boundary.
    #[serde(skip)]
    pub weighted_mean_exact: f64,
}

/// One row of the what-if table: the candidate grade for the next exam and
/// the weighted mean it would produce under a 6- and a 9-credit assumption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRow {
    pub grade: String,
    pub with_6_credits: f64,
    pub with_9_credits: f64,
}

/// Grade value used in averages: honors caps at 30, everything else as-is.
fn effective_grade(grade: i64) -> f64 {
    if grade > 30 { 30.0 } else { grade as f64 }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Computes the career KPIs over a user's exam records.
///
/// Returns `None` for an empty set: with no records there is no mean to take
/// and the weighted mean would divide by zero credits.
pub fn career_stats(exams: &[Exam]) -> Option<CareerStats> {
    if exams.is_empty() {
        return None;
    }

    let total_credits: i64 = exams.iter().map(|e| e.credits).sum();

    let arithmetic_mean =
        exams.iter().map(|e| effective_grade(e.grade)).sum::<f64>() / exams.len() as f64;

    let weighted_mean = exams
        .iter()
        .map(|e| effective_grade(e.grade) * e.credits as f64)
        .sum::<f64>()
        / total_credits as f64;

    let graduation_projection = weighted_mean * 110.0 / 30.0;

    Some(CareerStats {
        arithmetic_mean: round2(arithmetic_mean),
        weighted_mean: round2(weighted_mean),
        graduation_projection: round2(graduation_projection),
        total_credits,
        weighted_mean_exact: weighted_mean,
    })
}

/// Builds the what-if table for the next exam.
///
/// One row per candidate grade 18..=31 in ascending order (31 shown as
/// "30L"), always 14 rows. Pure function of the current weighted mean and
/// total credits; the candidate exam is assumed to carry 6 or 9 credits.
pub fn simulate_next_exam(weighted_mean: f64, total_credits: i64) -> Vec<SimulationRow> {
    (MIN_GRADE..=HONORS_GRADE)
        .map(|candidate| {
            let eff = effective_grade(candidate);
            let project = |extra: i64| {
                round2(
                    (weighted_mean * total_credits as f64 + eff * extra as f64)
                        / (total_credits + extra) as f64,
                )
            };

            SimulationRow {
                grade: if candidate == HONORS_GRADE {
                    "30L".to_string()
                } else {
                    candidate.to_string()
                },
                with_6_credits: project(SIM_CREDITS_LOW),
                with_9_credits: project(SIM_CREDITS_HIGH),
            }
        })
        .collect()
}

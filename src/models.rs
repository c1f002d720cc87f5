use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn for_score(score: f64) -> Self {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl Default for Grade {
    fn default() -> Self {
        Grade::F
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn for_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Low
        } else if score >= 70.0 {
            RiskLevel::Medium
        } else if score >= 60.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl Default for RiskLevel {
    fn default() -> Self {
        RiskLevel::Critical
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureBreakdown {
    pub academic_strength: f64,
    pub application_strength: f64,
    pub extracurricular_score: f64,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub category: String,
    pub title: String,
    pub description: String,
    pub priority: i32,
    pub duration: Option<String>,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionResult {
    pub score: f64,
    pub grade: Grade,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub feature_analysis: FeatureBreakdown,
    pub recommendations: Vec<Recommendation>,
    pub model_predictions: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudentInput {
    pub name: String,
    pub gender: String,
    pub nationality: String,
    pub age: i32,
    pub english_grade: f64,
    pub math_grade: f64,
    pub sciences_grade: f64,
    pub language_grade: f64,
    pub portfolio_rating: i32,
    pub coverletter_rating: i32,
    pub refletter_rating: i32,
    pub attendance_rate: f64,
    pub extracurricular_level: i32,
    pub ethnic_group: String,
}

impl Default for StudentInput {
    fn default() -> Self {
        StudentInput {
            name: String::new(),
            gender: String::new(),
            nationality: String::new(),
            age: 21,
            english_grade: 3.0,
            math_grade: 3.0,
            sciences_grade: 3.0,
            language_grade: 3.0,
            portfolio_rating: 3,
            coverletter_rating: 3,
            refletter_rating: 3,
            attendance_rate: 0.85,
            extracurricular_level: 3,
            ethnic_group: "NA".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportDocument {
    pub metadata: ReportMetadata,
    pub scores: ScoreSummary,
    pub analysis: SwotAnalysis,
    pub recommendations: RecommendationPlan,
    pub student_info: StudentProfile,
    pub model_info: ModelInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub student_name: String,
    pub generated_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub overall: f64,
    pub grade: Grade,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub breakdown: FeatureBreakdown,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SwotAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationPlan {
    pub all: Vec<Recommendation>,
    pub high_priority: Vec<Recommendation>,
    pub medium_priority: Vec<Recommendation>,
    pub low_priority: Vec<Recommendation>,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub intervention: String,
    pub priority: i32,
    pub duration: String,
    pub start_date: NaiveDate,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub name: String,
    pub gender: String,
    pub nationality: String,
    pub age: i32,
    pub grades: SubjectGrades,
    pub application: ApplicationRatings,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectGrades {
    pub english: f64,
    pub math: f64,
    pub science: f64,
    pub language: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationRatings {
    pub portfolio: i32,
    pub cover_letter: i32,
    pub references: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub prediction_models: Vec<String>,
    pub ensemble_score: f64,
    pub prediction_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PredictionRow {
    pub student_id: Uuid,
    pub name: String,
    pub predicted_score: f64,
    pub predicted_grade: String,
    pub risk_level: String,
    pub confidence: f64,
    pub predicted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InterventionRow {
    pub id: Uuid,
    pub student_name: String,
    pub category: String,
    pub title: String,
    pub priority: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SummaryStats {
    pub total_students: i64,
    pub average_score: f64,
    pub high_risk_count: i64,
    pub intervention_count: i64,
}

#[derive(Debug, Clone)]
pub struct RiskSlice {
    pub risk_level: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct GradeSlice {
    pub grade: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_prediction_fields_take_defaults() {
        let prediction: PredictionResult = serde_json::from_str("{}").unwrap();
        assert_eq!(prediction.score, 0.0);
        assert_eq!(prediction.grade, Grade::F);
        assert_eq!(prediction.risk_level, RiskLevel::Critical);
        assert!(prediction.recommendations.is_empty());
        assert!(prediction.model_predictions.is_empty());
        assert_eq!(prediction.feature_analysis.attendance_rate, 0.0);
    }

    #[test]
    fn null_prediction_is_rejected() {
        assert!(serde_json::from_str::<PredictionResult>("null").is_err());
    }

    #[test]
    fn missing_student_fields_take_form_defaults() {
        let student: StudentInput = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(student.name, "Ada");
        assert_eq!(student.age, 21);
        assert_eq!(student.english_grade, 3.0);
        assert_eq!(student.portfolio_rating, 3);
        assert_eq!(student.attendance_rate, 0.85);
        assert_eq!(student.extracurricular_level, 3);
        assert_eq!(student.ethnic_group, "NA");
    }

    #[test]
    fn recommendation_accepts_sparse_payload() {
        let rec: Recommendation =
            serde_json::from_str(r#"{"title": "Study plan", "priority": 1}"#).unwrap();
        assert_eq!(rec.title, "Study plan");
        assert_eq!(rec.priority, 1);
        assert!(rec.duration.is_none());
        assert!(rec.resources.is_empty());
    }
}

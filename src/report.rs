use std::fmt::Write;

use chrono::{DateTime, Duration, Utc};

use crate::models::{
    ApplicationRatings, FeatureBreakdown, ModelInfo, PredictionResult, Recommendation,
    RecommendationPlan, ReportDocument, ReportMetadata, ScoreSummary, StudentInput,
    StudentProfile, SubjectGrades, SwotAnalysis, TimelineEntry,
};

const GENERATED_BY: &str = concat!("student-performance-report v", env!("CARGO_PKG_VERSION"));
const DEFAULT_DURATION: &str = "4 weeks";

pub fn compose_report(
    prediction: &PredictionResult,
    student: &StudentInput,
    now: DateTime<Utc>,
) -> ReportDocument {
    let title_name = if student.name.is_empty() {
        "Student"
    } else {
        student.name.as_str()
    };
    let student_name = if student.name.is_empty() {
        "Unknown Student".to_string()
    } else {
        student.name.clone()
    };

    let analysis = derive_swot(&prediction.feature_analysis, prediction.score);
    let timeline = build_timeline(&prediction.recommendations, now);

    let mut prediction_models: Vec<String> =
        prediction.model_predictions.keys().cloned().collect();
    prediction_models.sort();

    ReportDocument {
        metadata: ReportMetadata {
            title: format!("Student Performance Report - {title_name}"),
            generated_at: now,
            student_name,
            generated_by: GENERATED_BY.to_string(),
        },
        scores: ScoreSummary {
            overall: prediction.score,
            grade: prediction.grade,
            risk_level: prediction.risk_level,
            confidence: prediction.confidence,
            breakdown: prediction.feature_analysis.clone(),
        },
        analysis,
        recommendations: RecommendationPlan {
            all: prediction.recommendations.clone(),
            high_priority: bucket(&prediction.recommendations, 1),
            medium_priority: bucket(&prediction.recommendations, 2),
            low_priority: bucket(&prediction.recommendations, 3),
            timeline,
        },
        student_info: StudentProfile {
            name: student.name.clone(),
            gender: student.gender.clone(),
            nationality: student.nationality.clone(),
            age: student.age,
            grades: SubjectGrades {
                english: student.english_grade,
                math: student.math_grade,
                science: student.sciences_grade,
                language: student.language_grade,
            },
            application: ApplicationRatings {
                portfolio: student.portfolio_rating,
                cover_letter: student.coverletter_rating,
                references: student.refletter_rating,
            },
        },
        model_info: ModelInfo {
            prediction_models,
            ensemble_score: prediction.score,
            prediction_date: now,
        },
    }
}

fn bucket(recommendations: &[Recommendation], priority: i32) -> Vec<Recommendation> {
    recommendations
        .iter()
        .filter(|rec| rec.priority == priority)
        .cloned()
        .collect()
}

pub fn derive_swot(breakdown: &FeatureBreakdown, overall: f64) -> SwotAnalysis {
    let mut swot = SwotAnalysis::default();

    if breakdown.academic_strength >= 3.5 {
        swot.strengths
            .push("Strong academic performance across subjects".to_string());
    }
    if breakdown.application_strength >= 3.5 {
        swot.strengths
            .push("Well-prepared application materials".to_string());
    }
    if breakdown.extracurricular_score >= 3.0 {
        swot.strengths
            .push("Good extracurricular involvement".to_string());
    }
    if breakdown.attendance_rate >= 0.85 {
        swot.strengths.push("Excellent attendance record".to_string());
    }
    if overall >= 80.0 {
        swot.strengths
            .push("Overall high performance potential".to_string());
    }

    if breakdown.academic_strength < 3.0 {
        swot.weaknesses
            .push("Academic performance needs improvement".to_string());
    }
    if breakdown.application_strength < 3.0 {
        swot.weaknesses
            .push("Application materials need enhancement".to_string());
    }
    if breakdown.extracurricular_score < 2.5 {
        swot.weaknesses
            .push("Limited extracurricular activities".to_string());
    }
    if breakdown.attendance_rate < 0.8 {
        swot.weaknesses
            .push("Attendance requires attention".to_string());
    }

    swot.opportunities
        .push("Personalized tutoring programs available".to_string());
    swot.opportunities
        .push("Access to academic support resources".to_string());
    swot.opportunities
        .push("Extracurricular development programs".to_string());
    swot.opportunities
        .push("College application workshops".to_string());

    if overall < 70.0 {
        swot.threats
            .push("Risk of academic underperformance".to_string());
    }
    if breakdown.attendance_rate < 0.75 {
        swot.threats
            .push("Attendance issues may impact learning".to_string());
    }

    swot
}

pub fn build_timeline(
    recommendations: &[Recommendation],
    now: DateTime<Utc>,
) -> Vec<TimelineEntry> {
    let base = now.date_naive();

    recommendations
        .iter()
        .enumerate()
        .map(|(index, rec)| TimelineEntry {
            intervention: rec.title.clone(),
            priority: rec.priority,
            duration: rec
                .duration
                .clone()
                .unwrap_or_else(|| DEFAULT_DURATION.to_string()),
            start_date: base + Duration::weeks(index as i64),
            tasks: rec.resources.clone(),
        })
        .collect()
}

pub fn render_markdown(report: &ReportDocument) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", report.metadata.title);
    let _ = writeln!(
        output,
        "Generated {} by {}",
        report.metadata.generated_at.format("%Y-%m-%d %H:%M UTC"),
        report.metadata.generated_by
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Scores");
    let _ = writeln!(
        output,
        "- Overall {:.1} (grade {}, {} risk, confidence {:.0}%)",
        report.scores.overall,
        report.scores.grade,
        report.scores.risk_level,
        report.scores.confidence
    );
    let _ = writeln!(
        output,
        "- Academic {:.1}, application {:.1}, extracurricular {:.1}, attendance {:.0}%",
        report.scores.breakdown.academic_strength,
        report.scores.breakdown.application_strength,
        report.scores.breakdown.extracurricular_score,
        report.scores.breakdown.attendance_rate * 100.0
    );

    write_swot_section(&mut output, "Strengths", &report.analysis.strengths);
    write_swot_section(&mut output, "Weaknesses", &report.analysis.weaknesses);
    write_swot_section(&mut output, "Opportunities", &report.analysis.opportunities);
    write_swot_section(&mut output, "Threats", &report.analysis.threats);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommended Interventions");

    if report.recommendations.all.is_empty() {
        let _ = writeln!(output, "No interventions recommended.");
    } else {
        for rec in report.recommendations.all.iter() {
            let _ = writeln!(
                output,
                "- P{} {}: {}",
                rec.priority, rec.title, rec.description
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Intervention Timeline");

    if report.recommendations.timeline.is_empty() {
        let _ = writeln!(output, "No scheduled interventions.");
    } else {
        for entry in report.recommendations.timeline.iter() {
            let _ = writeln!(
                output,
                "- {}: {} (P{}, {})",
                entry.start_date, entry.intervention, entry.priority, entry.duration
            );
        }
    }

    output
}

fn write_swot_section(output: &mut String, heading: &str, entries: &[String]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {heading}");

    if entries.is_empty() {
        let _ = writeln!(output, "Nothing flagged.");
    } else {
        for entry in entries.iter() {
            let _ = writeln!(output, "- {entry}");
        }
    }
}

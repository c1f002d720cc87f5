use std::collections::HashMap;

use crate::models::{
    FeatureBreakdown, Grade, PredictionResult, Recommendation, RiskLevel, StudentInput,
};

pub const MAX_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub academic_strength: f64,
    pub academic_consistency: f64,
    pub application_strength: f64,
    pub extracurricular_score: f64,
    pub attendance_rate: f64,
    pub performance_index: f64,
}

pub fn derive_features(student: &StudentInput) -> FeatureSet {
    let grades = [
        student.english_grade,
        student.math_grade,
        student.sciences_grade,
        student.language_grade,
    ];
    let academic_strength = mean(&grades);
    let academic_consistency = std_dev(&grades, academic_strength);

    let ratings = [
        student.portfolio_rating as f64,
        student.coverletter_rating as f64,
        student.refletter_rating as f64,
    ];
    let application_strength = mean(&ratings);

    let extracurricular_score = student.extracurricular_level as f64 * 0.8;
    let attendance_rate = student.attendance_rate;

    let performance_index = ((academic_strength * 0.4
        + application_strength * 0.3
        + attendance_rate * 0.3)
        * 20.0)
        .clamp(0.0, 100.0);

    FeatureSet {
        academic_strength,
        academic_consistency,
        application_strength,
        extracurricular_score,
        attendance_rate,
        performance_index,
    }
}

pub fn predict(student: &StudentInput) -> PredictionResult {
    let features = derive_features(student);
    let score = features.performance_index;
    let confidence = (100.0 - features.academic_consistency * 10.0).max(30.0);

    let mut model_predictions = HashMap::new();
    model_predictions.insert("performance_index".to_string(), score);

    PredictionResult {
        score,
        grade: Grade::for_score(score),
        risk_level: RiskLevel::for_score(score),
        confidence,
        feature_analysis: FeatureBreakdown {
            academic_strength: features.academic_strength,
            application_strength: features.application_strength,
            extracurricular_score: features.extracurricular_score,
            attendance_rate: features.attendance_rate,
        },
        recommendations: recommend(score, &features),
        model_predictions,
    }
}

pub fn recommend(score: f64, features: &FeatureSet) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if features.academic_strength < 3.0 {
        recommendations.push(Recommendation {
            category: "academic_support".to_string(),
            title: "Academic Tutoring Program".to_string(),
            description: "Weekly tutoring sessions in weak subjects".to_string(),
            priority: 1,
            duration: Some("8 weeks".to_string()),
            resources: vec![
                "Tutor matching".to_string(),
                "Study materials".to_string(),
                "Progress tracking".to_string(),
            ],
        });
    }

    if features.attendance_rate < 0.8 {
        recommendations.push(Recommendation {
            category: "attendance_monitoring".to_string(),
            title: "Attendance Improvement Plan".to_string(),
            description: "Daily monitoring and support".to_string(),
            priority: 1,
            duration: Some("12 weeks".to_string()),
            resources: vec![
                "Daily check-ins".to_string(),
                "Parent notifications".to_string(),
                "Incentive program".to_string(),
            ],
        });
    }

    if features.extracurricular_score < 2.4 {
        recommendations.push(Recommendation {
            category: "extracurricular_guidance".to_string(),
            title: "Extracurricular Development".to_string(),
            description: "Guidance on building meaningful activities".to_string(),
            priority: 3,
            duration: Some("Ongoing".to_string()),
            resources: vec![
                "Club recommendations".to_string(),
                "Leadership opportunities".to_string(),
            ],
        });
    }

    if features.application_strength < 3.5 {
        recommendations.push(Recommendation {
            category: "application_workshop".to_string(),
            title: "Application Enhancement".to_string(),
            description: "Improve portfolio and recommendation letters".to_string(),
            priority: 2,
            duration: Some("2 weeks".to_string()),
            resources: vec![
                "Portfolio review".to_string(),
                "Writing assistance".to_string(),
                "Mock interviews".to_string(),
            ],
        });
    }

    if score < 60.0 {
        recommendations.push(Recommendation {
            category: "intensive_intervention".to_string(),
            title: "Comprehensive Support Program".to_string(),
            description: "Multi-faceted intervention for at-risk students".to_string(),
            priority: 1,
            duration: Some("16 weeks".to_string()),
            resources: vec![
                "Academic counseling".to_string(),
                "Mental health support".to_string(),
                "Career guidance".to_string(),
            ],
        });
    }

    recommendations.sort_by_key(|rec| rec.priority);
    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// Population standard deviation.
fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(grades: [f64; 4], ratings: [i32; 3], attendance: f64, level: i32) -> StudentInput {
        StudentInput {
            name: "Test Student".to_string(),
            english_grade: grades[0],
            math_grade: grades[1],
            sciences_grade: grades[2],
            language_grade: grades[3],
            portfolio_rating: ratings[0],
            coverletter_rating: ratings[1],
            refletter_rating: ratings[2],
            attendance_rate: attendance,
            extracurricular_level: level,
            ..StudentInput::default()
        }
    }

    #[test]
    fn grade_boundaries_match_score_bands() {
        assert_eq!(Grade::for_score(95.0), Grade::A);
        assert_eq!(Grade::for_score(90.0), Grade::A);
        assert_eq!(Grade::for_score(89.9), Grade::B);
        assert_eq!(Grade::for_score(80.0), Grade::B);
        assert_eq!(Grade::for_score(70.0), Grade::C);
        assert_eq!(Grade::for_score(60.0), Grade::D);
        assert_eq!(Grade::for_score(59.9), Grade::F);
    }

    #[test]
    fn risk_boundaries_match_score_bands() {
        assert_eq!(RiskLevel::for_score(85.0), RiskLevel::Low);
        assert_eq!(RiskLevel::for_score(75.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::for_score(65.0), RiskLevel::High);
        assert_eq!(RiskLevel::for_score(50.0), RiskLevel::Critical);
        assert!(RiskLevel::High.is_elevated());
        assert!(!RiskLevel::Medium.is_elevated());
    }

    #[test]
    fn features_follow_the_aggregation_formulas() {
        let features = derive_features(&student([4.0, 4.0, 4.0, 4.0], [4, 4, 4], 0.9, 3));

        assert!((features.academic_strength - 4.0).abs() < 1e-9);
        assert!((features.academic_consistency - 0.0).abs() < 1e-9);
        assert!((features.application_strength - 4.0).abs() < 1e-9);
        assert!((features.extracurricular_score - 2.4).abs() < 1e-9);
        let expected = (4.0 * 0.4 + 4.0 * 0.3 + 0.9 * 0.3) * 20.0;
        assert!((features.performance_index - expected).abs() < 1e-9);
    }

    #[test]
    fn consistent_grades_give_full_confidence() {
        let prediction = predict(&student([3.5, 3.5, 3.5, 3.5], [4, 4, 4], 0.9, 4));
        assert!((prediction.confidence - 100.0).abs() < 1e-9);

        let spread = predict(&student([5.0, 1.0, 5.0, 1.0], [4, 4, 4], 0.9, 4));
        assert!(spread.confidence < prediction.confidence);
        assert!(spread.confidence >= 30.0);
    }

    #[test]
    fn weak_profile_triggers_every_rule_sorted_by_priority() {
        let weak = student([2.5, 2.4, 2.6, 2.5], [3, 3, 3], 0.7, 2);
        let features = derive_features(&weak);
        let recommendations = recommend(features.performance_index, &features);

        assert_eq!(recommendations.len(), MAX_RECOMMENDATIONS);
        let priorities: Vec<i32> = recommendations.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![1, 1, 1, 2, 3]);
        assert_eq!(recommendations[0].title, "Academic Tutoring Program");
        assert_eq!(recommendations[1].title, "Attendance Improvement Plan");
        assert_eq!(recommendations[2].title, "Comprehensive Support Program");
    }

    #[test]
    fn strong_profile_needs_no_interventions() {
        let prediction = predict(&student([4.5, 4.5, 4.5, 4.5], [5, 5, 5], 0.95, 4));

        assert!(prediction.recommendations.is_empty());
        assert_eq!(prediction.risk_level, RiskLevel::Medium);
        assert_eq!(
            prediction.model_predictions.get("performance_index"),
            Some(&prediction.score)
        );
    }

    #[test]
    fn prediction_breakdown_mirrors_derived_features() {
        let input = student([3.0, 3.5, 2.5, 3.0], [2, 3, 4], 0.82, 3);
        let features = derive_features(&input);
        let prediction = predict(&input);

        assert_eq!(
            prediction.feature_analysis.academic_strength,
            features.academic_strength
        );
        assert_eq!(
            prediction.feature_analysis.application_strength,
            features.application_strength
        );
        assert_eq!(
            prediction.feature_analysis.extracurricular_score,
            features.extracurricular_score
        );
        assert_eq!(prediction.feature_analysis.attendance_rate, 0.82);
        assert_eq!(prediction.score, features.performance_index);
    }
}

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    GradeSlice, InterventionRow, PredictionResult, PredictionRow, RiskSlice, StudentInput,
    SummaryStats,
};
use crate::predict;

pub const INTERVENTION_STATUSES: [&str; 3] = ["pending", "active", "completed"];

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn record_prediction(
    pool: &PgPool,
    student: &StudentInput,
    prediction: &PredictionResult,
    now: DateTime<Utc>,
) -> anyhow::Result<Uuid> {
    let student_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO student_performance.students
        (id, name, gender, nationality, age, english_grade, math_grade,
         sciences_grade, language_grade, portfolio_rating, coverletter_rating,
         refletter_rating, attendance_rate, extracurricular_level, ethnic_group,
         predicted_score, predicted_grade, risk_level, confidence, predicted_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        "#,
    )
    .bind(student_id)
    .bind(&student.name)
    .bind(&student.gender)
    .bind(&student.nationality)
    .bind(student.age)
    .bind(student.english_grade)
    .bind(student.math_grade)
    .bind(student.sciences_grade)
    .bind(student.language_grade)
    .bind(student.portfolio_rating)
    .bind(student.coverletter_rating)
    .bind(student.refletter_rating)
    .bind(student.attendance_rate)
    .bind(student.extracurricular_level)
    .bind(&student.ethnic_group)
    .bind(prediction.score)
    .bind(prediction.grade.as_str())
    .bind(prediction.risk_level.as_str())
    .bind(prediction.confidence)
    .bind(now)
    .execute(pool)
    .await?;

    for rec in prediction.recommendations.iter() {
        let resources = serde_json::to_string(&rec.resources)?;

        sqlx::query(
            r#"
            INSERT INTO student_performance.interventions
            (id, student_id, category, title, description, priority,
             duration, status, resources, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(&rec.category)
        .bind(&rec.title)
        .bind(&rec.description)
        .bind(rec.priority)
        .bind(rec.duration.as_deref())
        .bind(resources)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(student_id)
}

pub async fn fetch_recent(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<PredictionRow>> {
    let rows = sqlx::query(
        "SELECT id, name, predicted_score, predicted_grade, risk_level, confidence, \
         predicted_at \
         FROM student_performance.students \
         ORDER BY predicted_at DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut predictions = Vec::new();

    for row in rows {
        predictions.push(PredictionRow {
            student_id: row.get("id"),
            name: row.get("name"),
            predicted_score: row.get("predicted_score"),
            predicted_grade: row.get("predicted_grade"),
            risk_level: row.get("risk_level"),
            confidence: row.get("confidence"),
            predicted_at: row.get("predicted_at"),
        });
    }

    Ok(predictions)
}

pub async fn fetch_summary(pool: &PgPool) -> anyhow::Result<SummaryStats> {
    let students = sqlx::query(
        "SELECT COUNT(*) AS total_students, \
         COALESCE(AVG(predicted_score), 0) AS average_score, \
         COALESCE(SUM(CASE WHEN risk_level IN ('High', 'Critical') THEN 1 ELSE 0 END), 0) \
             AS high_risk_count \
         FROM student_performance.students",
    )
    .fetch_one(pool)
    .await?;

    let interventions = sqlx::query(
        "SELECT COUNT(*) AS intervention_count FROM student_performance.interventions",
    )
    .fetch_one(pool)
    .await?;

    Ok(SummaryStats {
        total_students: students.get("total_students"),
        average_score: students.get("average_score"),
        high_risk_count: students.get("high_risk_count"),
        intervention_count: interventions.get("intervention_count"),
    })
}

pub async fn fetch_risk_distribution(pool: &PgPool) -> anyhow::Result<Vec<RiskSlice>> {
    let rows = sqlx::query(
        "SELECT risk_level, COUNT(*) AS count \
         FROM student_performance.students \
         GROUP BY risk_level \
         ORDER BY count DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RiskSlice {
            risk_level: row.get("risk_level"),
            count: row.get("count"),
        })
        .collect())
}

pub async fn fetch_grade_distribution(pool: &PgPool) -> anyhow::Result<Vec<GradeSlice>> {
    let rows = sqlx::query(
        "SELECT predicted_grade, COUNT(*) AS count \
         FROM student_performance.students \
         GROUP BY predicted_grade \
         ORDER BY predicted_grade",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| GradeSlice {
            grade: row.get("predicted_grade"),
            count: row.get("count"),
        })
        .collect())
}

pub async fn fetch_interventions(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<InterventionRow>> {
    let mut query = String::from(
        "SELECT i.id, s.name AS student_name, i.category, i.title, i.priority, \
         i.status, i.created_at \
         FROM student_performance.interventions i \
         JOIN student_performance.students s ON s.id = i.student_id",
    );

    if status.is_some() {
        query.push_str(" WHERE i.status = $1 ORDER BY i.created_at DESC LIMIT $2");
    } else {
        query.push_str(" ORDER BY i.created_at DESC LIMIT $1");
    }

    let mut rows = sqlx::query(&query);

    if let Some(value) = status {
        rows = rows.bind(value);
    }
    rows = rows.bind(limit);

    let records = rows.fetch_all(pool).await?;
    let mut interventions = Vec::new();

    for row in records {
        interventions.push(InterventionRow {
            id: row.get("id"),
            student_name: row.get("student_name"),
            category: row.get("category"),
            title: row.get("title"),
            priority: row.get("priority"),
            status: row.get("status"),
            created_at: row.get("created_at"),
        });
    }

    Ok(interventions)
}

pub async fn update_intervention_status(
    pool: &PgPool,
    id: Uuid,
    status: &str,
) -> anyhow::Result<()> {
    if !INTERVENTION_STATUSES.contains(&status) {
        anyhow::bail!(
            "unknown status {status:?}, expected one of: {}",
            INTERVENTION_STATUSES.join(", ")
        );
    }

    let result = sqlx::query(
        "UPDATE student_performance.interventions SET status = $1 WHERE id = $2",
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("no intervention found with id {id}");
    }

    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        StudentInput {
            name: "Maria Garcia".to_string(),
            gender: "F".to_string(),
            nationality: "Spain".to_string(),
            age: 20,
            english_grade: 4.5,
            math_grade: 4.2,
            sciences_grade: 4.6,
            language_grade: 4.8,
            portfolio_rating: 5,
            coverletter_rating: 4,
            refletter_rating: 5,
            attendance_rate: 0.96,
            extracurricular_level: 4,
            ..StudentInput::default()
        },
        StudentInput {
            name: "John Smith".to_string(),
            gender: "M".to_string(),
            nationality: "United States of America".to_string(),
            age: 21,
            english_grade: 3.4,
            math_grade: 3.1,
            sciences_grade: 3.6,
            language_grade: 3.3,
            attendance_rate: 0.86,
            ..StudentInput::default()
        },
        StudentInput {
            name: "David Chen".to_string(),
            gender: "M".to_string(),
            nationality: "China".to_string(),
            age: 22,
            english_grade: 2.4,
            math_grade: 2.8,
            sciences_grade: 2.2,
            language_grade: 2.6,
            portfolio_rating: 2,
            coverletter_rating: 2,
            refletter_rating: 3,
            attendance_rate: 0.68,
            extracurricular_level: 1,
            ..StudentInput::default()
        },
    ];

    for student in students {
        let prediction = predict::predict(&student);
        record_prediction(pool, &student, &prediction, Utc::now()).await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut imported = 0usize;

    for result in reader.deserialize::<StudentInput>() {
        let student = result?;
        let prediction = predict::predict(&student);
        record_prediction(pool, &student, &prediction, Utc::now()).await?;
        imported += 1;
    }

    Ok(imported)
}

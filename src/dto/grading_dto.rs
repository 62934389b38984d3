use serde::{Deserialize, Serialize};
use validator::Validate;

/// One question/answer pair sent to the grader. `id` is echoed back with the grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingItem {
    pub id: usize,
    pub question: String,
    pub correct_answer: Option<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingRequest {
    pub assessment_name: String,
    pub marks_per_question: f64,
    pub full_marks: f64,
    pub items: Vec<GradingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionGrade {
    #[serde(alias = "question")]
    pub id: usize,
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    #[serde(default)]
    pub grades: Vec<QuestionGrade>,
    #[serde(default)]
    pub total_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGradeResult {
    pub username: String,
    pub name: String,
    pub total_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grades: Option<Vec<QuestionGrade>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeResponse {
    pub success: bool,
    pub results: Vec<StudentGradeResult>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveMarksPayload {
    #[validate(length(min = 1, message = "Username required"))]
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub marks: serde_json::Value,
}

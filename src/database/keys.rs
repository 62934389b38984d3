pub const ASSESSMENTS: &str = "assessments";
pub const USERS: &str = "users";

pub fn assessment_messages(assessment_id: &str, username: &str) -> String {
    format!("assessment_messages:{}:{}", assessment_id, username)
}

pub fn assessment_marks(assessment_id: &str) -> String {
    format!("assessment_marks:{}", assessment_id)
}

pub fn competency(username: &str) -> String {
    format!("competency:{}", username)
}

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::dto::grading_dto::{
    GradeReport, GradingItem, GradingRequest, QuestionGrade, StudentGradeResult,
};
use crate::error::Result;
use crate::models::assessment::Assessment;
use crate::services::event_service::EventService;
use crate::services::marks_service::MarksService;
use crate::services::session_service::{QuestionGroup, SessionReconstructor};
use crate::services::user_service::UserService;

/// Scores a student's answers against the assessment's questions.
#[async_trait]
pub trait Grader: Send + Sync {
    /// `false` when credentials are missing; grading is refused up front.
    fn is_configured(&self) -> bool;

    async fn grade(&self, request: &GradingRequest) -> Result<GradeReport>;
}

/// Groups with something gradable, in reconstruction order. Voice answers only
/// count when transcribed.
pub fn grading_items(groups: &[QuestionGroup]) -> Vec<GradingItem> {
    groups
        .iter()
        .filter_map(|group| {
            let answers: Vec<&str> = group.answers.iter().filter_map(|a| a.answer_text()).collect();
            if answers.is_empty() {
                return None;
            }
            let question = group.question.clone().unwrap_or_else(|| match group.video_index {
                Some(vi) => format!("Question {}", vi + 1),
                None => "Assessment Question".to_string(),
            });
            Some((question, group.correct_answer.clone(), answers.join(" ")))
        })
        .enumerate()
        .map(|(i, (question, correct_answer, answer))| GradingItem {
            id: i + 1,
            question,
            correct_answer,
            answer,
        })
        .collect()
}

/// Keeps one grade per known item id, in item order, and totals them unless the
/// grader supplied its own total.
pub fn reconcile(items: &[GradingItem], report: GradeReport) -> (Vec<QuestionGrade>, f64) {
    let mut by_id: BTreeMap<usize, QuestionGrade> = BTreeMap::new();
    for grade in report.grades {
        if items.iter().any(|item| item.id == grade.id) {
            by_id.entry(grade.id).or_insert(grade);
        } else {
            tracing::warn!(question_id = grade.id, "grader returned an unknown question id");
        }
    }
    let grades: Vec<QuestionGrade> = by_id.into_values().collect();
    let total = report
        .total_score
        .unwrap_or_else(|| grades.iter().map(|g| g.score).sum());
    (grades, total)
}

#[derive(Clone)]
pub struct GradingService {
    events: EventService,
    marks: MarksService,
    users: UserService,
}

impl GradingService {
    pub fn new(events: EventService, marks: MarksService, users: UserService) -> Self {
        Self {
            events,
            marks,
            users,
        }
    }

    /// Grades every student with at least one response. A grader failure is
    /// recorded against that student only; the marks sheet is written once.
    pub async fn grade_assessment(
        &self,
        assessment: &Assessment,
        grader: &dyn Grader,
    ) -> Result<Vec<StudentGradeResult>> {
        let users = self.users.load().await?;
        let mut sheet = self.marks.sheet(&assessment.id).await?;
        let marks_per_question = assessment.marks_per_question();
        let question_count = assessment
            .videos
            .iter()
            .filter(|v| v.question_text().is_some())
            .count()
            .max(1);
        let full_marks = assessment.full_marks.unwrap_or(question_count as f64);

        let mut results = Vec::new();
        for user in users.students() {
            let username = user.username();
            let events = self.events.list(&assessment.id, &username).await?;
            if !events.iter().any(|e| e.is_answer()) {
                continue;
            }

            let groups = SessionReconstructor::groups(&events, &assessment.videos);
            let items = grading_items(&groups);
            if items.is_empty() {
                continue;
            }

            let request = GradingRequest {
                assessment_name: assessment.name.clone(),
                marks_per_question,
                full_marks,
                items,
            };
            match grader.grade(&request).await {
                Ok(report) => {
                    let (grades, total) = reconcile(&request.items, report);
                    sheet.insert(username.clone(), Some(total));
                    results.push(StudentGradeResult {
                        username,
                        name: user.display_name(),
                        total_score: Some(total),
                        grades: Some(grades),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::error!(username = %username, error = %e, "AI grading failed");
                    results.push(StudentGradeResult {
                        username,
                        name: user.display_name(),
                        total_score: None,
                        grades: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        self.marks.save_sheet(&assessment.id, &sheet).await?;
        tracing::info!(
            assessment_id = %assessment.id,
            graded = results.iter().filter(|r| r.error.is_none()).count(),
            failed = results.iter().filter(|r| r.error.is_some()).count(),
            "AI grading finished"
        );
        Ok(results)
    }
}

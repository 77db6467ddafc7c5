use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{bson_datetime_as_chrono, bson_datetime_as_chrono_option};
use crate::models::UserRole;

/// Recognized question types. Unknown types never reach the domain layer;
/// they fail JSON deserialization and surface as a validation error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
    #[serde(rename = "mcq")]
    Mcq,
    #[serde(rename = "true-false")]
    TrueFalse,
    #[serde(rename = "free-text")]
    FreeText,
}

impl QuestionType {
    /// Objective types are auto-scored; free-text never is.
    pub fn is_objective(&self) -> bool {
        matches!(self, QuestionType::Mcq | QuestionType::TrueFalse)
    }

    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::Mcq => "mcq",
            QuestionType::TrueFalse => "true-false",
            QuestionType::FreeText => "free-text",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

/// A gradable unit embedded in an assignment. Position in the questions
/// sequence is its identity; answers reference it by index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(rename = "questionText")]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(rename = "maxMarks", default, skip_serializing_if = "Option::is_none")]
    pub max_marks: Option<f64>,
}

impl Question {
    /// Marks awarded on a correct answer; absent maxMarks means weight 1.
    pub fn weight(&self) -> f64 {
        self.max_marks.unwrap_or(1.0)
    }

    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.options.iter().find(|opt| opt.is_correct)
    }
}

/// One answered question, addressing the assignment's question sequence by
/// position. An out-of-range index rejects the whole submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "questionIndex")]
    pub question_index: usize,
    pub answer: String,
}

/// One student's answer set, embedded in the assignment aggregate.
/// `marks` is None until auto-scoring produces a positive total or an
/// instructor overrides it manually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub student: ObjectId,
    pub answers: Vec<Answer>,
    pub marks: Option<f64>,
    #[serde(rename = "submittedAt", with = "bson_datetime_as_chrono")]
    pub submitted_at: DateTime<Utc>,
}

/// Assignment aggregate: one document in the "assignments" collection.
/// Questions are fixed at creation; submissions grow by append only and the
/// aggregate exclusively owns both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub course: ObjectId,
    pub instructor: ObjectId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub deadline: Option<DateTime<Utc>>,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// RFC 3339 timestamp or plain date; absent means no deadline enforcement
    pub deadline: Option<String>,

    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAssignmentRequest {
    pub answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMarksRequest {
    pub marks: f64,
}

/// Client-facing projection of the aggregate. For students the submissions
/// field is redacted to their own submission; view-level only, the stored
/// aggregate is untouched.
#[derive(Debug, Serialize)]
pub struct AssignmentView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub course: String,
    pub instructor: String,
    pub deadline: Option<DateTime<Utc>>,
    pub questions: Vec<Question>,
    pub submissions: Vec<SubmissionSummary>,
}

impl AssignmentView {
    pub fn for_caller(assignment: Assignment, role: UserRole, caller: ObjectId) -> Self {
        let submissions: Vec<SubmissionSummary> = match role {
            UserRole::Instructor | UserRole::Admin => assignment
                .submissions
                .iter()
                .cloned()
                .map(SubmissionSummary::from)
                .collect(),
            UserRole::Student => assignment
                .submissions
                .iter()
                .filter(|sub| sub.student == caller)
                .cloned()
                .map(SubmissionSummary::from)
                .collect(),
        };

        AssignmentView {
            id: assignment.id.to_hex(),
            title: assignment.title,
            description: assignment.description,
            course: assignment.course.to_hex(),
            instructor: assignment.instructor.to_hex(),
            deadline: assignment.deadline,
            questions: assignment.questions,
            submissions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionSummary {
    pub id: String,
    pub student: String,
    pub answers: Vec<Answer>,
    pub marks: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionSummary {
    fn from(sub: Submission) -> Self {
        SubmissionSummary {
            id: sub.id.to_hex(),
            student: sub.student.to_hex(),
            answers: sub.answers,
            marks: sub.marks,
            submitted_at: sub.submitted_at,
        }
    }
}

/// Grading view: answers joined with question text/type/maxMarks resolved
/// against the aggregate's question sequence at read time.
#[derive(Debug, Serialize)]
pub struct AnsweredQuestionView {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub answer: String,
    #[serde(rename = "maxMarks")]
    pub max_marks: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionView {
    pub id: String,
    pub student_name: String,
    pub submitted_at: DateTime<Utc>,
    pub marks: Option<f64>,
    pub answers: Vec<AnsweredQuestionView>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionsResponse {
    pub assignment_title: String,
    pub submissions: Vec<SubmissionView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_types_use_wire_names() {
        assert_eq!(
            serde_json::to_string(&QuestionType::TrueFalse).unwrap(),
            "\"true-false\""
        );
        assert_eq!(
            serde_json::from_str::<QuestionType>("\"free-text\"").unwrap(),
            QuestionType::FreeText
        );
        assert!(serde_json::from_str::<QuestionType>("\"essay\"").is_err());
    }

    #[test]
    fn question_weight_defaults_to_one() {
        let question = Question {
            question_type: QuestionType::Mcq,
            question_text: "2+2=?".to_string(),
            options: vec![QuestionOption {
                text: "4".to_string(),
                is_correct: true,
            }],
            max_marks: None,
        };
        assert_eq!(question.weight(), 1.0);
    }

    #[test]
    fn student_view_redacts_other_submissions() {
        let student_a = ObjectId::new();
        let student_b = ObjectId::new();
        let submission = |student: ObjectId| Submission {
            id: ObjectId::new(),
            student,
            answers: vec![],
            marks: None,
            submitted_at: Utc::now(),
        };
        let assignment = Assignment {
            id: ObjectId::new(),
            title: "Quiz".to_string(),
            description: String::new(),
            course: ObjectId::new(),
            instructor: ObjectId::new(),
            deadline: None,
            questions: vec![],
            submissions: vec![submission(student_a), submission(student_b)],
            created_at: Utc::now(),
        };

        let view = AssignmentView::for_caller(assignment.clone(), UserRole::Student, student_a);
        assert_eq!(view.submissions.len(), 1);
        assert_eq!(view.submissions[0].student, student_a.to_hex());

        let view = AssignmentView::for_caller(assignment, UserRole::Instructor, ObjectId::new());
        assert_eq!(view.submissions.len(), 2);
    }
}

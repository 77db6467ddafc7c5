use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson};
use mongodb::{Collection, Database};

use crate::error::ApiError;
use crate::metrics::{ASSIGNMENTS_CREATED_TOTAL, MARK_OVERRIDES_TOTAL, SUBMISSIONS_TOTAL};
use crate::middlewares::auth::JwtClaims;
use crate::models::assignment::{AnsweredQuestionView, Submission, SubmissionView};
use crate::models::{
    parse_object_id, Answer, Assignment, AssignmentView, Course, CreateAssignmentRequest,
    Question, QuestionType, SubmissionsResponse, SubmitAssignmentRequest, User, UserRole,
};

pub struct AssignmentService {
    mongo: Database,
}

impl AssignmentService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn assignments(&self) -> Collection<Assignment> {
        self.mongo.collection("assignments")
    }

    fn courses(&self) -> Collection<Course> {
        self.mongo.collection("courses")
    }

    fn users(&self) -> Collection<User> {
        self.mongo.collection("users")
    }

    /// Creates an assignment for a course. Caller must be admin or the
    /// instructor the course is assigned to. Nothing is persisted unless
    /// every question passes validation.
    pub async fn create(
        &self,
        claims: &JwtClaims,
        course_id: &str,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment, ApiError> {
        let course_oid = parse_object_id(course_id, "course")?;
        let course = self
            .courses()
            .find_one(doc! { "_id": course_oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))?;

        let caller = claims.object_id()?;
        if claims.role != UserRole::Admin && course.assigned_to != Some(caller) {
            return Err(ApiError::forbidden(
                "Only the assigned instructor or admin can create assignments",
            ));
        }

        validate_questions(&req.questions)?;

        let deadline = match req.deadline.as_deref() {
            Some(raw) => Some(parse_deadline(raw)?),
            None => None,
        };

        let assignment = Assignment {
            id: ObjectId::new(),
            title: req.title,
            description: req.description,
            course: course_oid,
            instructor: caller,
            deadline,
            questions: req.questions,
            submissions: Vec::new(),
            created_at: Utc::now(),
        };

        self.assignments().insert_one(&assignment).await?;

        ASSIGNMENTS_CREATED_TOTAL
            .with_label_values(&[claims.role.as_str()])
            .inc();
        tracing::info!(
            "Assignment {} created for course {} by {}",
            assignment.id.to_hex(),
            course_id,
            claims.sub
        );

        Ok(assignment)
    }

    /// All assignments of a course, with the submissions field redacted to
    /// the caller's own submission for student callers.
    pub async fn list_by_course(
        &self,
        claims: &JwtClaims,
        course_id: &str,
    ) -> Result<Vec<AssignmentView>, ApiError> {
        let course_oid = parse_object_id(course_id, "course")?;
        self.courses()
            .find_one(doc! { "_id": course_oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))?;

        let caller = claims.object_id()?;
        let mut cursor = self.assignments().find(doc! { "course": course_oid }).await?;

        let mut views = Vec::new();
        while let Some(assignment) = cursor.try_next().await? {
            views.push(AssignmentView::for_caller(assignment, claims.role, caller));
        }

        Ok(views)
    }

    /// Deadline-gated submission with automatic scoring of objective
    /// question types. Precondition failures reject before any write.
    pub async fn submit(
        &self,
        claims: &JwtClaims,
        assignment_id: &str,
        req: SubmitAssignmentRequest,
    ) -> Result<Submission, ApiError> {
        let oid = parse_object_id(assignment_id, "assignment")?;
        let assignment = self
            .assignments()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

        if claims.role != UserRole::Student {
            return Err(ApiError::forbidden("Only students can submit assignments"));
        }

        if let Some(deadline) = assignment.deadline {
            if Utc::now() > deadline {
                return Err(ApiError::conflict("Submission deadline has passed"));
            }
        }

        let student = claims.object_id()?;
        if assignment
            .submissions
            .iter()
            .any(|sub| sub.student == student)
        {
            return Err(ApiError::conflict(
                "You have already submitted this assignment",
            ));
        }

        let marks = score_answers(&assignment.questions, &req.answers)?;

        let submission = Submission {
            id: ObjectId::new(),
            student,
            answers: req.answers,
            marks,
            submitted_at: Utc::now(),
        };

        // The duplicate-submission invariant is also enforced at the storage
        // level: the filter refuses the append when a submission by this
        // student raced in between our read and this write.
        let submission_bson = to_bson(&submission).map_err(anyhow::Error::new)?;
        let result = self
            .assignments()
            .update_one(
                doc! { "_id": oid, "submissions.student": { "$ne": student } },
                doc! { "$push": { "submissions": submission_bson } },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::conflict(
                "You have already submitted this assignment",
            ));
        }

        let scored_label = if submission.marks.is_some() {
            "true"
        } else {
            "false"
        };
        SUBMISSIONS_TOTAL.with_label_values(&[scored_label]).inc();
        tracing::info!(
            "Submission {} recorded for assignment {} by student {} (marks: {:?})",
            submission.id.to_hex(),
            assignment_id,
            claims.sub,
            submission.marks
        );

        Ok(submission)
    }

    /// Removes the aggregate; embedded submissions go with it atomically.
    pub async fn delete(&self, claims: &JwtClaims, assignment_id: &str) -> Result<(), ApiError> {
        let oid = parse_object_id(assignment_id, "assignment")?;
        let assignment = self
            .assignments()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

        self.ensure_grading_rights(
            claims,
            &assignment,
            "Only the instructor who created this assignment or an admin can delete it",
        )?;

        self.assignments().delete_one(doc! { "_id": oid }).await?;
        tracing::info!("Assignment {} deleted by {}", assignment_id, claims.sub);

        Ok(())
    }

    /// Manual grading overlay: replaces the computed score with the
    /// caller-supplied value. Deliberately no bounds check against the
    /// question maxima; instructors may award bonus marks.
    pub async fn set_marks(
        &self,
        claims: &JwtClaims,
        assignment_id: &str,
        submission_id: &str,
        marks: f64,
    ) -> Result<(), ApiError> {
        let oid = parse_object_id(assignment_id, "assignment")?;
        let sub_oid = parse_object_id(submission_id, "submission")?;

        let assignment = self
            .assignments()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

        self.ensure_grading_rights(
            claims,
            &assignment,
            "You are not authorized to update marks for this assignment",
        )?;

        if !assignment.submissions.iter().any(|sub| sub.id == sub_oid) {
            return Err(ApiError::not_found("Submission not found"));
        }

        self.assignments()
            .update_one(
                doc! { "_id": oid, "submissions._id": sub_oid },
                doc! { "$set": { "submissions.$.marks": marks } },
            )
            .await?;

        MARK_OVERRIDES_TOTAL
            .with_label_values(&[claims.role.as_str()])
            .inc();
        tracing::info!(
            "Marks for submission {} on assignment {} set to {} by {}",
            submission_id,
            assignment_id,
            marks,
            claims.sub
        );

        Ok(())
    }

    /// Grading view for instructors/admins: every stored submission with
    /// the submitter's display name and each answer joined to its question.
    pub async fn list_submissions(
        &self,
        claims: &JwtClaims,
        assignment_id: &str,
    ) -> Result<SubmissionsResponse, ApiError> {
        let oid = parse_object_id(assignment_id, "assignment")?;
        let assignment = self
            .assignments()
            .find_one(doc! { "_id": oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Assignment not found"))?;

        self.ensure_grading_rights(
            claims,
            &assignment,
            "You are not authorized to view submissions for this assignment",
        )?;

        let names = self.load_student_names(&assignment.submissions).await?;

        let submissions = assignment
            .submissions
            .iter()
            .map(|sub| SubmissionView {
                id: sub.id.to_hex(),
                student_name: names
                    .get(&sub.student)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                submitted_at: sub.submitted_at,
                marks: sub.marks,
                answers: sub
                    .answers
                    .iter()
                    .filter_map(|ans| {
                        // Question indices are validated at submission time,
                        // so a miss here means a corrupted aggregate.
                        let question = assignment.questions.get(ans.question_index)?;
                        Some(AnsweredQuestionView {
                            question: question.question_text.clone(),
                            question_type: question.question_type,
                            answer: ans.answer.clone(),
                            max_marks: question.max_marks,
                        })
                    })
                    .collect(),
            })
            .collect();

        Ok(SubmissionsResponse {
            assignment_title: assignment.title,
            submissions,
        })
    }

    async fn load_student_names(
        &self,
        submissions: &[Submission],
    ) -> Result<HashMap<ObjectId, String>, ApiError> {
        let student_ids: Vec<ObjectId> = submissions.iter().map(|sub| sub.student).collect();
        let mut names = HashMap::new();
        if student_ids.is_empty() {
            return Ok(names);
        }

        let mut cursor = self
            .users()
            .find(doc! { "_id": { "$in": student_ids } })
            .await?;
        while let Some(user) = cursor.try_next().await? {
            names.insert(user.id, user.name);
        }

        Ok(names)
    }

    /// Grading rights: admin, or the instructor recorded as the
    /// assignment's owner.
    fn ensure_grading_rights(
        &self,
        claims: &JwtClaims,
        assignment: &Assignment,
        message: &str,
    ) -> Result<(), ApiError> {
        if claims.role == UserRole::Admin {
            return Ok(());
        }
        if assignment.instructor == claims.object_id()? {
            return Ok(());
        }
        Err(ApiError::forbidden(message))
    }
}

/// Validates an ordered question sequence at authoring time. Pure; the
/// assignment is persisted only if every question passes.
pub fn validate_questions(questions: &[Question]) -> Result<(), ApiError> {
    if questions.is_empty() {
        return Err(ApiError::validation("At least one question is required"));
    }

    for question in questions {
        if question.question_text.is_empty() {
            return Err(ApiError::validation("Question text is required"));
        }

        if question.question_type.is_objective() {
            if question.options.is_empty() {
                return Err(ApiError::validation(format!(
                    "{} questions require options",
                    question.question_type.as_str()
                )));
            }
            if question.question_type == QuestionType::TrueFalse && question.options.len() != 2 {
                return Err(ApiError::validation(
                    "True/False questions must have exactly 2 options",
                ));
            }
            if !question.options.iter().any(|opt| opt.is_correct) {
                return Err(ApiError::validation(format!(
                    "{} questions must have at least one correct option",
                    question.question_type.as_str()
                )));
            }
        }

        if let Some(max_marks) = question.max_marks {
            if max_marks <= 0.0 {
                return Err(ApiError::validation("Max marks must be greater than 0"));
            }
        }
    }

    Ok(())
}

/// Auto-scoring: objective questions award their weight iff the answer
/// equals the text of the option flagged correct; free-text contributes 0.
/// A total of zero is stored as None so downstream grading can distinguish
/// "never scored" from a later manual zero.
pub fn score_answers(questions: &[Question], answers: &[Answer]) -> Result<Option<f64>, ApiError> {
    let mut total = 0.0;

    for answer in answers {
        let question = questions
            .get(answer.question_index)
            .ok_or_else(|| ApiError::validation("Invalid question index"))?;

        if question.question_type.is_objective() {
            if let Some(correct) = question.correct_option() {
                if correct.text == answer.answer {
                    total += question.weight();
                }
            }
        }
    }

    Ok(if total > 0.0 { Some(total) } else { None })
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(ApiError::validation(
        "Invalid deadline format, expected RFC 3339 timestamp or YYYY-MM-DD",
    ))
}

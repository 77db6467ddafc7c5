mod common;

use axum::http::StatusCode;
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use common::TestEnv;
use lms_api::models::UserRole;

struct GradedSetup {
    assignment_id: String,
    submission_id: String,
    course_id: ObjectId,
    instructor: ObjectId,
    student: ObjectId,
}

/// One assignment with one scored submission from one student.
async fn setup_with_submission(env: &TestEnv) -> GradedSetup {
    let instructor = env.seed_user("ada", UserRole::Instructor).await;
    let course = env.seed_course(Some(instructor)).await;
    let instructor_token = env.token_for(&instructor, UserRole::Instructor);

    let (status, body) = env
        .request(
            "POST",
            &format!("/api/v1/courses/{}/assignments", course.to_hex()),
            Some(&instructor_token),
            Some(json!({ "title": "Week 1 quiz", "questions": common::sample_questions() })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let assignment_id = body["assignment"]["id"].as_str().unwrap().to_string();

    let student = env.seed_user("sam", UserRole::Student).await;
    let student_token = env.token_for(&student, UserRole::Student);
    let (status, body) = env
        .request(
            "POST",
            &format!("/api/v1/assignments/{}/submissions", assignment_id),
            Some(&student_token),
            Some(json!({
                "answers": [
                    { "questionIndex": 0, "answer": "4" },
                    { "questionIndex": 1, "answer": "True" }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    GradedSetup {
        assignment_id,
        submission_id: body["submission"]["id"].as_str().unwrap().to_string(),
        course_id: course,
        instructor,
        student,
    }
}

#[tokio::test]
async fn instructor_can_override_marks_and_override_is_idempotent() {
    let env = common::create_test_env().await;
    let setup = setup_with_submission(&env).await;
    let token = env.token_for(&setup.instructor, UserRole::Instructor);

    let uri = format!(
        "/api/v1/assignments/{}/submissions/{}/marks",
        setup.assignment_id, setup.submission_id
    );

    // Applying the same override twice succeeds both times and leaves the
    // stored value unchanged
    for _ in 0..2 {
        let (status, body) = env
            .request("PUT", &uri, Some(&token), Some(json!({ "marks": 7.5 })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Marks updated successfully");
    }

    let (status, body) = env
        .request(
            "GET",
            &format!("/api/v1/assignments/{}/submissions", setup.assignment_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submissions"][0]["marks"], json!(7.5));
}

#[tokio::test]
async fn override_may_exceed_question_maxima() {
    // Permissive by design: instructors may award bonus marks
    let env = common::create_test_env().await;
    let setup = setup_with_submission(&env).await;
    let token = env.token_for(&setup.instructor, UserRole::Instructor);

    let (status, _) = env
        .request(
            "PUT",
            &format!(
                "/api/v1/assignments/{}/submissions/{}/marks",
                setup.assignment_id, setup.submission_id
            ),
            Some(&token),
            Some(json!({ "marks": 100 })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn other_instructor_cannot_override_marks() {
    let env = common::create_test_env().await;
    let setup = setup_with_submission(&env).await;
    let other = env.seed_user("eve", UserRole::Instructor).await;
    let token = env.token_for(&other, UserRole::Instructor);

    let (status, _) = env
        .request(
            "PUT",
            &format!(
                "/api/v1/assignments/{}/submissions/{}/marks",
                setup.assignment_id, setup.submission_id
            ),
            Some(&token),
            Some(json!({ "marks": 1 })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn override_of_unknown_submission_is_not_found() {
    let env = common::create_test_env().await;
    let setup = setup_with_submission(&env).await;
    let token = env.token_for(&setup.instructor, UserRole::Instructor);

    let (status, body) = env
        .request(
            "PUT",
            &format!(
                "/api/v1/assignments/{}/submissions/{}/marks",
                setup.assignment_id,
                ObjectId::new().to_hex()
            ),
            Some(&token),
            Some(json!({ "marks": 1 })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Submission not found");
}

#[tokio::test]
async fn submissions_view_joins_question_text_and_student_name() {
    let env = common::create_test_env().await;
    let setup = setup_with_submission(&env).await;
    let token = env.token_for(&setup.instructor, UserRole::Instructor);

    let (status, body) = env
        .request(
            "GET",
            &format!("/api/v1/assignments/{}/submissions", setup.assignment_id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assignment_title"], "Week 1 quiz");

    let submission = &body["submissions"][0];
    assert_eq!(submission["student_name"], "sam");
    assert_eq!(submission["marks"], json!(3.0)); // both answers correct: 2 + 1

    let answers = submission["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0]["question"], "2+2=?");
    assert_eq!(answers[0]["type"], "mcq");
    assert_eq!(answers[0]["maxMarks"], json!(2.0));
    assert_eq!(answers[1]["question"], "Sky is blue");
    assert_eq!(answers[1]["answer"], "True");
}

#[tokio::test]
async fn students_cannot_view_the_grading_list() {
    let env = common::create_test_env().await;
    let setup = setup_with_submission(&env).await;
    let token = env.token_for(&setup.student, UserRole::Student);

    let (status, _) = env
        .request(
            "GET",
            &format!("/api/v1/assignments/{}/submissions", setup.assignment_id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_by_course_redacts_other_students_submissions() {
    let env = common::create_test_env().await;
    let setup = setup_with_submission(&env).await;

    // A second student submits as well
    let other = env.seed_user("kim", UserRole::Student).await;
    let other_token = env.token_for(&other, UserRole::Student);
    let (status, _) = env
        .request(
            "POST",
            &format!("/api/v1/assignments/{}/submissions", setup.assignment_id),
            Some(&other_token),
            Some(json!({ "answers": [{ "questionIndex": 0, "answer": "5" }] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/courses/{}/assignments", setup.course_id.to_hex());

    // First student sees only their own submission
    let token = env.token_for(&setup.student, UserRole::Student);
    let (status, body) = env.request("GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let submissions = body[0]["submissions"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["student"], setup.student.to_hex());

    // A student with no submission sees an empty list
    let bystander = env.seed_user("lee", UserRole::Student).await;
    let token = env.token_for(&bystander, UserRole::Student);
    let (_, body) = env.request("GET", &uri, Some(&token), None).await;
    assert_eq!(body[0]["submissions"].as_array().unwrap().len(), 0);

    // The owning instructor sees both
    let token = env.token_for(&setup.instructor, UserRole::Instructor);
    let (_, body) = env.request("GET", &uri, Some(&token), None).await;
    assert_eq!(body[0]["submissions"].as_array().unwrap().len(), 2);
}

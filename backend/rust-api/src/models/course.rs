use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Course metadata in the "courses" collection. Media files themselves are
/// held by an external object-storage provider; only URLs are stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "createdBy", default)]
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Instructor who owns assignment authoring for this course
    #[serde(rename = "assignedTo", default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<ObjectId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecture {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub video: String,
    pub course: ObjectId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    pub image: Option<String>,
    pub duration: Option<i64>,
    pub price: Option<f64>,

    /// Instructor user id (hex); must resolve to a user with instructor role
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<String>,
}

/// Shorthand course reference for instructor dashboards.
#[derive(Debug, Serialize)]
pub struct CourseRef {
    pub id: String,
    pub title: String,
}

impl From<Course> for CourseRef {
    fn from(course: Course) -> Self {
        CourseRef {
            id: course.id.to_hex(),
            title: course.title,
        }
    }
}

/// Enrolled student reference returned by the course roster endpoint.
#[derive(Debug, Serialize)]
pub struct StudentRef {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_courses: u64,
    pub total_lectures: u64,
    pub total_users: u64,
}

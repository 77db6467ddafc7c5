use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Collection, Database};

use crate::error::ApiError;
use crate::middlewares::auth::JwtClaims;
use crate::models::{
    parse_object_id, Assignment, Course, CourseRef, CreateCourseRequest, Lecture, StatsResponse,
    StudentRef, User, UserRole,
};

pub struct CourseService {
    mongo: Database,
}

impl CourseService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn courses(&self) -> Collection<Course> {
        self.mongo.collection("courses")
    }

    fn lectures(&self) -> Collection<Lecture> {
        self.mongo.collection("lectures")
    }

    fn users(&self) -> Collection<User> {
        self.mongo.collection("users")
    }

    fn assignments(&self) -> Collection<Assignment> {
        self.mongo.collection("assignments")
    }

    /// Creates course metadata. When an instructor is assigned, the
    /// reference must resolve to a user carrying the instructor role.
    pub async fn create(&self, req: CreateCourseRequest) -> Result<Course, ApiError> {
        let assigned_to = match req.assigned_to.as_deref() {
            Some(raw) => {
                let instructor_oid = parse_object_id(raw, "instructor")?;
                let instructor = self
                    .users()
                    .find_one(doc! { "_id": instructor_oid })
                    .await?;
                match instructor {
                    Some(user) if user.role == UserRole::Instructor => Some(instructor_oid),
                    _ => {
                        return Err(ApiError::validation(
                            "Invalid instructor ID or user is not an instructor",
                        ))
                    }
                }
            }
            None => None,
        };

        let course = Course {
            id: ObjectId::new(),
            title: req.title,
            description: req.description,
            category: req.category,
            created_by: req.created_by,
            image: req.image,
            duration: req.duration,
            price: req.price,
            assigned_to,
        };

        self.courses().insert_one(&course).await?;
        tracing::info!("Course {} created", course.id.to_hex());

        Ok(course)
    }

    /// Deletes a course and everything hanging off it: lectures,
    /// assignments (with their embedded submissions) and enrollments.
    pub async fn delete(&self, course_id: &str) -> Result<(), ApiError> {
        let course_oid = parse_object_id(course_id, "course")?;
        self.courses()
            .find_one(doc! { "_id": course_oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))?;

        self.lectures()
            .delete_many(doc! { "course": course_oid })
            .await?;
        self.assignments()
            .delete_many(doc! { "course": course_oid })
            .await?;
        self.users()
            .update_many(doc! {}, doc! { "$pull": { "subscription": course_oid } })
            .await?;
        self.courses().delete_one(doc! { "_id": course_oid }).await?;

        tracing::info!("Course {} deleted with its lectures and assignments", course_id);
        Ok(())
    }

    pub async fn lectures_by_course(
        &self,
        claims: &JwtClaims,
        course_id: &str,
    ) -> Result<Vec<Lecture>, ApiError> {
        let course = self.find_course(course_id).await?;
        self.ensure_course_rights(
            claims,
            &course,
            "You are not authorized to view lectures for this course",
        )?;

        let mut cursor = self.lectures().find(doc! { "course": course.id }).await?;
        let mut lectures = Vec::new();
        while let Some(lecture) = cursor.try_next().await? {
            lectures.push(lecture);
        }
        Ok(lectures)
    }

    /// Students enrolled in the course (subscription contains the course id).
    pub async fn students_by_course(
        &self,
        claims: &JwtClaims,
        course_id: &str,
    ) -> Result<Vec<StudentRef>, ApiError> {
        let course = self.find_course(course_id).await?;
        self.ensure_course_rights(
            claims,
            &course,
            "You are not authorized to view students for this course",
        )?;

        let mut cursor = self
            .users()
            .find(doc! { "role": "student", "subscription": { "$in": [course.id] } })
            .await?;

        let mut students = Vec::new();
        while let Some(user) = cursor.try_next().await? {
            students.push(StudentRef {
                id: user.id.to_hex(),
                name: user.name,
                email: user.email,
            });
        }
        Ok(students)
    }

    /// Courses assigned to the calling instructor.
    pub async fn instructor_courses(&self, claims: &JwtClaims) -> Result<Vec<CourseRef>, ApiError> {
        if claims.role == UserRole::Student {
            return Err(ApiError::forbidden(
                "Only instructors or admins can access this resource",
            ));
        }

        let caller = claims.object_id()?;
        let mut cursor = self.courses().find(doc! { "assignedTo": caller }).await?;

        let mut courses = Vec::new();
        while let Some(course) = cursor.try_next().await? {
            courses.push(CourseRef::from(course));
        }
        Ok(courses)
    }

    pub async fn stats(&self) -> Result<StatsResponse, ApiError> {
        let total_courses = self.courses().count_documents(doc! {}).await?;
        let total_lectures = self.lectures().count_documents(doc! {}).await?;
        let total_users = self.users().count_documents(doc! {}).await?;

        Ok(StatsResponse {
            total_courses,
            total_lectures,
            total_users,
        })
    }

    async fn find_course(&self, course_id: &str) -> Result<Course, ApiError> {
        let course_oid = parse_object_id(course_id, "course")?;
        self.courses()
            .find_one(doc! { "_id": course_oid })
            .await?
            .ok_or_else(|| ApiError::not_found("Course not found"))
    }

    /// Course-level rights: admin, or the instructor the course is assigned to.
    fn ensure_course_rights(
        &self,
        claims: &JwtClaims,
        course: &Course,
        message: &str,
    ) -> Result<(), ApiError> {
        if claims.role == UserRole::Admin {
            return Ok(());
        }
        if course.assigned_to == Some(claims.object_id()?) {
            return Ok(());
        }
        Err(ApiError::forbidden(message))
    }
}

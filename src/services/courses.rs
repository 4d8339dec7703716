//! Courses, materials and enrollments
//!
//! Every instructor operation resolves the course first (404) and then
//! compares its stored owner with the caller (403) before anything is
//! validated or written.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{required, ServiceError, ServiceResult};
use crate::models::{
    ContentKind, Course, CourseWithMaterials, Enrollment, LearningMaterial, MaterialContent,
};
use crate::store::{courses::MaterialRecord, Database, StoreError};

/// Body of course create/replace requests.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl CourseInput {
    fn validate(self) -> ServiceResult<(String, String, Option<String>)> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let cover = self
            .cover_image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        Ok((title, description, cover))
    }
}

/// Body of material create/replace requests.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialInput {
    pub title: String,
    pub content_type: ContentKind,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl MaterialInput {
    fn validate(self) -> ServiceResult<(String, MaterialContent)> {
        let title = required("title", &self.title)?;
        let content = MaterialContent::from_parts(
            self.content_type,
            self.text_content,
            self.video_url,
            self.file_url,
        )
        .map_err(ServiceError::Validation)?;
        Ok((title, content))
    }
}

/// A course whose owner has been checked against the caller.
///
/// Only [`CourseService::owned_course`] builds one, so write operations that
/// take it never repeat the lookup.
#[derive(Debug, Clone)]
pub struct OwnedCourse(Course);

impl OwnedCourse {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn instructor_id(&self) -> &str {
        &self.0.instructor_id
    }

    pub fn into_inner(self) -> Course {
        self.0
    }
}

#[derive(Clone)]
pub struct CourseService {
    db: Database,
}

impl CourseService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn course(&self, course_id: &str) -> ServiceResult<Course> {
        self.db
            .course_by_id(course_id)
            .await
            .map_err(|e| ServiceError::from_store("Course", e))
    }

    /// The course, provided `instructor_id` owns it.
    pub async fn owned_course(
        &self,
        instructor_id: &str,
        course_id: &str,
    ) -> ServiceResult<OwnedCourse> {
        let course = self.course(course_id).await?;
        if course.instructor_id != instructor_id {
            info!(
                course_id,
                instructor_id,
                owner_id = %course.instructor_id,
                "Ownership check failed"
            );
            return Err(ServiceError::Forbidden(
                "You do not own this course".to_string(),
            ));
        }
        Ok(OwnedCourse(course))
    }

    pub async fn create_course(&self, instructor_id: &str, input: CourseInput) -> ServiceResult<Course> {
        let (title, description, cover_image_url) = input.validate()?;
        let now = Utc::now();
        let course = self
            .db
            .insert_course(Course {
                id: Uuid::new_v4().to_string(),
                instructor_id: instructor_id.to_string(),
                title,
                description,
                cover_image_url,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| ServiceError::from_store("Instructor", e))?;

        info!(course_id = %course.id, instructor_id, "Course created");
        Ok(course)
    }

    /// Owned course plus its materials in position order.
    pub async fn course_details(
        &self,
        instructor_id: &str,
        course_id: &str,
    ) -> ServiceResult<CourseWithMaterials> {
        let course = self.owned_course(instructor_id, course_id).await?.into_inner();
        let materials = self.db.materials_for_course(course_id).await?;
        Ok(CourseWithMaterials { course, materials })
    }

    pub async fn instructor_courses(&self, instructor_id: &str) -> ServiceResult<Vec<Course>> {
        Ok(self.db.courses_by_instructor(instructor_id).await?)
    }

    pub async fn update_course(&self, owned: &OwnedCourse, input: CourseInput) -> ServiceResult<Course> {
        let (title, description, cover_image_url) = input.validate()?;

        let course = self
            .db
            .update_course(owned.id(), title, description, cover_image_url, Utc::now())
            .await
            .map_err(|e| ServiceError::from_store("Course", e))?;

        info!(course_id = owned.id(), instructor_id = owned.instructor_id(), "Course updated");
        Ok(course)
    }

    pub async fn delete_course(&self, instructor_id: &str, course_id: &str) -> ServiceResult<()> {
        self.owned_course(instructor_id, course_id).await?;
        self.db
            .delete_course(course_id)
            .await
            .map_err(|e| ServiceError::from_store("Course", e))?;

        info!(course_id, instructor_id, "Course deleted");
        Ok(())
    }

    pub async fn add_material(
        &self,
        owned: &OwnedCourse,
        input: MaterialInput,
    ) -> ServiceResult<LearningMaterial> {
        let (title, content) = input.validate()?;
        let course_id = owned.id();

        let material = self
            .db
            .insert_material(MaterialRecord {
                id: Uuid::new_v4().to_string(),
                course_id: course_id.to_string(),
                title,
                content,
                now: Utc::now(),
            })
            .await
            .map_err(|e| ServiceError::from_store("Course", e))?;

        info!(
            course_id,
            material_id = %material.id,
            position = material.position,
            "Material added"
        );
        Ok(material)
    }

    pub async fn materials(
        &self,
        instructor_id: &str,
        course_id: &str,
    ) -> ServiceResult<Vec<LearningMaterial>> {
        self.owned_course(instructor_id, course_id).await?;
        Ok(self.db.materials_for_course(course_id).await?)
    }

    pub async fn update_material(
        &self,
        owned: &OwnedCourse,
        material_id: &str,
        input: MaterialInput,
    ) -> ServiceResult<LearningMaterial> {
        let (title, content) = input.validate()?;
        let course_id = owned.id();

        let material = self
            .db
            .update_material(MaterialRecord {
                id: material_id.to_string(),
                course_id: course_id.to_string(),
                title,
                content,
                now: Utc::now(),
            })
            .await
            .map_err(|e| ServiceError::from_store("Material", e))?;

        info!(course_id, material_id, "Material updated");
        Ok(material)
    }

    pub async fn delete_material(
        &self,
        instructor_id: &str,
        course_id: &str,
        material_id: &str,
    ) -> ServiceResult<()> {
        self.owned_course(instructor_id, course_id).await?;
        self.db
            .delete_material(course_id, material_id)
            .await
            .map_err(|e| ServiceError::from_store("Material", e))?;

        info!(course_id, material_id, "Material deleted");
        Ok(())
    }

    /// The course is resolved first, so a foreign key failure on insert
    /// means the student's account no longer exists.
    pub async fn enroll(&self, student_id: &str, course_id: &str) -> ServiceResult<Enrollment> {
        self.course(course_id).await?;

        let enrollment = self
            .db
            .insert_enrollment(Enrollment {
                student_id: student_id.to_string(),
                course_id: course_id.to_string(),
                enrolled_at: Utc::now(),
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    ServiceError::Conflict("Already enrolled in this course".to_string())
                }
                other => ServiceError::from_store("User", other),
            })?;

        info!(student_id, course_id, "Student enrolled");
        Ok(enrollment)
    }

    pub async fn is_enrolled(&self, student_id: &str, course_id: &str) -> ServiceResult<bool> {
        Ok(self.db.enrollment_exists(student_id, course_id).await?)
    }

    pub async fn enrolled_courses(&self, student_id: &str) -> ServiceResult<Vec<Course>> {
        Ok(self.db.enrolled_courses(student_id).await?)
    }

    /// Course plus materials in position order, for enrolled students only.
    pub async fn enrolled_course_details(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> ServiceResult<CourseWithMaterials> {
        if !self.is_enrolled(student_id, course_id).await? {
            return Err(ServiceError::Forbidden(
                "You are not enrolled in this course".to_string(),
            ));
        }

        let course = self.course(course_id).await?;
        let materials = self.db.materials_for_course(course_id).await?;
        Ok(CourseWithMaterials { course, materials })
    }

    /// Every course, newest first; no authentication involved.
    pub async fn catalog(&self) -> ServiceResult<Vec<Course>> {
        Ok(self.db.all_courses().await?)
    }
}

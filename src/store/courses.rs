//! Course, material and enrollment queries

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{expect_affected, invalid_column, Database, StoreResult};
use crate::models::{ContentKind, Course, Enrollment, LearningMaterial, MaterialContent};

const COURSE_COLUMNS: &str =
    "id, instructor_id, title, description, cover_image_url, created_at, updated_at";

const MATERIAL_COLUMNS: &str = "id, course_id, title, content_type, text_content, video_url, \
     file_url, position, created_at, updated_at";

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        instructor_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        cover_image_url: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn material_from_row(row: &Row<'_>) -> rusqlite::Result<LearningMaterial> {
    let kind: String = row.get(3)?;
    let kind = ContentKind::parse(&kind).ok_or_else(|| invalid_column(3, kind.clone()))?;
    let content = MaterialContent::from_parts(kind, row.get(4)?, row.get(5)?, row.get(6)?)
        .map_err(|e| invalid_column(3, e))?;

    Ok(LearningMaterial {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        content,
        position: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn select_course(conn: &Connection, id: &str) -> StoreResult<Course> {
    let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], course_from_row)?)
}

fn select_material(conn: &Connection, course_id: &str, id: &str) -> StoreResult<LearningMaterial> {
    let sql = format!("SELECT {MATERIAL_COLUMNS} FROM learning_materials WHERE id = ?1 AND course_id = ?2");
    Ok(conn.query_row(&sql, params![id, course_id], material_from_row)?)
}

fn query_courses(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Course>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let courses = stmt
        .query_map(params, course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(courses)
}

fn query_materials(conn: &Connection, course_id: &str) -> StoreResult<Vec<LearningMaterial>> {
    let sql = format!(
        "SELECT {MATERIAL_COLUMNS} FROM learning_materials WHERE course_id = ?1 ORDER BY position ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let materials = stmt
        .query_map(params![course_id], material_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(materials)
}

/// Fields written when a material is created or replaced.
#[derive(Debug, Clone)]
pub struct MaterialRecord {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub content: MaterialContent,
    pub now: DateTime<Utc>,
}

impl Database {
    pub async fn insert_course(&self, course: Course) -> StoreResult<Course> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO courses
                 (id, instructor_id, title, description, cover_image_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    &course.id,
                    &course.instructor_id,
                    &course.title,
                    &course.description,
                    &course.cover_image_url,
                    &course.created_at,
                    &course.updated_at,
                ],
            )?;
            Ok(course)
        })
        .await
    }

    pub async fn course_by_id(&self, id: &str) -> StoreResult<Course> {
        let id = id.to_string();
        self.call(move |conn| select_course(conn, &id)).await
    }

    pub async fn courses_by_instructor(&self, instructor_id: &str) -> StoreResult<Vec<Course>> {
        let instructor_id = instructor_id.to_string();
        self.call(move |conn| {
            let sql = format!(
                "SELECT {COURSE_COLUMNS} FROM courses WHERE instructor_id = ?1 ORDER BY created_at DESC"
            );
            query_courses(conn, &sql, params![instructor_id])
        })
        .await
    }

    pub async fn all_courses(&self) -> StoreResult<Vec<Course>> {
        self.call(|conn| {
            let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC");
            query_courses(conn, &sql, [])
        })
        .await
    }

    /// Owner is never rewritten.
    pub async fn update_course(
        &self,
        id: &str,
        title: String,
        description: String,
        cover_image_url: Option<String>,
        now: DateTime<Utc>,
    ) -> StoreResult<Course> {
        let id = id.to_string();
        self.call(move |conn| {
            let changes = conn.execute(
                "UPDATE courses SET title = ?1, description = ?2, cover_image_url = ?3,
                 updated_at = ?4 WHERE id = ?5",
                params![title, description, cover_image_url, now, id],
            )?;
            expect_affected(changes)?;
            select_course(conn, &id)
        })
        .await
    }

    /// Materials and enrollments go with it (ON DELETE CASCADE).
    pub async fn delete_course(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.call(move |conn| {
            let changes = conn.execute("DELETE FROM courses WHERE id = ?1", params![id])?;
            expect_affected(changes)
        })
        .await
    }

    /// Insert at the next free position (max + 1) in a single statement.
    pub async fn insert_material(&self, record: MaterialRecord) -> StoreResult<LearningMaterial> {
        self.call(move |conn| {
            let (text, video, file) = record.content.columns();
            let position: i64 = conn.query_row(
                "INSERT INTO learning_materials
                 (id, course_id, title, content_type, text_content, video_url, file_url,
                  position, created_at, updated_at)
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, COALESCE(MAX(position), 0) + 1, ?8, ?8
                 FROM learning_materials WHERE course_id = ?2
                 RETURNING position",
                params![
                    &record.id,
                    &record.course_id,
                    &record.title,
                    record.content.kind().as_str(),
                    text,
                    video,
                    file,
                    &record.now,
                ],
                |row| row.get(0),
            )?;

            Ok(LearningMaterial {
                id: record.id,
                course_id: record.course_id,
                title: record.title,
                content: record.content,
                position,
                created_at: record.now,
                updated_at: record.now,
            })
        })
        .await
    }

    pub async fn materials_for_course(&self, course_id: &str) -> StoreResult<Vec<LearningMaterial>> {
        let course_id = course_id.to_string();
        self.call(move |conn| query_materials(conn, &course_id))
            .await
    }

    /// Replace title and content of the material `record.id` within
    /// `record.course_id`; position is kept.
    pub async fn update_material(&self, record: MaterialRecord) -> StoreResult<LearningMaterial> {
        self.call(move |conn| {
            let (text, video, file) = record.content.columns();
            let changes = conn.execute(
                "UPDATE learning_materials
                 SET title = ?1, content_type = ?2, text_content = ?3, video_url = ?4,
                     file_url = ?5, updated_at = ?6
                 WHERE id = ?7 AND course_id = ?8",
                params![
                    &record.title,
                    record.content.kind().as_str(),
                    text,
                    video,
                    file,
                    &record.now,
                    &record.id,
                    &record.course_id,
                ],
            )?;
            expect_affected(changes)?;
            select_material(conn, &record.course_id, &record.id)
        })
        .await
    }

    pub async fn delete_material(&self, course_id: &str, id: &str) -> StoreResult<()> {
        let (course_id, id) = (course_id.to_string(), id.to_string());
        self.call(move |conn| {
            let changes = conn.execute(
                "DELETE FROM learning_materials WHERE id = ?1 AND course_id = ?2",
                params![id, course_id],
            )?;
            expect_affected(changes)
        })
        .await
    }

    /// The composite primary key is the only guard against double enrollment.
    pub async fn insert_enrollment(&self, enrollment: Enrollment) -> StoreResult<Enrollment> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO enrollments (student_id, course_id, enrolled_at) VALUES (?1, ?2, ?3)",
                params![
                    &enrollment.student_id,
                    &enrollment.course_id,
                    &enrollment.enrolled_at,
                ],
            )?;
            Ok(enrollment)
        })
        .await
    }

    pub async fn enrollment_exists(&self, student_id: &str, course_id: &str) -> StoreResult<bool> {
        let (student_id, course_id) = (student_id.to_string(), course_id.to_string());
        self.call(move |conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = ?1 AND course_id = ?2)",
                params![student_id, course_id],
                |row| row.get(0),
            )?)
        })
        .await
    }

    /// Most recent enrollment first.
    pub async fn enrolled_courses(&self, student_id: &str) -> StoreResult<Vec<Course>> {
        let student_id = student_id.to_string();
        self.call(move |conn| {
            query_courses(
                conn,
                "SELECT c.id, c.instructor_id, c.title, c.description, c.cover_image_url,
                        c.created_at, c.updated_at
                 FROM courses c
                 JOIN enrollments e ON e.course_id = c.id
                 WHERE e.student_id = ?1
                 ORDER BY e.enrolled_at DESC, e.rowid DESC",
                params![student_id],
            )
        })
        .await
    }
}

//! Catalog-boundary and enrollment queries.

use coursetrack_core::db::unix_timestamp;

use super::db::{Database, DatabaseError};
use super::models::{Badge, Course, CourseModule, Enrollment, Lesson, User};

/// Column values for inserting a lesson.
pub struct LessonParams<'a> {
    pub id: &'a str,
    pub module_id: &'a str,
    pub title: &'a str,
    pub kind: &'a str,
    pub content: Option<&'a str>,
    pub position: i64,
    pub duration_minutes: i64,
    pub is_free: bool,
    pub drip_kind: &'a str,
    pub drip_days: Option<i64>,
    pub drip_date: Option<i64>,
}

/// Column values for inserting an enrollment.
pub struct EnrollmentParams<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub course_id: &'a str,
    pub status: &'a str,
    pub payment_status: &'a str,
    pub enrolled_at: i64,
    pub expires_at: Option<i64>,
}

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Register a user and its companion stats row.
    pub async fn create_user(
        &self,
        id: &str,
        name: &str,
        role: &str,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        sqlx::query("INSERT INTO users (id, name, role, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(role)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO user_stats (user_id) VALUES (?)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    // =========================================================================
    // Catalog queries (courses, modules, lessons, badges)
    // =========================================================================

    /// Create a course.
    pub async fn create_course(
        &self,
        id: &str,
        title: &str,
        price: f64,
        status: &str,
    ) -> Result<Course, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO courses (id, title, price, status, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(title)
        .bind(price)
        .bind(status)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_course(id).await
    }

    /// Get a course by ID.
    pub async fn get_course(&self, id: &str) -> Result<Course, DatabaseError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Course {id}")))
    }

    /// Create a module within a course.
    pub async fn create_module(
        &self,
        id: &str,
        course_id: &str,
        title: &str,
        position: i64,
    ) -> Result<CourseModule, DatabaseError> {
        sqlx::query("INSERT INTO modules (id, course_id, title, position) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(course_id)
            .bind(title)
            .bind(position)
            .execute(self.pool())
            .await?;

        sqlx::query_as::<_, CourseModule>("SELECT * FROM modules WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Module {id}")))
    }

    /// Create a lesson.
    pub async fn create_lesson(&self, params: &LessonParams<'_>) -> Result<Lesson, DatabaseError> {
        sqlx::query(
            "INSERT INTO lessons (id, module_id, title, kind, content, position, duration_minutes, is_free, drip_kind, drip_days, drip_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.module_id)
        .bind(params.title)
        .bind(params.kind)
        .bind(params.content)
        .bind(params.position)
        .bind(params.duration_minutes)
        .bind(i64::from(params.is_free))
        .bind(params.drip_kind)
        .bind(params.drip_days)
        .bind(params.drip_date)
        .execute(self.pool())
        .await?;

        self.get_lesson(params.id).await
    }

    /// Get a lesson by ID.
    pub async fn get_lesson(&self, id: &str) -> Result<Lesson, DatabaseError> {
        sqlx::query_as::<_, Lesson>("SELECT * FROM lessons WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Lesson {id}")))
    }

    /// Add a badge to the catalog.
    pub async fn create_badge(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        kind: &str,
        requirement: i64,
    ) -> Result<Badge, DatabaseError> {
        sqlx::query(
            "INSERT INTO badges (id, name, description, kind, requirement) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(kind)
        .bind(requirement)
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, Badge>("SELECT * FROM badges WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Badge {id}")))
    }

    // =========================================================================
    // Enrollment queries
    // =========================================================================

    /// Insert an enrollment. Propagates `Conflict` when the (user, course)
    /// pair already exists.
    pub async fn create_enrollment(
        &self,
        params: &EnrollmentParams<'_>,
    ) -> Result<Enrollment, DatabaseError> {
        sqlx::query(
            "INSERT INTO enrollments (id, user_id, course_id, status, payment_status, enrolled_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.user_id)
        .bind(params.course_id)
        .bind(params.status)
        .bind(params.payment_status)
        .bind(params.enrolled_at)
        .bind(params.expires_at)
        .execute(self.pool())
        .await?;

        self.get_enrollment(params.id).await
    }

    /// Get an enrollment by ID.
    pub async fn get_enrollment(&self, id: &str) -> Result<Enrollment, DatabaseError> {
        sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Enrollment {id}")))
    }

    /// Find the enrollment for a (user, course) pair, if any.
    pub async fn enrollment_for(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT * FROM enrollments WHERE user_id = ? AND course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(enrollment)
    }

    /// Conditionally move an enrollment from `from` to `to`, optionally
    /// updating payment status and stamping `completed_at`. Returns whether
    /// a row changed, i.e. whether this caller won the transition.
    pub async fn transition_enrollment(
        &self,
        id: &str,
        from: &str,
        to: &str,
        payment_status: Option<&str>,
        completed_at: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE enrollments
             SET status = ?,
                 payment_status = COALESCE(?, payment_status),
                 completed_at = COALESCE(?, completed_at)
             WHERE id = ? AND status = ?",
        )
        .bind(to)
        .bind(payment_status)
        .bind(completed_at)
        .bind(id)
        .bind(from)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Update only the payment status.
    pub async fn set_enrollment_payment_status(
        &self,
        id: &str,
        payment_status: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE enrollments SET payment_status = ? WHERE id = ?")
            .bind(payment_status)
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

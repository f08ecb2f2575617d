//! Enrollment lifecycle.
//!
//! Status changes go through one closed transition table instead of ad hoc
//! conditional updates: `pending -> active` (payment approval, or enrolling
//! in a free course), `pending -> cancelled` (rejection), and
//! `active -> completed` (driven by the progress ledger). `completed` and
//! `cancelled` are terminal.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use coursetrack_core::Clock;
use coursetrack_core::db::DatabaseError;

use crate::error::{EngineError, Result};
use crate::storage::{Database, Enrollment, EnrollmentParams};

/// Enrollment lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// The closed transition table.
    pub fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Cancelled)
                | (Self::Active, Self::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Payment state carried on the enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

/// Enrollment operations: creation and the legal status transitions.
#[derive(Clone)]
pub struct EnrollmentService {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl EnrollmentService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Enroll a user in a published course. Free courses activate
    /// immediately; priced courses wait in `pending` for payment approval.
    pub async fn enroll(&self, user_id: &str, course_id: &str) -> Result<Enrollment> {
        let course = match self.db.get_course(course_id).await {
            Ok(course) => course,
            Err(DatabaseError::NotFound(msg)) => return Err(EngineError::NotFound(msg)),
            Err(e) => return Err(e.into()),
        };
        if course.status != "published" {
            return Err(EngineError::NotFound(format!(
                "Course {course_id} is not available"
            )));
        }

        let is_free = course.price.abs() < f64::EPSILON;
        let (status, payment_status) = if is_free {
            (EnrollmentStatus::Active, PaymentStatus::Paid)
        } else {
            (EnrollmentStatus::Pending, PaymentStatus::Pending)
        };

        let id = Uuid::new_v4().to_string();
        let enrollment = self
            .db
            .create_enrollment(&EnrollmentParams {
                id: &id,
                user_id,
                course_id,
                status: status.as_str(),
                payment_status: payment_status.as_str(),
                enrolled_at: self.clock.now().timestamp(),
                expires_at: None,
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => EngineError::AlreadyEnrolled,
                other => other.into(),
            })?;

        info!(
            user_id,
            course_id,
            status = status.as_str(),
            "Enrollment created"
        );

        Ok(enrollment)
    }

    /// Payment approval: `pending -> active`, payment marked paid.
    pub async fn approve(&self, enrollment_id: &str) -> Result<Enrollment> {
        self.transition(
            enrollment_id,
            EnrollmentStatus::Active,
            Some(PaymentStatus::Paid),
        )
        .await
    }

    /// Rejection: `pending -> cancelled`.
    pub async fn reject(&self, enrollment_id: &str) -> Result<Enrollment> {
        self.transition(enrollment_id, EnrollmentStatus::Cancelled, None)
            .await
    }

    /// Record a payment-status change without touching lifecycle state.
    pub async fn set_payment_status(
        &self,
        enrollment_id: &str,
        payment_status: PaymentStatus,
    ) -> Result<Enrollment> {
        let updated = self
            .db
            .set_enrollment_payment_status(enrollment_id, payment_status.as_str())
            .await?;
        if !updated {
            return Err(EngineError::NotFound(format!(
                "Enrollment {enrollment_id}"
            )));
        }

        Ok(self.db.get_enrollment(enrollment_id).await?)
    }

    /// The enrollment for a (user, course) pair, if any.
    pub async fn enrollment_for(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>> {
        Ok(self.db.enrollment_for(user_id, course_id).await?)
    }

    /// Apply a transition through the closed table. The UPDATE is filtered
    /// on the expected current status, so a concurrent change makes this a
    /// reported `InvalidTransition` rather than a silent overwrite.
    async fn transition(
        &self,
        enrollment_id: &str,
        to: EnrollmentStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Enrollment> {
        let current = match self.db.get_enrollment(enrollment_id).await {
            Ok(e) => e,
            Err(DatabaseError::NotFound(msg)) => return Err(EngineError::NotFound(msg)),
            Err(e) => return Err(e.into()),
        };

        let from = EnrollmentStatus::parse(&current.status).ok_or_else(|| {
            EngineError::InvalidTransition {
                from: current.status.clone(),
                to: to.as_str().to_string(),
            }
        })?;

        if !from.can_transition(to) {
            return Err(EngineError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }

        let completed_at = (to == EnrollmentStatus::Completed).then(|| self.clock.now().timestamp());
        let won = self
            .db
            .transition_enrollment(
                enrollment_id,
                from.as_str(),
                to.as_str(),
                payment_status.map(PaymentStatus::as_str),
                completed_at,
            )
            .await?;

        if !won {
            // Raced with another writer; report what the row says now.
            let now_row = self.db.get_enrollment(enrollment_id).await?;
            return Err(EngineError::InvalidTransition {
                from: now_row.status,
                to: to.as_str().to_string(),
            });
        }

        info!(
            enrollment_id,
            from = from.as_str(),
            to = to.as_str(),
            "Enrollment transition"
        );

        Ok(self.db.get_enrollment(enrollment_id).await?)
    }
}

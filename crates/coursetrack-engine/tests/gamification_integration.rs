//! End-to-end gamification tests: streaks, badges, certificates, the
//! leaderboard, and the enrollment lifecycle feeding them.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use coursetrack_core::{Clock, FixedClock, Rules};
use coursetrack_engine::storage::Database;
use coursetrack_engine::{
    EngineError, EnrollmentService, GamificationEngine, PaymentStatus, ProgressLedger,
};

fn start_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
    ))
}

async fn setup() -> (
    Database,
    Arc<FixedClock>,
    GamificationEngine,
    EnrollmentService,
) {
    let db = Database::open_in_memory().await.unwrap();
    let clock = start_clock();
    let gamification = GamificationEngine::new(db.clone(), clock.clone(), Rules::default());
    let enrollments = EnrollmentService::new(db.clone(), clock.clone());
    (db, clock, gamification, enrollments)
}

/// Published single-lesson course, ready to be completed in one call.
async fn seed_short_course(db: &Database, course_id: &str, price: f64) {
    use coursetrack_engine::storage::LessonParams;

    db.create_course(course_id, "Crash Course", price, "published")
        .await
        .unwrap();
    let module_id = format!("{course_id}-m1");
    db.create_module(&module_id, course_id, "All of it", 0)
        .await
        .unwrap();
    db.create_lesson(&LessonParams {
        id: &format!("{course_id}-l1"),
        module_id: &module_id,
        title: "Everything",
        kind: "video",
        content: None,
        position: 0,
        duration_minutes: 15,
        is_free: false,
        drip_kind: "immediate",
        drip_days: None,
        drip_date: None,
    })
    .await
    .unwrap();
}

// === Streak tests ===

#[tokio::test]
async fn daily_activity_builds_and_resets_streaks() {
    let (db, clock, gamification, _) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();

    let stats = gamification.record_daily_activity("u1").await.unwrap();
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.points, 5);

    clock.advance_days(1);
    let stats = gamification.record_daily_activity("u1").await.unwrap();
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.longest_streak, 2);
    assert_eq!(stats.points, 10);

    // Second login the same day: no extra streak, no extra points.
    let stats = gamification.record_daily_activity("u1").await.unwrap();
    assert_eq!(stats.current_streak, 2);
    assert_eq!(stats.points, 10);

    // Skipping a day resets the streak but not the record.
    clock.advance_days(2);
    let stats = gamification.record_daily_activity("u1").await.unwrap();
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.longest_streak, 2);
    assert_eq!(stats.points, 15);
}

#[tokio::test]
async fn seven_day_streak_earns_the_badge_once() {
    let (db, clock, gamification, _) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    db.create_badge("b7", "Week Streak", Some("7 days in a row"), "streak", 7)
        .await
        .unwrap();

    for day in 0..7 {
        if day > 0 {
            clock.advance_days(1);
        }
        let stats = gamification.record_daily_activity("u1").await.unwrap();
        let badges = gamification.badges_for("u1").await.unwrap();
        if stats.current_streak < 7 {
            assert!(badges.is_empty(), "no badge before day 7");
        }
    }

    let badges = gamification.badges_for("u1").await.unwrap();
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].name, "Week Streak");

    // Re-checking the same streak must not duplicate the award.
    let newly = gamification.check_streak_badges("u1", 7).await.unwrap();
    assert!(newly.is_empty());
    assert_eq!(gamification.badges_for("u1").await.unwrap().len(), 1);
}

// === Enrollment lifecycle tests ===

#[tokio::test]
async fn free_course_activates_immediately() {
    let (db, _clock, _gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    seed_short_course(&db, "c1", 0.0).await;

    let enrollment = enrollments.enroll("u1", "c1").await.unwrap();
    assert_eq!(enrollment.status, "active");
    assert_eq!(enrollment.payment_status, "paid");

    let err = enrollments.enroll("u1", "c1").await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyEnrolled));
}

#[tokio::test]
async fn priced_course_waits_for_approval() {
    let (db, _clock, _gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    seed_short_course(&db, "c1", 49.9).await;

    let enrollment = enrollments.enroll("u1", "c1").await.unwrap();
    assert_eq!(enrollment.status, "pending");
    assert_eq!(enrollment.payment_status, "pending");

    let enrollment = enrollments.approve(&enrollment.id).await.unwrap();
    assert_eq!(enrollment.status, "active");
    assert_eq!(enrollment.payment_status, "paid");

    // Terminal and already-active states reject further lifecycle edges.
    let err = enrollments.approve(&enrollment.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));
    let err = enrollments.reject(&enrollment.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));
}

#[tokio::test]
async fn rejection_cancels_a_pending_enrollment() {
    let (db, _clock, _gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    seed_short_course(&db, "c1", 19.9).await;

    let enrollment = enrollments.enroll("u1", "c1").await.unwrap();
    let enrollment = enrollments.reject(&enrollment.id).await.unwrap();
    assert_eq!(enrollment.status, "cancelled");

    let err = enrollments.approve(&enrollment.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));
}

#[tokio::test]
async fn refunds_touch_payment_state_only() {
    let (db, _clock, _gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    seed_short_course(&db, "c1", 0.0).await;

    let enrollment = enrollments.enroll("u1", "c1").await.unwrap();
    let enrollment = enrollments
        .set_payment_status(&enrollment.id, PaymentStatus::Refunded)
        .await
        .unwrap();
    assert_eq!(enrollment.payment_status, "refunded");
    assert_eq!(enrollment.status, "active");
}

#[tokio::test]
async fn unpublished_course_is_not_enrollable() {
    let (db, _clock, _gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    db.create_course("c1", "Draft", 0.0, "draft").await.unwrap();

    let err = enrollments.enroll("u1", "c1").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

// === Certificate tests ===

#[tokio::test]
async fn certificate_claim_lifecycle() {
    let (db, clock, gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    db.create_user("u2", "Bob", "student").await.unwrap();
    seed_short_course(&db, "c1", 0.0).await;

    enrollments.enroll("u1", "c1").await.unwrap();
    enrollments.enroll("u2", "c1").await.unwrap();

    // Bob never finishes; Alice completes the single lesson.
    let ledger = ProgressLedger::new(db.clone(), clock.clone(), Rules::default());
    let completion = ledger.complete_lesson("u1", "c1-l1").await.unwrap();
    assert!(completion.course_completed);

    let cert = gamification.claim_certificate("u1", "c1").await.unwrap();
    let expected_prefix = format!("CERT-{}-", clock.now().timestamp_millis());
    assert!(cert.certificate_number.starts_with(&expected_prefix));
    assert_eq!(
        cert.certificate_number.len(),
        expected_prefix.len() + 8
    );

    let err = gamification.claim_certificate("u1", "c1").await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyClaimed));

    let err = gamification.claim_certificate("u2", "c1").await.unwrap_err();
    assert!(matches!(err, EngineError::NotCompleted));

    let certs = gamification.certificates_for("u1").await.unwrap();
    assert_eq!(certs.len(), 1);
}

#[tokio::test]
async fn completing_a_course_awards_completion_badges() {
    let (db, clock, gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    db.create_badge("bc1", "First Finish", None, "completion", 1)
        .await
        .unwrap();
    db.create_badge("bc5", "Serial Finisher", None, "completion", 5)
        .await
        .unwrap();
    seed_short_course(&db, "c1", 0.0).await;
    enrollments.enroll("u1", "c1").await.unwrap();

    let ledger = ProgressLedger::new(db.clone(), clock.clone(), Rules::default());
    ledger.complete_lesson("u1", "c1-l1").await.unwrap();

    let badges = gamification.badges_for("u1").await.unwrap();
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].name, "First Finish");
}

// === Leaderboard and summary tests ===

#[tokio::test]
async fn leaderboard_ranks_follow_point_order() {
    let (db, _clock, gamification, _) = setup().await;
    for (id, name, points) in [("u1", "Alice", 120), ("u2", "Bob", 200), ("u3", "Carol", 40)] {
        db.create_user(id, name, "student").await.unwrap();
        sqlx::query("UPDATE user_stats SET points = ? WHERE user_id = ?")
            .bind(points)
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();
    }

    let board = gamification.leaderboard(None).await.unwrap();
    let summary: Vec<(usize, &str, i64)> = board
        .iter()
        .map(|e| (e.rank, e.user_id.as_str(), e.points))
        .collect();
    assert_eq!(
        summary,
        vec![(1, "u2", 200), (2, "u1", 120), (3, "u3", 40)]
    );

    let top_two = gamification.leaderboard(Some(2)).await.unwrap();
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[1].rank, 2);
}

#[tokio::test]
async fn stats_summary_aggregates_everything() {
    let (db, clock, gamification, enrollments) = setup().await;
    db.create_user("u1", "Alice", "student").await.unwrap();
    seed_short_course(&db, "c1", 0.0).await;
    seed_short_course(&db, "c2", 0.0).await;
    enrollments.enroll("u1", "c1").await.unwrap();
    enrollments.enroll("u1", "c2").await.unwrap();

    let ledger = ProgressLedger::new(db.clone(), clock.clone(), Rules::default());
    ledger.report_watch_time("u1", "c1-l1", 600).await.unwrap();
    ledger.complete_lesson("u1", "c1-l1").await.unwrap();
    gamification.claim_certificate("u1", "c1").await.unwrap();

    let summary = gamification.stats_summary("u1").await.unwrap();
    assert_eq!(summary.courses_enrolled, 2);
    assert_eq!(summary.courses_completed, 1);
    assert_eq!(summary.total_watch_time, 10);
    assert_eq!(summary.current_streak, 1);
    assert_eq!(summary.certificates, 1);
    // 1 watch report + 10 lesson + 100 course bonus + 5 daily bonus.
    assert_eq!(summary.points, 116);
}

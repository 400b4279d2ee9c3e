//! Onboarding approval, consultation scheduling and account suspension.

mod common;

use chrono::NaiveDate;

use edumarket::accounts::{LoginRequest, Role};
use edumarket::error::ServiceError;
use edumarket::ids::{RecipientId, RequestId};
use edumarket::moderation::{
    ConsultationBooking, ConsultationSchedule, ConsultationStatus, MeetingMode, RequestStatus,
};
use edumarket::store::PageRequest;

use common::{application, Harness};

#[test]
fn approval_creates_one_institution_and_is_terminal() {
    let harness = Harness::new();
    let request = harness
        .market
        .accounts
        .apply_as_institution(application("Hillview College", "admissions@hillview.test"))
        .expect("application accepted");

    let institution = harness
        .market
        .moderation
        .approve_request(&request.id, &harness.admin.id)
        .expect("approval succeeds");
    assert!(institution.is_active && institution.is_verified && institution.is_first_login);

    let err = harness
        .market
        .moderation
        .approve_request(&request.id, &harness.admin.id)
        .expect_err("second approval refused");
    match err {
        ServiceError::InvalidState(message) => assert_eq!(message, "Already processed"),
        other => panic!("expected invalid state, got {other:?}"),
    }

    let listed = harness
        .market
        .directory
        .admin_list(None, PageRequest::default())
        .expect("listing");
    assert_eq!(listed.total, 1);

    let requests = harness.market.moderation.list_requests().expect("requests");
    assert_eq!(requests[0].status, RequestStatus::Approved);
    assert_eq!(requests[0].approved_by.as_ref(), Some(&harness.admin.id));
}

#[test]
fn emailed_credentials_open_the_institution_account() {
    let harness = Harness::new();
    let institution = harness.institution("Hillview College", "admissions@hillview.test");

    let email = harness
        .mailer
        .last_to("admissions@hillview.test")
        .expect("credentials mailed");
    let password = email
        .body
        .lines()
        .find_map(|line| line.strip_prefix("Password: "))
        .expect("password line")
        .to_string();
    assert_eq!(password.len(), 8);

    let session = harness
        .market
        .accounts
        .login(LoginRequest {
            email: "admissions@hillview.test".to_string(),
            password,
            user_type: Some(Role::Institution),
        })
        .expect("institution logs in");
    assert_eq!(session.account.user_type, Role::Institution);
    assert_eq!(session.account.is_first_login, Some(true));
    assert_eq!(session.account.id, institution.id.as_str());
}

#[test]
fn failing_mailer_never_fails_approval() {
    let harness = Harness::with_failing_mailer();
    let institution = harness.institution("Hillview College", "admissions@hillview.test");
    assert!(institution.is_active);
}

#[test]
fn rejection_requires_pending_and_unknown_requests_are_not_found() {
    let harness = Harness::new();
    let request = harness
        .market
        .accounts
        .apply_as_institution(application("Hillview College", "admissions@hillview.test"))
        .expect("application accepted");

    let rejected = harness
        .market
        .moderation
        .reject_request(&request.id, "Incomplete documents")
        .expect("rejects");
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.rejection_reason, "Incomplete documents");

    assert!(matches!(
        harness
            .market
            .moderation
            .approve_request(&request.id, &harness.admin.id),
        Err(ServiceError::InvalidState(_))
    ));
    assert!(matches!(
        harness
            .market
            .moderation
            .reject_request(&RequestId::from("missing"), "x"),
        Err(ServiceError::NotFound(_))
    ));

    harness
        .market
        .accounts
        .apply_as_institution(application("Hillview College", "admissions@hillview.test"))
        .expect("rejected applicants may reapply");
}

#[test]
fn consultation_approval_schedules_and_notifies() {
    let harness = Harness::new();
    let student = harness.student("Asha", "asha@example.com");
    let booking = harness
        .market
        .moderation
        .book_consultation(
            &student,
            ConsultationBooking {
                consultation_type: "Career Guidance".to_string(),
                ..Default::default()
            },
        )
        .expect("booking stored");

    let missing_link = ConsultationSchedule {
        scheduled_date: NaiveDate::from_ymd_opt(2026, 11, 3).expect("valid date"),
        scheduled_time: "11:00".to_string(),
        mode: MeetingMode::Online,
        meeting_link: None,
        location: None,
        notes: None,
    };
    assert!(matches!(
        harness.market.moderation.approve_consultation(
            &booking.id,
            &harness.admin.id,
            missing_link.clone()
        ),
        Err(ServiceError::Invalid(_))
    ));

    let schedule = ConsultationSchedule {
        meeting_link: Some("https://meet.example.com/asha".to_string()),
        ..missing_link
    };
    let approved = harness
        .market
        .moderation
        .approve_consultation(&booking.id, &harness.admin.id, schedule)
        .expect("approves");
    assert_eq!(approved.status, ConsultationStatus::Approved);

    let confirmation = harness
        .mailer
        .last_to("asha@example.com")
        .expect("confirmation mailed");
    assert!(confirmation.body.contains("https://meet.example.com/asha"));

    let inbox = harness
        .market
        .notifications
        .inbox(&RecipientId::from(&student))
        .expect("inbox");
    assert_eq!(inbox.data[0].title, "Consultation Approved");

    assert!(matches!(
        harness.market.moderation.reject_consultation(&booking.id, "late"),
        Err(ServiceError::InvalidState(_))
    ));
    let pending = harness
        .market
        .moderation
        .list_consultations(Some(ConsultationStatus::Pending))
        .expect("listing");
    assert!(pending.is_empty());
}

#[test]
fn dashboard_counts_reflect_the_store() {
    let harness = Harness::new();
    harness.student("Asha", "asha@example.com");
    harness.student("Ravi", "ravi@example.com");
    harness.institution("Hillview College", "admissions@hillview.test");
    harness
        .market
        .accounts
        .apply_as_institution(application("Riverside Academy", "hello@riverside.test"))
        .expect("pending application");

    let stats = harness.market.moderation.dashboard_stats().expect("stats");
    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.total_institutions, 1);
    assert_eq!(stats.pending_requests, 1);
    assert_eq!(stats.pending_consultations, 0);
    assert_eq!(stats.total_reviews, 0);
}

#[test]
fn suspended_students_cannot_log_in() {
    let harness = Harness::new();
    let student = harness.student("Asha", "asha@example.com");

    let is_active = harness
        .market
        .moderation
        .toggle_user_active(&student)
        .expect("toggles");
    assert!(!is_active);

    let err = harness
        .market
        .accounts
        .login(LoginRequest {
            email: "asha@example.com".to_string(),
            password: "student-pass".to_string(),
            user_type: Some(Role::Student),
        })
        .expect_err("suspended");
    assert!(matches!(err, ServiceError::Suspended(_)));

    let page = harness
        .market
        .moderation
        .list_students(Some("ASHA"), PageRequest::default())
        .expect("listing");
    assert_eq!(page.total, 1);

    harness.market.moderation.delete_user(&student).expect("deletes");
    assert!(matches!(
        harness.market.moderation.delete_user(&student),
        Err(ServiceError::NotFound(_))
    ));
}

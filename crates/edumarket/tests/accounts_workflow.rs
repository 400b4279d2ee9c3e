//! Registration, the login portals and password recovery.

mod common;

use edumarket::accounts::{
    LoginRequest, PasswordReset, PasswordResetRequest, Registration, RegistrationOutcome, Role,
    StudentRegistration,
};
use edumarket::error::ServiceError;

use common::{application, Harness};

fn login(email: &str, password: &str, user_type: Option<Role>) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
        user_type,
    }
}

fn otp_from(body: &str) -> String {
    body.split("is: ")
        .nth(1)
        .and_then(|rest| rest.split('.').next())
        .expect("otp in body")
        .to_string()
}

#[test]
fn student_registration_issues_a_verifiable_token() {
    let harness = Harness::new();
    let outcome = harness
        .market
        .accounts
        .register(Registration::Student(StudentRegistration {
            name: "Asha".to_string(),
            email: "Asha@Example.com".to_string(),
            phone: None,
            password: "secret-1".to_string(),
        }))
        .expect("registers");

    let RegistrationOutcome::Session(session) = outcome else {
        panic!("students receive a session");
    };
    assert_eq!(session.account.email, "asha@example.com");

    let principal = harness
        .market
        .accounts
        .authenticate(&session.token)
        .expect("token verifies");
    assert_eq!(principal.role, Role::Student);
    assert_eq!(principal.subject, session.account.id);
}

#[test]
fn duplicate_student_email_conflicts() {
    let harness = Harness::new();
    harness.student("Asha", "asha@example.com");
    let err = harness
        .market
        .accounts
        .register_student(StudentRegistration {
            name: "Another".to_string(),
            email: "ASHA@example.com".to_string(),
            phone: None,
            password: "pw".to_string(),
        })
        .expect_err("duplicate");
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn institution_registration_waits_for_approval() {
    let harness = Harness::new();
    let outcome = harness
        .market
        .accounts
        .register(Registration::Institution(application(
            "Hillview College",
            "admissions@hillview.test",
        )))
        .expect("application stored");
    assert!(matches!(outcome, RegistrationOutcome::PendingApproval(_)));

    let err = harness
        .market
        .accounts
        .login(login(
            "admissions@hillview.test",
            "anything",
            Some(Role::Institution),
        ))
        .expect_err("pending");
    match err {
        ServiceError::Invalid(message) => {
            assert_eq!(message, "Your application is still pending approval.")
        }
        other => panic!("expected pending message, got {other:?}"),
    }

    assert!(matches!(
        harness
            .market
            .accounts
            .apply_as_institution(application("Hillview College", "admissions@hillview.test")),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn admins_use_their_own_portal() {
    let harness = Harness::new();
    harness.student("Asha", "asha@example.com");

    assert!(matches!(
        harness
            .market
            .accounts
            .login(login("admin@edumarket.test", "admin-pass", None)),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        harness
            .market
            .accounts
            .admin_login("asha@example.com", "student-pass"),
        Err(ServiceError::Forbidden(_))
    ));
    assert!(matches!(
        harness
            .market
            .accounts
            .admin_login("nobody@example.com", "x"),
        Err(ServiceError::Unauthorized(_))
    ));

    let session = harness
        .market
        .accounts
        .admin_login("admin@edumarket.test", "admin-pass")
        .expect("admin logs in");
    assert_eq!(session.account.user_type, Role::Admin);
}

#[test]
fn wrong_password_is_rejected() {
    let harness = Harness::new();
    harness.student("Asha", "asha@example.com");
    let err = harness
        .market
        .accounts
        .login(login("asha@example.com", "wrong", Some(Role::Student)))
        .expect_err("wrong password");
    match err {
        ServiceError::Invalid(message) => assert_eq!(message, "Invalid Credentials"),
        other => panic!("expected invalid credentials, got {other:?}"),
    }
}

#[test]
fn otp_reset_replaces_the_password_once() {
    let harness = Harness::new();
    harness.student("Asha", "asha@example.com");
    let accounts = &harness.market.accounts;

    accounts
        .request_password_reset(PasswordResetRequest {
            email: "asha@example.com".to_string(),
            user_type: Some(Role::Student),
        })
        .expect("otp issued");
    let otp = otp_from(
        &harness
            .mailer
            .last_to("asha@example.com")
            .expect("otp mailed")
            .body,
    );
    assert_eq!(otp.len(), 6);

    let reset = |otp: &str| PasswordReset {
        email: "asha@example.com".to_string(),
        otp: otp.to_string(),
        new_password: "fresh-pass".to_string(),
        user_type: Some(Role::Student),
    };
    assert!(matches!(
        accounts.reset_password(reset("000000x")),
        Err(ServiceError::Invalid(_))
    ));
    accounts.reset_password(reset(&otp)).expect("reset succeeds");
    assert!(matches!(
        accounts.reset_password(reset(&otp)),
        Err(ServiceError::Invalid(_))
    ));

    accounts
        .login(login("asha@example.com", "fresh-pass", Some(Role::Student)))
        .expect("new password works");
    assert!(accounts
        .login(login("asha@example.com", "student-pass", Some(Role::Student)))
        .is_err());
}

#[test]
fn reset_for_unknown_email_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .market
        .accounts
        .request_password_reset(PasswordResetRequest {
            email: "nobody@example.com".to_string(),
            user_type: None,
        })
        .expect_err("unknown");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[test]
fn failing_relay_surfaces_on_password_reset() {
    let harness = Harness::with_failing_mailer();
    harness.student("Asha", "asha@example.com");
    let err = harness
        .market
        .accounts
        .request_password_reset(PasswordResetRequest {
            email: "asha@example.com".to_string(),
            user_type: None,
        })
        .expect_err("mail failure surfaces");
    assert!(matches!(err, ServiceError::Mail(_)));
}

#[test]
fn changing_the_generated_password_clears_first_login() {
    let harness = Harness::new();
    let institution = harness.institution("Hillview College", "admissions@hillview.test");

    harness
        .market
        .accounts
        .change_institution_password(&institution.id, "chosen-pass")
        .expect("password changed");

    let session = harness
        .market
        .accounts
        .login(login(
            "admissions@hillview.test",
            "chosen-pass",
            Some(Role::Institution),
        ))
        .expect("institution logs in");
    assert_eq!(session.account.is_first_login, Some(false));
}

#[test]
fn suspended_accounts_fail_token_resolution() {
    let harness = Harness::new();
    let student = harness.student("Asha", "asha@example.com");
    let session = harness
        .market
        .accounts
        .login(login("asha@example.com", "student-pass", None))
        .expect("logs in");
    let principal = harness
        .market
        .accounts
        .authenticate(&session.token)
        .expect("verifies");

    harness
        .market
        .moderation
        .toggle_user_active(&student)
        .expect("suspends");
    assert!(matches!(
        harness.market.accounts.resolve(&principal),
        Err(ServiceError::Suspended(_))
    ));
}

//! Institution self-service: profile, first-login password change, inquiries, reviews and the
//! notification inbox.

use super::{data, data_with, done, inbox, ApiResult, Data, Empty};
use crate::auth::{CurrentAccount, InstitutionOnly};
use crate::extract::JsonBody;
use crate::infra::ApiState;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post, put};
use axum::Router;
use edumarket::directory::{Institution, InstitutionProfileUpdate};
use edumarket::ids::{InquiryId, ReviewId};
use edumarket::inquiries::{Inquiry, InquiryStatus};
use edumarket::reviews::{Review, ReviewEntry};
use edumarket::store::Store;
use serde::Deserialize;

pub(super) fn routes<S: Store>() -> Router<ApiState<S>> {
    Router::new()
        .route(
            "/api/institution/profile",
            get(profile).post(update_profile::<S>),
        )
        .route("/api/institution/change-password", post(change_password::<S>))
        .route("/api/institution/inquiries", get(inquiries::<S>))
        .route(
            "/api/institution/inquiries/:id/status",
            put(update_inquiry_status::<S>),
        )
        .route("/api/institution/reviews", get(reviews::<S>))
        .route("/api/institution/reviews/:id/reply", post(reply::<S>))
        .route("/api/institution/reviews/:id/like", patch(toggle_like::<S>))
        .merge(inbox::routes::<S, InstitutionOnly>("/api/institution"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePassword {
    #[serde(default)]
    new_password: String,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: InquiryStatus,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    #[serde(default)]
    reply: String,
}

async fn profile(InstitutionOnly(institution): InstitutionOnly) -> ApiResult<Data<Institution>> {
    data(institution)
}

async fn update_profile<S: Store>(
    State(state): State<ApiState<S>>,
    InstitutionOnly(institution): InstitutionOnly,
    JsonBody(update): JsonBody<InstitutionProfileUpdate>,
) -> ApiResult<Data<Institution>> {
    let updated = state
        .market
        .directory
        .update_profile(&institution.id, update)?;
    data_with("Profile updated successfully", updated)
}

async fn change_password<S: Store>(
    State(state): State<ApiState<S>>,
    InstitutionOnly(institution): InstitutionOnly,
    JsonBody(body): JsonBody<ChangePassword>,
) -> ApiResult<Empty> {
    state
        .market
        .accounts
        .change_institution_password(&institution.id, &body.new_password)?;
    done("Password updated successfully")
}

async fn inquiries<S: Store>(
    State(state): State<ApiState<S>>,
    InstitutionOnly(institution): InstitutionOnly,
) -> ApiResult<Data<Vec<Inquiry>>> {
    data(state.market.inquiries.list_for_institution(&institution.id)?)
}

async fn update_inquiry_status<S: Store>(
    State(state): State<ApiState<S>>,
    InstitutionOnly(institution): InstitutionOnly,
    Path(id): Path<InquiryId>,
    JsonBody(body): JsonBody<StatusUpdate>,
) -> ApiResult<Data<Inquiry>> {
    let inquiry = state
        .market
        .inquiries
        .update_status(&institution.id, &id, body.status)?;
    data_with("Inquiry status updated", inquiry)
}

async fn reviews<S: Store>(
    State(state): State<ApiState<S>>,
    InstitutionOnly(institution): InstitutionOnly,
) -> ApiResult<Data<Vec<ReviewEntry>>> {
    data(state.market.reviews.received_by(&institution.id)?)
}

async fn reply<S: Store>(
    State(state): State<ApiState<S>>,
    InstitutionOnly(institution): InstitutionOnly,
    Path(id): Path<ReviewId>,
    JsonBody(body): JsonBody<ReplyBody>,
) -> ApiResult<Data<Review>> {
    let review = state.market.reviews.reply(&institution.id, &id, &body.reply)?;
    data_with("Reply added successfully", review)
}

/// Any signed-in caller may mark a review helpful.
async fn toggle_like<S: Store>(
    State(state): State<ApiState<S>>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<ReviewId>,
) -> ApiResult<Data<Review>> {
    data(state.market.reviews.toggle_like(&id, account.subject())?)
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn profile_updates_keep_the_aggregate() {
        let app = TestApp::new();
        let (_, token) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;

        let (status, body) = app
            .send(
                "POST",
                "/api/institution/profile",
                Some(&token),
                Some(json!({ "description": "Since 1999", "rating": 5.0 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["description"], "Since 1999");
        assert_eq!(body["data"]["rating"], 0.0);

        let (_, body) = app
            .send("GET", "/api/institution/profile", Some(&token), None)
            .await;
        assert_eq!(body["data"]["isFirstLogin"], false);
    }

    #[tokio::test]
    async fn inquiry_status_moves_forward() {
        let app = TestApp::new();
        let (institution, token) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (_, body) = app
            .send(
                "POST",
                &format!("/api/institutions/{institution}/inquiry"),
                None,
                Some(json!({ "name": "Visitor", "email": "visitor@example.com" })),
            )
            .await;
        let inquiry = body["data"]["id"].as_str().expect("id").to_string();

        let (status, body) = app
            .send(
                "PUT",
                &format!("/api/institution/inquiries/{inquiry}/status"),
                Some(&token),
                Some(json!({ "status": "contacted" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], "contacted");
    }

    #[tokio::test]
    async fn institutions_reply_and_anyone_signed_in_can_like() {
        let app = TestApp::new();
        let (institution, institution_token) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (_, other_token) = app
            .institution("Riverside Academy", "hello@riverside.test")
            .await;
        let (_, asha) = app.student("Asha", "asha@example.com").await;
        let (status, body) = app
            .send(
                "POST",
                "/api/student/reviews",
                Some(&asha),
                Some(json!({ "institutionId": institution, "rating": 4, "comment": "Good" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let review_id = body["data"]["id"].as_str().expect("review id").to_string();

        let reply_uri = format!("/api/institution/reviews/{review_id}/reply");
        let (status, _) = app
            .send(
                "POST",
                &reply_uri,
                Some(&other_token),
                Some(json!({ "reply": "Not ours" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app
            .send(
                "POST",
                &reply_uri,
                Some(&institution_token),
                Some(json!({ "reply": "Thank you!" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["reply"], "Thank you!");

        let like_uri = format!("/api/institution/reviews/{review_id}/like");
        let (_, body) = app.send("PATCH", &like_uri, Some(&other_token), None).await;
        assert_eq!(body["data"]["likes"].as_array().map(Vec::len), Some(1));
        let (_, body) = app.send("PATCH", &like_uri, Some(&asha), None).await;
        assert_eq!(body["data"]["likes"].as_array().map(Vec::len), Some(2));
        let (_, body) = app.send("PATCH", &like_uri, Some(&other_token), None).await;
        assert_eq!(body["data"]["likes"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn changed_password_is_used_for_the_next_login() {
        let app = TestApp::new();
        let (_, token) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (status, body) = app
            .send(
                "POST",
                "/api/institution/change-password",
                Some(&token),
                Some(json!({ "newPassword": "a-better-secret" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let (status, body) = app
            .send(
                "POST",
                "/api/users/login",
                None,
                Some(json!({
                    "email": "admissions@hillview.test",
                    "password": "a-better-secret",
                    "userType": "institution"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["isFirstLogin"], false);
    }
}

//! Admin portal: login, moderation queues, account management, notifications and blog
//! editing.

use super::{created, data, data_with, done, flat, ApiResult, Created, Data, Empty};
use crate::auth::AdminOnly;
use crate::extract::JsonBody;
use crate::infra::ApiState;
use crate::uploads::{self, FormShape, UploadError};
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use edumarket::accounts::{AuthSession, UserRecord};
use edumarket::catalog::{Blog, BlogDraft};
use edumarket::directory::Institution;
use edumarket::ids::{BlogId, ConsultationId, InstitutionId, RequestId, ReviewId, UserId};
use edumarket::moderation::{
    Consultation, ConsultationSchedule, ConsultationStatus, DashboardStats, InstitutionRequest,
};
use edumarket::notifications::{Audience, DirectMessage, Notification};
use edumarket::reviews::{RatingSummary, Review, ReviewEntry};
use edumarket::store::{Page, PageRequest, Store};
use serde::Deserialize;
use serde_json::{json, Value};

const RECENT_NOTIFICATIONS: usize = 20;

/// Blog forms carry an optional `image` file next to their text fields.
const BLOG_FORM: FormShape<'static> = FormShape {
    files: &[("image", "image", 1)],
    typed: &[],
};

pub(super) fn routes<S: Store>() -> Router<ApiState<S>> {
    Router::new()
        .route("/api/admin/login", post(login::<S>))
        .route("/api/admin/dashboard/stats", get(dashboard::<S>))
        .route("/api/admin/institution-requests", get(list_requests::<S>))
        .route(
            "/api/admin/institution-requests/:id/approve",
            post(approve_request::<S>),
        )
        .route(
            "/api/admin/institution-requests/:id/reject",
            post(reject_request::<S>),
        )
        .route("/api/admin/consultations", get(list_consultations::<S>))
        .route(
            "/api/admin/consultations/:id/approve",
            post(approve_consultation::<S>),
        )
        .route(
            "/api/admin/consultations/:id/reject",
            post(reject_consultation::<S>),
        )
        .route("/api/admin/students", get(list_students::<S>))
        .route(
            "/api/admin/users/:id/toggle-status",
            patch(toggle_user::<S>),
        )
        .route("/api/admin/users/:id", delete(delete_user::<S>))
        .route("/api/admin/institutions", get(list_institutions::<S>))
        .route(
            "/api/admin/institutions/:id/toggle-status",
            patch(toggle_institution::<S>),
        )
        .route("/api/admin/institutions/:id", delete(delete_institution::<S>))
        .route("/api/admin/reviews", get(list_reviews::<S>))
        .route("/api/admin/reviews/:id", delete(delete_review::<S>))
        .route(
            "/api/admin/reviews/:id/approval",
            patch(set_review_approval::<S>),
        )
        .route("/api/admin/notifications", get(recent_notifications::<S>))
        .route(
            "/api/admin/notifications/send",
            post(send_notification::<S>),
        )
        .route(
            "/api/admin/notifications/bulk-send",
            post(bulk_send::<S>),
        )
        .route(
            "/api/admin/blogs",
            get(list_blogs::<S>).post(create_blog::<S>),
        )
        .route(
            "/api/admin/blogs/:id",
            put(update_blog::<S>).delete(delete_blog::<S>),
        )
}

#[derive(Debug, Deserialize)]
struct AdminLogin {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct Rejection {
    reason: String,
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    search: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

impl ListQuery {
    fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConsultationFilter {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkMessage {
    user_type: Audience,
    #[serde(default)]
    title: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Approval {
    is_approved: bool,
}

#[derive(Debug, Deserialize)]
struct BlogForm {
    #[serde(flatten)]
    draft: BlogDraft,
    #[serde(default)]
    image: Option<String>,
}

async fn login<S: Store>(
    State(state): State<ApiState<S>>,
    JsonBody(body): JsonBody<AdminLogin>,
) -> ApiResult<AuthSession> {
    flat(state.market.accounts.admin_login(&body.email, &body.password)?)
}

async fn dashboard<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
) -> ApiResult<Data<DashboardStats>> {
    data(state.market.moderation.dashboard_stats()?)
}

async fn list_requests<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
) -> ApiResult<Data<Vec<InstitutionRequest>>> {
    data(state.market.moderation.list_requests()?)
}

async fn approve_request<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(admin): AdminOnly,
    Path(id): Path<RequestId>,
) -> ApiResult<Data<Institution>> {
    let institution = state.market.moderation.approve_request(&id, &admin.id)?;
    data_with(
        "Institution approved. Login credentials have been emailed.",
        institution,
    )
}

async fn reject_request<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<RequestId>,
    JsonBody(body): JsonBody<Rejection>,
) -> ApiResult<Data<InstitutionRequest>> {
    let request = state.market.moderation.reject_request(&id, &body.reason)?;
    data_with("Institution request rejected", request)
}

async fn list_consultations<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Query(filter): Query<ConsultationFilter>,
) -> ApiResult<Data<Vec<Consultation>>> {
    let status = ConsultationStatus::parse_filter(filter.status.as_deref());
    data(state.market.moderation.list_consultations(status)?)
}

async fn approve_consultation<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(admin): AdminOnly,
    Path(id): Path<ConsultationId>,
    JsonBody(schedule): JsonBody<ConsultationSchedule>,
) -> ApiResult<Data<Consultation>> {
    let consultation = state
        .market
        .moderation
        .approve_consultation(&id, &admin.id, schedule)?;
    data_with("Consultation approved", consultation)
}

async fn reject_consultation<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<ConsultationId>,
    JsonBody(body): JsonBody<Rejection>,
) -> ApiResult<Data<Consultation>> {
    let consultation = state
        .market
        .moderation
        .reject_consultation(&id, &body.reason)?;
    data_with("Consultation rejected", consultation)
}

async fn list_students<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<UserRecord>> {
    flat(
        state
            .market
            .moderation
            .list_students(query.search.as_deref(), query.page())?,
    )
}

async fn toggle_user<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<UserId>,
) -> ApiResult<Data<Value>> {
    let is_active = state.market.moderation.toggle_user_active(&id)?;
    data(json!({ "isActive": is_active }))
}

async fn delete_user<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<UserId>,
) -> ApiResult<Empty> {
    state.market.moderation.delete_user(&id)?;
    done("User deleted successfully")
}

async fn list_institutions<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Query(query): Query<ListQuery>,
) -> ApiResult<Page<Institution>> {
    flat(
        state
            .market
            .directory
            .admin_list(query.search.as_deref(), query.page())?,
    )
}

async fn toggle_institution<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<InstitutionId>,
) -> ApiResult<Data<Value>> {
    let is_active = state.market.directory.toggle_active(&id)?;
    data(json!({ "isActive": is_active }))
}

async fn delete_institution<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<InstitutionId>,
) -> ApiResult<Empty> {
    state.market.directory.delete(&id)?;
    done("Institution deleted successfully")
}

async fn list_reviews<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
) -> ApiResult<Data<Vec<ReviewEntry>>> {
    data(state.market.reviews.all_entries()?)
}

async fn delete_review<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<ReviewId>,
) -> ApiResult<Data<RatingSummary>> {
    let summary = state.market.reviews.admin_delete(&id)?;
    data_with("Review deleted successfully", summary)
}

async fn set_review_approval<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<ReviewId>,
    JsonBody(body): JsonBody<Approval>,
) -> ApiResult<Data<Review>> {
    let review = state.market.reviews.set_approval(&id, body.is_approved)?;
    let message = if review.is_approved {
        "Review approved"
    } else {
        "Review hidden"
    };
    data_with(message, review)
}

async fn recent_notifications<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
) -> ApiResult<Data<Vec<Notification>>> {
    data(state.market.notifications.recent(RECENT_NOTIFICATIONS)?)
}

async fn send_notification<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    JsonBody(message): JsonBody<DirectMessage>,
) -> ApiResult<Data<Notification>> {
    let notification = state.market.notifications.send_direct(message)?;
    data_with("Sent", notification)
}

async fn bulk_send<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    JsonBody(body): JsonBody<BulkMessage>,
) -> ApiResult<Data<Value>> {
    let recipients = state
        .market
        .notifications
        .broadcast(body.user_type, &body.title, &body.message)?;
    data_with(
        &format!("Notification sent to {recipients} users successfully."),
        json!({ "recipients": recipients }),
    )
}

async fn list_blogs<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
) -> ApiResult<Data<Vec<Blog>>> {
    data(state.market.catalog.blogs()?)
}

async fn create_blog<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    multipart: Multipart,
) -> Result<Created<Blog>, UploadError> {
    let form: BlogForm = uploads::decode_form(&state.uploads, multipart, &BLOG_FORM).await?;
    let image = form.image.clone();
    match state.market.catalog.create_blog(form.draft, form.image) {
        Ok(blog) => Ok(created("Blog posted successfully!", blog)),
        Err(err) => {
            discard_image(&state, image.as_deref()).await;
            Err(err.into())
        }
    }
}

async fn update_blog<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<BlogId>,
    multipart: Multipart,
) -> Result<ApiResult<Data<Blog>>, UploadError> {
    let form: BlogForm = uploads::decode_form(&state.uploads, multipart, &BLOG_FORM).await?;
    let image = form.image.clone();
    match state.market.catalog.update_blog(&id, form.draft, form.image) {
        Ok(blog) => Ok(data_with("Blog updated successfully!", blog)),
        Err(err) => {
            discard_image(&state, image.as_deref()).await;
            Err(err.into())
        }
    }
}

async fn discard_image<S: Store>(state: &ApiState<S>, image: Option<&str>) {
    if let Some(url) = image {
        uploads::remove(&state.uploads, url).await;
    }
}

async fn delete_blog<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    Path(id): Path<BlogId>,
) -> ApiResult<Empty> {
    state.market.catalog.delete_blog(&id)?;
    done("Blog deleted successfully")
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestApp;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn admin_login_refuses_other_roles() {
        let app = TestApp::new();
        app.student("Asha", "asha@example.com").await;
        let (status, body) = app
            .send(
                "POST",
                "/api/admin/login",
                None,
                Some(json!({ "email": "asha@example.com", "password": "student-pass" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access Denied");
    }

    #[tokio::test]
    async fn second_approval_is_rejected() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        app.institution("Hillview College", "admissions@hillview.test")
            .await;

        let (_, body) = app
            .send("GET", "/api/admin/institution-requests", Some(&admin), None)
            .await;
        let request = body["data"][0]["id"].as_str().expect("request id").to_string();
        assert_eq!(body["data"][0]["status"], "approved");

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/admin/institution-requests/{request}/approve"),
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Already processed");

        let (_, body) = app
            .send("GET", "/api/admin/institutions?page=1&limit=5", Some(&admin), None)
            .await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["currentPage"], 1);
    }

    #[tokio::test]
    async fn broadcast_reports_the_recipient_count() {
        let app = TestApp::new();
        let admin = app.admin_token().await;

        let (status, body) = app
            .send(
                "POST",
                "/api/admin/notifications/bulk-send",
                Some(&admin),
                Some(json!({ "userType": "all", "title": "Hi", "message": "Hello" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No users found");

        app.student("Asha", "asha@example.com").await;
        app.institution("Hillview College", "admissions@hillview.test")
            .await;
        let (status, body) = app
            .send(
                "POST",
                "/api/admin/notifications/bulk-send",
                Some(&admin),
                Some(json!({ "userType": "all", "title": "Hi", "message": "Hello" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["message"], "Notification sent to 2 users successfully.");
        assert_eq!(body["data"]["recipients"], 2);
    }

    #[tokio::test]
    async fn consultation_approval_validates_the_schedule() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let (_, student) = app.student("Asha", "asha@example.com").await;
        let (_, body) = app
            .send(
                "POST",
                "/api/consultations",
                Some(&student),
                Some(json!({ "consultationType": "Admissions" })),
            )
            .await;
        let id = body["data"]["id"].as_str().expect("id").to_string();
        let uri = format!("/api/admin/consultations/{id}/approve");

        let (status, _) = app
            .send(
                "POST",
                &uri,
                Some(&admin),
                Some(json!({
                    "scheduledDate": "2026-11-03",
                    "scheduledTime": "10:30",
                    "mode": "offline"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send(
                "POST",
                &uri,
                Some(&admin),
                Some(json!({
                    "scheduledDate": "2026-11-03",
                    "scheduledTime": "10:30",
                    "mode": "offline",
                    "location": "Pune office"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["status"], "approved");

        let (_, body) = app
            .send(
                "GET",
                "/api/admin/consultations?status=pending",
                Some(&admin),
                None,
            )
            .await;
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn blogs_are_posted_as_forms_with_an_image() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let (status, body) = app
            .send_multipart(
                "POST",
                "/api/admin/blogs",
                Some(&admin),
                &[
                    ("title", None, "Choosing a college"),
                    ("content", None, "Start early."),
                    ("image", Some(("cover.png", "image/png")), "png-bytes"),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Blog posted successfully!");
        let image = body["data"]["image"].as_str().expect("image").to_string();
        assert!(image.starts_with("/public/uploads/"), "{image}");
        let id = body["data"]["id"].as_str().expect("id").to_string();

        let (status, body) = app
            .send_multipart(
                "PUT",
                &format!("/api/admin/blogs/{id}"),
                Some(&admin),
                &[("title", None, ""), ("excerpt", None, "A short guide")],
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["title"], "Choosing a college");
        assert_eq!(body["data"]["excerpt"], "A short guide");
        assert_eq!(body["data"]["image"], image.as_str());

        let (_, body) = app.send("GET", "/api/admin/blogs", Some(&admin), None).await;
        assert_eq!(body["data"][0]["id"], id.as_str());

        let (status, _) = app
            .send("DELETE", &format!("/api/admin/blogs/{id}"), Some(&admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.send("GET", &format!("/api/blogs/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refused_blog_forms_leave_no_files_behind() {
        let app = TestApp::new();
        let admin = app.admin_token().await;

        let (status, body) = app
            .send_multipart(
                "POST",
                "/api/admin/blogs",
                Some(&admin),
                &[
                    ("content", None, "No title here."),
                    ("image", Some(("cover.png", "image/png")), "png-bytes"),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["success"], false);
        assert_eq!(app.stored_uploads(), 0);

        let (status, body) = app
            .send_multipart(
                "POST",
                "/api/admin/blogs",
                Some(&admin),
                &[
                    ("title", None, "Scripted"),
                    ("image", Some(("cover.html", "text/html")), "<script></script>"),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Only image uploads are allowed");
        assert_eq!(app.stored_uploads(), 0);
    }

    #[tokio::test]
    async fn hidden_reviews_leave_the_public_aggregate() {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let (institution, institution_token) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (_, asha) = app.student("Asha", "asha@example.com").await;
        let (_, ravi) = app.student("Ravi", "ravi@example.com").await;
        let mut reviews = Vec::new();
        for (token, rating) in [(&asha, 5), (&ravi, 1)] {
            let (status, body) = app
                .send(
                    "POST",
                    "/api/student/reviews",
                    Some(token),
                    Some(json!({
                        "institutionId": institution,
                        "rating": rating,
                        "comment": "Honest feedback"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
            reviews.push(body["data"]["id"].as_str().expect("id").to_string());
        }

        let approval = format!("/api/admin/reviews/{}/approval", reviews[1]);
        let (status, _) = app
            .send("PATCH", &approval, Some(&asha), Some(json!({ "isApproved": false })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = app
            .send("PATCH", &approval, Some(&admin), Some(json!({ "isApproved": false })))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["isApproved"], false);

        let (_, body) = app
            .send("GET", &format!("/api/institutions/{institution}"), None, None)
            .await;
        assert_eq!(body["data"]["rating"], 5.0);
        assert_eq!(body["data"]["totalReviews"], 1);
        let (_, body) = app
            .send("GET", &format!("/api/institutions/{institution}/reviews"), None, None)
            .await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
        let (_, body) = app
            .send("GET", "/api/institution/reviews", Some(&institution_token), None)
            .await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

        let (status, body) = app
            .send("PATCH", &approval, Some(&admin), Some(json!({ "isApproved": true })))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let (_, body) = app
            .send("GET", &format!("/api/institutions/{institution}"), None, None)
            .await;
        assert_eq!(body["data"]["rating"], 3.0);
        assert_eq!(body["data"]["totalReviews"], 2);
    }
}

//! Directory browsing, institution-page reviews and inquiries, blogs, home summary and uploads.

use super::{created, data, ApiResult, Created, Data};
use crate::auth::{MaybeStudent, StudentOnly};
use crate::extract::JsonBody;
use crate::infra::ApiState;
use crate::uploads::{self, UploadError};
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use edumarket::catalog::{Blog, HomeSummary};
use edumarket::directory::{Institution, InstitutionQuery};
use edumarket::ids::{BlogId, InstitutionId};
use edumarket::inquiries::{Inquiry, InquiryForm};
use edumarket::reviews::{NewReview, Review, ReviewEntry};
use edumarket::store::Store;
use serde::Deserialize;
use serde_json::{json, Value};

pub(super) fn routes<S: Store>() -> Router<ApiState<S>> {
    Router::new()
        .route("/api/institutions", get(list_institutions::<S>))
        .route("/api/institutions/:id", get(get_institution::<S>))
        .route(
            "/api/institutions/:id/reviews",
            get(institution_reviews::<S>).post(review_institution::<S>),
        )
        .route("/api/institutions/:id/inquiry", post(submit_inquiry::<S>))
        .route("/api/blogs", get(list_blogs::<S>))
        .route("/api/blogs/:id", get(get_blog::<S>))
        .route("/api/public", get(home_summary::<S>))
        .route("/api/upload", post(upload::<S>))
}

async fn list_institutions<S: Store>(
    State(state): State<ApiState<S>>,
    Query(query): Query<InstitutionQuery>,
) -> ApiResult<Data<Vec<Institution>>> {
    data(state.market.directory.search(&query)?)
}

async fn get_institution<S: Store>(
    State(state): State<ApiState<S>>,
    Path(id): Path<InstitutionId>,
) -> ApiResult<Data<Institution>> {
    data(state.market.directory.get(&id)?)
}

async fn institution_reviews<S: Store>(
    State(state): State<ApiState<S>>,
    Path(id): Path<InstitutionId>,
) -> ApiResult<Data<Vec<ReviewEntry>>> {
    data(state.market.reviews.published_for(&id)?)
}

/// Review posted from an institution page; the institution comes from the path.
#[derive(Debug, Deserialize)]
struct PageReview {
    rating: i64,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    course: Option<String>,
}

async fn review_institution<S: Store>(
    State(state): State<ApiState<S>>,
    StudentOnly(student): StudentOnly,
    Path(id): Path<InstitutionId>,
    JsonBody(body): JsonBody<PageReview>,
) -> Created<Review> {
    let form = NewReview {
        institution_id: id,
        rating: body.rating,
        comment: body.comment,
        course: body.course,
    };
    let review = state.market.reviews.submit(&student.id, form)?;
    created("Review submitted", review)
}

/// Open to visitors. A signed-in student becomes the author, replacing their earlier inquiry.
async fn submit_inquiry<S: Store>(
    State(state): State<ApiState<S>>,
    MaybeStudent(student): MaybeStudent,
    Path(id): Path<InstitutionId>,
    JsonBody(form): JsonBody<InquiryForm>,
) -> Created<Inquiry> {
    let author = student.as_ref().map(|student| &student.id);
    let inquiry = state.market.inquiries.submit(&id, author, form)?;
    created("Inquiry submitted successfully", inquiry)
}

async fn list_blogs<S: Store>(State(state): State<ApiState<S>>) -> ApiResult<Data<Vec<Blog>>> {
    data(state.market.catalog.blogs()?)
}

async fn get_blog<S: Store>(
    State(state): State<ApiState<S>>,
    Path(id): Path<BlogId>,
) -> ApiResult<Data<Blog>> {
    data(state.market.catalog.blog(&id)?)
}

async fn home_summary<S: Store>(State(state): State<ApiState<S>>) -> ApiResult<Data<HomeSummary>> {
    data(state.market.catalog.home_summary()?)
}

async fn upload<S: Store>(
    State(state): State<ApiState<S>>,
    multipart: Multipart,
) -> Result<Json<Value>, UploadError> {
    let urls = uploads::store_all(&state.uploads, multipart).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Files uploaded successfully",
        "urls": urls,
    })))
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestApp;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn directory_lists_only_approved_institutions() {
        let app = TestApp::new();
        let (status, body) = app.send("GET", "/api/institutions", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));

        let (id, _) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (_, body) = app
            .send("GET", "/api/institutions?city=Pune,Mumbai&sortBy=name", None, None)
            .await;
        assert_eq!(body["data"][0]["id"], id.as_str());
        assert_eq!(body["data"][0]["rating"], 0.0);
        assert!(body["data"][0].get("credentials").is_none());

        let (status, body) = app.send("GET", "/api/institutions/unknown", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Institution not found");
    }

    #[tokio::test]
    async fn anonymous_inquiries_are_accepted() {
        let app = TestApp::new();
        let (id, _) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (status, body) = app
            .send(
                "POST",
                &format!("/api/institutions/{id}/inquiry"),
                None,
                Some(json!({ "name": "Visitor", "email": "visitor@example.com" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["courseInterest"], "General Inquiry");
        assert_eq!(body["data"]["status"], "new");
        assert_eq!(body["data"]["userId"], Value::Null);
    }

    #[tokio::test]
    async fn anonymous_callers_cannot_post_as_a_student() {
        let app = TestApp::new();
        let (institution, institution_token) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (student, token) = app.student("Asha", "asha@example.com").await;
        let uri = format!("/api/institutions/{institution}/inquiry");

        let (status, body) = app
            .send(
                "POST",
                &uri,
                Some(&token),
                Some(json!({ "name": "Asha", "email": "asha@example.com", "message": "Fees?" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["userId"], student.as_str());

        let (status, body) = app
            .send(
                "POST",
                &uri,
                None,
                Some(json!({
                    "userId": student,
                    "name": "Mallory",
                    "email": "mallory@example.com",
                    "message": "spoof"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["userId"], Value::Null);

        let (_, body) = app
            .send("GET", "/api/institution/inquiries", Some(&institution_token), None)
            .await;
        let inquiries = body["data"].as_array().expect("list");
        assert_eq!(inquiries.len(), 2);
        assert!(inquiries
            .iter()
            .any(|inquiry| inquiry["userId"] == student.as_str() && inquiry["message"] == "Fees?"));
    }

    #[tokio::test]
    async fn invalid_tokens_are_not_downgraded_to_anonymous() {
        let app = TestApp::new();
        let (institution, _) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (status, body) = app
            .send(
                "POST",
                &format!("/api/institutions/{institution}/inquiry"),
                Some("not-a-token"),
                Some(json!({ "name": "Visitor", "email": "visitor@example.com" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn institution_page_reviews_take_the_author_from_the_token() {
        let app = TestApp::new();
        let (institution, _) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (student, token) = app.student("Asha", "asha@example.com").await;
        let uri = format!("/api/institutions/{institution}/reviews");

        let (status, _) = app
            .send(
                "POST",
                &uri,
                None,
                Some(json!({ "userId": student, "rating": 5, "comment": "Great" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send(
                "POST",
                &uri,
                Some(&token),
                Some(json!({ "rating": 4, "comment": "Great labs" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["message"], "Review submitted");

        let (_, body) = app.send("GET", &uri, None, None).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn ill_typed_bodies_get_the_error_envelope() {
        let app = TestApp::new();
        let (institution, _) = app
            .institution("Hillview College", "admissions@hillview.test")
            .await;
        let (_, token) = app.student("Asha", "asha@example.com").await;

        let (status, body) = app
            .send(
                "POST",
                &format!("/api/institutions/{institution}/reviews"),
                Some(&token),
                Some(json!({ "rating": 4.5, "comment": "Half a star" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().is_some_and(|message| message.contains("rating")));

        let (status, body) = app
            .send_raw(
                "POST",
                &format!("/api/institutions/{institution}/inquiry"),
                "application/json",
                "{ not json",
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn uploads_accept_images_only() {
        let app = TestApp::new();
        let (status, body) = app
            .send_multipart(
                "POST",
                "/api/upload",
                None,
                &[("files", Some(("campus.png", "image/png")), "png-bytes")],
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let url = body["urls"][0].as_str().expect("url");
        assert!(url.starts_with("/public/uploads/") && url.ends_with(".png"));

        for (file, content_type) in [
            ("x.html", "text/html"),
            ("x.svg", "image/svg+xml"),
            ("x.html", "application/octet-stream"),
        ] {
            let (status, body) = app
                .send_multipart(
                    "POST",
                    "/api/upload",
                    None,
                    &[("files", Some((file, content_type)), "<script>alert(1)</script>")],
                )
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{file}");
            assert_eq!(body["message"], "Only image uploads are allowed");
        }
    }

    #[tokio::test]
    async fn refused_uploads_leave_nothing_behind() {
        let app = TestApp::new();
        let before = app.stored_uploads();
        let (status, _) = app
            .send_multipart(
                "POST",
                "/api/upload",
                None,
                &[
                    ("files", Some(("first.png", "image/png")), "png-bytes"),
                    ("files", Some(("second.html", "text/html")), "<p>hi</p>"),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(app.stored_uploads(), before);
    }

    #[tokio::test]
    async fn home_summary_counts_the_catalog() {
        let app = TestApp::new();
        app.student("Asha", "asha@example.com").await;
        let (status, body) = app.send("GET", "/api/public", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totalStudents"], 1);
        assert_eq!(body["data"]["latestBlogs"], json!([]));
    }
}

//! Student dashboard. The same routes answer under `/api/student` and the older `/api/users`
//! prefix.

use super::{created, data, inbox, ApiResult, Created, Data};
use crate::auth::StudentOnly;
use crate::extract::JsonBody;
use crate::infra::ApiState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use edumarket::ids::ConsultationId;
use edumarket::inquiries::{Inquiry, StudentInquiry};
use edumarket::moderation::{Consultation, ConsultationBooking};
use edumarket::reviews::{NewReview, Review, ReviewEntry};
use edumarket::store::Store;

const PREFIXES: [&str; 2] = ["/api/student", "/api/users"];

pub(super) fn routes<S: Store>() -> Router<ApiState<S>> {
    let dashboard = PREFIXES.iter().fold(Router::new(), |router, prefix| {
        router
            .route(
                &format!("{prefix}/reviews"),
                get(my_reviews::<S>).post(submit_review::<S>),
            )
            .route(&format!("{prefix}/inquiries"), post(send_inquiry::<S>))
            .merge(inbox::routes::<S, StudentOnly>(prefix))
    });
    dashboard
        .route(
            "/api/consultations",
            get(my_consultations::<S>).post(book_consultation::<S>),
        )
        .route("/api/consultations/:id", get(my_consultation::<S>))
}

async fn my_reviews<S: Store>(
    State(state): State<ApiState<S>>,
    StudentOnly(student): StudentOnly,
) -> ApiResult<Data<Vec<ReviewEntry>>> {
    data(state.market.reviews.written_by(&student.id)?)
}

async fn submit_review<S: Store>(
    State(state): State<ApiState<S>>,
    StudentOnly(student): StudentOnly,
    JsonBody(form): JsonBody<NewReview>,
) -> Created<Review> {
    let review = state.market.reviews.submit(&student.id, form)?;
    created("Review submitted successfully", review)
}

async fn send_inquiry<S: Store>(
    State(state): State<ApiState<S>>,
    StudentOnly(student): StudentOnly,
    JsonBody(request): JsonBody<StudentInquiry>,
) -> Created<Inquiry> {
    let inquiry = state.market.inquiries.submit_as_student(&student.id, request)?;
    created("Inquiry sent successfully", inquiry)
}

async fn my_consultations<S: Store>(
    State(state): State<ApiState<S>>,
    StudentOnly(student): StudentOnly,
) -> ApiResult<Data<Vec<Consultation>>> {
    data(state.market.moderation.consultations_for(&student.id)?)
}

async fn my_consultation<S: Store>(
    State(state): State<ApiState<S>>,
    StudentOnly(student): StudentOnly,
    Path(id): Path<ConsultationId>,
) -> ApiResult<Data<Consultation>> {
    data(state.market.moderation.consultation_for(&student.id, &id)?)
}

async fn book_consultation<S: Store>(
    State(state): State<ApiState<S>>,
    StudentOnly(student): StudentOnly,
    JsonBody(booking): JsonBody<ConsultationBooking>,
) -> Created<Consultation> {
    let consultation = state.market.moderation.book_consultation(&student.id, booking)?;
    created("Consultation booked successfully", consultation)
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{RatingBreakdown, Review};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(max = 2000))]
    pub content: Option<String>,

    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(max = 2000))]
    pub content: Option<String>,

    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
}

// Comentario junto con el resumen del post ya recalculado
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    #[serde(flatten)]
    pub review: Review,
    pub post_rating: RatingBreakdown,
}

use serde::Serialize;

/// Mean rating rounded half-up to one decimal, plus the number of reviews it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: f64,
    pub total_reviews: u32,
}

impl RatingSummary {
    pub const EMPTY: Self = Self {
        rating: 0.0,
        total_reviews: 0,
    };

    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = u8>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), rating| {
                (sum + u64::from(rating), count + 1)
            });
        if count == 0 {
            return Self::EMPTY;
        }

        // Integer tenths avoid binary float artefacts at the .x5 boundary.
        let tenths = (sum * 20 + count) / (2 * count);
        Self {
            rating: tenths as f64 / 10.0,
            total_reviews: u32::try_from(count).unwrap_or(u32::MAX),
        }
    }
}

//! Inference contract consumed by front ends
//!
//! Load an artifact once, then rank crops for any number of soil readings.

mod profiles;
mod recommender;

pub use profiles::CropProfile;
pub use recommender::{CropRecommender, Recommendation, DEFAULT_TOP_K};

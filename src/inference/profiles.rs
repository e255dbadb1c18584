//! Static agronomic notes for common crops

use serde::Serialize;

/// Growing notes shown next to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropProfile {
    pub crop: &'static str,
    pub best_season: &'static str,
    pub required_nutrients: &'static str,
    pub expected_yield: &'static str,
}

const PROFILES: [CropProfile; 6] = [
    CropProfile {
        crop: "Wheat",
        best_season: "Winter",
        required_nutrients: "High Nitrogen",
        expected_yield: "3-4 tons/ha",
    },
    CropProfile {
        crop: "Rice",
        best_season: "Monsoon",
        required_nutrients: "High Phosphorus",
        expected_yield: "4-6 tons/ha",
    },
    CropProfile {
        crop: "Maize",
        best_season: "Summer",
        required_nutrients: "Balanced NPK",
        expected_yield: "5-7 tons/ha",
    },
    CropProfile {
        crop: "Sugarcane",
        best_season: "Tropical",
        required_nutrients: "High Potassium",
        expected_yield: "80-100 tons/ha",
    },
    CropProfile {
        crop: "Barley",
        best_season: "Winter",
        required_nutrients: "Moderate Nitrogen",
        expected_yield: "2-3 tons/ha",
    },
    CropProfile {
        crop: "Soybean",
        best_season: "Monsoon",
        required_nutrients: "High Phosphorus",
        expected_yield: "2-4 tons/ha",
    },
];

impl CropProfile {
    /// Case-insensitive lookup; most crops have no profile
    pub fn lookup(crop: &str) -> Option<CropProfile> {
        PROFILES
            .iter()
            .find(|p| p.crop.eq_ignore_ascii_case(crop.trim()))
            .copied()
    }

    pub fn all() -> &'static [CropProfile] {
        &PROFILES
    }
}

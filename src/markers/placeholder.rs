//! Synthetic place-data provider.
//!
//! Every value produced here is a PLACEHOLDER, not a fact: ratings, review
//! counts, opening hours, addresses, phone numbers and photos are
//! synthesized because no real places backend is wired in. The provider
//! sits behind [`PlaceDataProvider`] so a real data source can replace it
//! without touching marker synthesis.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Presentation details for one place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    /// Star rating in 3.5–5.0 (synthetic).
    pub rating: f32,
    /// Review count (synthetic).
    pub review_count: u32,
    /// Photo URL (placeholder image service).
    pub photo_url: String,
    /// Opening hours line (synthetic).
    pub hours: String,
    /// Street address (synthetic).
    pub address: String,
    /// Phone number in the reserved 555 range (synthetic).
    pub phone: String,
    /// Website URL (synthetic).
    pub website: String,
}

/// Source of per-place presentation details.
pub trait PlaceDataProvider: Send + Sync {
    /// Produce details for the place with the given title.
    fn details(&self, title: &str) -> PlaceDetails;
}

/// Placeholder implementation seeded from the place title, so repeated
/// mentions of the same place render consistently within a session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticPlaceData;

const STREET_NAMES: &[&str] = &[
    "Market St", "Oak Ave", "Harbor Rd", "Station Way", "Mill Lane", "High St", "Park Blvd",
    "River Ter",
];

const HOURS: &[&str] = &[
    "Open 7am – 7pm",
    "Open 8am – 10pm",
    "Open 9am – 6pm",
    "Open 24 hours",
    "Open 10am – 8pm",
];

impl PlaceDataProvider for SyntheticPlaceData {
    fn details(&self, title: &str) -> PlaceDetails {
        let mut rng = StdRng::seed_from_u64(seed_for(title));
        let slug = slugify(title);
        let rating = (rng.gen_range(35..=50) as f32) / 10.0;
        PlaceDetails {
            rating,
            review_count: rng.gen_range(20..2_000),
            photo_url: format!("https://picsum.photos/seed/{slug}/400/300"),
            hours: HOURS[rng.gen_range(0..HOURS.len())].to_owned(),
            address: format!(
                "{} {}",
                rng.gen_range(1..900),
                STREET_NAMES[rng.gen_range(0..STREET_NAMES.len())]
            ),
            phone: format!("+1 (555) 01{:01}-{:04}", rng.gen_range(0..10), rng.gen_range(0..10_000)),
            website: format!("https://{slug}.example.com"),
        }
    }
}

fn seed_for(title: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    title.hash(&mut hasher);
    hasher.finish()
}

fn slugify(title: &str) -> String {
    let mut slug: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "place".to_owned()
    } else {
        trimmed.to_owned()
    }
}

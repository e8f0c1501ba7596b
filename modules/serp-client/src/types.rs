use serde::Deserialize;

/// One listing from a Google Maps search (`engine=google_maps`, `type=search`).
///
/// SerpAPI omits absent fields rather than sending null, so everything beyond
/// the title is optional. Loosely-shaped blobs (hours, service options,
/// popular times) stay as raw JSON for the caller to flatten.
#[derive(Debug, Clone, Deserialize)]
pub struct MapsPlace {
    #[serde(default)]
    pub title: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub operating_hours: Option<serde_json::Value>,
    pub hours: Option<serde_json::Value>,
    pub gps_coordinates: Option<GpsCoordinates>,
    pub place_id: Option<String>,
    pub data_id: Option<String>,
    pub service_options: Option<serde_json::Value>,
    #[serde(default)]
    pub extensions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Rich single-place payload (`engine=google_maps`, `type=place`).
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub title: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub operating_hours: Option<serde_json::Value>,
    pub hours: Option<serde_json::Value>,
    pub plus_code: Option<String>,
    pub amenities: Option<serde_json::Value>,
    pub service_options: Option<serde_json::Value>,
    #[serde(default)]
    pub extensions: Vec<serde_json::Value>,
    pub popular_times: Option<serde_json::Value>,
    pub user_reviews: Option<UserReviews>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserReviews {
    #[serde(default)]
    pub most_relevant: Vec<ReviewSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSnippet {
    pub snippet: Option<String>,
    pub text: Option<String>,
}

/// One place from the Google local pack (`engine=google`).
#[derive(Debug, Clone, Deserialize)]
pub struct LocalPlace {
    #[serde(default)]
    pub title: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub hours: Option<String>,
}

/// One business from a Yelp search (`engine=yelp`).
#[derive(Debug, Clone, Deserialize)]
pub struct YelpBusiness {
    #[serde(default)]
    pub title: String,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub link: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u64>,
    pub categories: Option<serde_json::Value>,
    pub price_range: Option<String>,
    pub snippet: Option<String>,
}

// --- Response envelopes ---

#[derive(Debug, Deserialize)]
pub(crate) struct MapsSearchResponse {
    #[serde(default)]
    pub local_results: Vec<MapsPlace>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaceDetailsResponse {
    pub place_results: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleSearchResponse {
    pub local_results: Option<LocalPack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocalPack {
    #[serde(default)]
    pub places: Vec<LocalPlace>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct YelpSearchResponse {
    #[serde(default)]
    pub organic_results: Vec<YelpBusiness>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_place_parses_sparse_result() {
        let raw = r#"{"title": "Tattva Spa", "rating": 4.5, "reviews": 120}"#;
        let place: MapsPlace = serde_json::from_str(raw).unwrap();
        assert_eq!(place.title, "Tattva Spa");
        assert_eq!(place.rating, Some(4.5));
        assert!(place.address.is_none());
        assert!(place.extensions.is_empty());
    }

    #[test]
    fn place_details_parses_review_snippets() {
        let raw = r#"{
            "title": "Tattva Spa",
            "user_reviews": {"most_relevant": [{"snippet": "Great massage"}, {"text": "Clean rooms"}]}
        }"#;
        let details: PlaceDetails = serde_json::from_str(raw).unwrap();
        let reviews = details.user_reviews.unwrap();
        assert_eq!(reviews.most_relevant.len(), 2);
        assert_eq!(reviews.most_relevant[0].snippet.as_deref(), Some("Great massage"));
        assert_eq!(reviews.most_relevant[1].text.as_deref(), Some("Clean rooms"));
    }

    #[test]
    fn google_search_response_tolerates_missing_local_pack() {
        let raw = r#"{"search_metadata": {"status": "Success"}}"#;
        let response: GoogleSearchResponse = serde_json::from_str(raw).unwrap();
        assert!(response.local_results.is_none());
    }
}

pub mod error;
pub mod types;

pub use error::{Result, SerpError};
pub use types::{
    GpsCoordinates, LocalPlace, MapsPlace, PlaceDetails, ReviewSnippet, UserReviews, YelpBusiness,
};

use serde::de::DeserializeOwned;
use types::{GoogleSearchResponse, MapsSearchResponse, PlaceDetailsResponse, YelpSearchResponse};

const BASE_URL: &str = "https://serpapi.com/search";

/// Google Maps returns 20 results per page.
const MAPS_PAGE_SIZE: usize = 20;

/// Map viewport bias for coordinate-anchored searches.
const DEFAULT_ZOOM: u8 = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct MapsSearchOptions {
    /// Stop paginating once this many results are collected.
    pub max_results: usize,
    /// Center the search viewport on these coordinates.
    pub location: Option<(f64, f64)>,
}

pub struct SerpClient {
    client: reqwest::Client,
    api_key: String,
}

impl SerpClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Search Google Maps for local businesses, paginating until `max_results`
    /// or the last page.
    pub async fn search_maps(
        &self,
        query: &str,
        options: MapsSearchOptions,
    ) -> Result<Vec<MapsPlace>> {
        let max_results = if options.max_results == 0 {
            MAPS_PAGE_SIZE
        } else {
            options.max_results
        };

        let mut places: Vec<MapsPlace> = Vec::new();
        let mut start = 0usize;

        while places.len() < max_results {
            let mut params = vec![
                ("engine", "google_maps".to_string()),
                ("type", "search".to_string()),
                ("q", query.to_string()),
                ("start", start.to_string()),
                ("hl", "en".to_string()),
            ];
            if let Some((lat, lng)) = options.location {
                params.push(("ll", format!("@{lat},{lng},{DEFAULT_ZOOM}z")));
            }

            let page: MapsSearchResponse = self.get(&params).await?;
            let page_len = page.local_results.len();
            if page_len == 0 {
                break;
            }

            places.extend(page.local_results);
            tracing::debug!(query, start, page_len, total = places.len(), "Maps page fetched");

            if page_len < MAPS_PAGE_SIZE {
                break;
            }
            start += MAPS_PAGE_SIZE;
        }

        places.truncate(max_results);
        tracing::info!(query, count = places.len(), "Maps search complete");
        Ok(places)
    }

    /// Fetch the rich detail payload for a single place by `data_id`.
    pub async fn place_details(&self, data_id: &str) -> Result<PlaceDetails> {
        let params = vec![
            ("engine", "google_maps".to_string()),
            ("type", "place".to_string()),
            ("data_id", data_id.to_string()),
            ("hl", "en".to_string()),
        ];

        let response: PlaceDetailsResponse = self.get(&params).await?;
        response
            .place_results
            .ok_or_else(|| SerpError::Parse(format!("no place_results for data_id {data_id}")))
    }

    /// Search regular Google and return the local pack, if any.
    pub async fn search_local(&self, query: &str, location: &str) -> Result<Vec<LocalPlace>> {
        let mut params = vec![
            ("engine", "google".to_string()),
            ("q", query.to_string()),
            ("hl", "en".to_string()),
        ];
        if !location.is_empty() {
            params.push(("location", location.to_string()));
        }

        let response: GoogleSearchResponse = self.get(&params).await?;
        let places = response.local_results.map(|p| p.places).unwrap_or_default();
        tracing::info!(query, count = places.len(), "Local pack search complete");
        Ok(places)
    }

    /// Search Yelp for businesses matching a description near a location.
    pub async fn search_yelp(&self, description: &str, location: &str) -> Result<Vec<YelpBusiness>> {
        let mut params = vec![
            ("engine", "yelp".to_string()),
            ("find_desc", description.to_string()),
        ];
        if !location.is_empty() {
            params.push(("find_loc", location.to_string()));
        }

        let response: YelpSearchResponse = self.get(&params).await?;
        tracing::info!(
            description,
            count = response.organic_results.len(),
            "Yelp search complete"
        );
        Ok(response.organic_results)
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T> {
        let mut query: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        query.push(("api_key", self.api_key.as_str()));

        let resp = self.client.get(BASE_URL).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SerpError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}

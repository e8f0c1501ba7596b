use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::chat::ChatClient;
use crate::util::{extract_json, extract_object_array};

const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai";
const PERPLEXITY_MODEL: &str = "sonar-pro";

/// Enrichment calls look up a dozen businesses at a time; larger batches make
/// the model drop entries.
const RESEARCH_BATCH_SIZE: usize = 12;

/// Geographic context extracted from the requirement text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocationInfo {
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub yelp_location: Option<String>,
}

/// Generate maps search queries for a data requirement. The query strategy is
/// entirely the model's; this call only fixes the output contract.
pub async fn generate_search_queries(
    client: &ChatClient,
    requirement: &str,
    num_queries: usize,
) -> Result<Vec<String>> {
    let system = "You generate Google Maps search queries for maximum business coverage.\n\
                  Mix broad category queries, niche queries, and area-specific queries.\n\
                  Return ONLY a JSON array of query strings.";
    let user = format!(
        "Requirement: {requirement}\n\n\
         Generate exactly {num_queries} diverse Google Maps queries."
    );

    let raw = client.chat(system, &user).await?;
    match extract_json(&raw) {
        Some(serde_json::Value::Array(items)) => {
            let queries: Vec<String> = items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .take(num_queries)
                .collect();
            if queries.is_empty() {
                return Err(anyhow!("model returned no usable queries"));
            }
            Ok(queries)
        }
        _ => Err(anyhow!("model did not return a JSON array of queries")),
    }
}

/// Extract the requirement's location: city name, center coordinates, and a
/// Yelp-friendly location string.
pub async fn generate_location(client: &ChatClient, requirement: &str) -> Result<LocationInfo> {
    let system = "Given a data-collection requirement, extract the geographic location.\n\
                  Return a JSON object with: city, country, latitude, longitude, yelp_location.\n\
                  latitude/longitude are the city center coordinates.";
    let user = format!("Requirement: {requirement}");

    let raw = client.chat(system, &user).await?;
    match extract_json(&raw) {
        Some(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
        None => {
            warn!("Location extraction returned no JSON, proceeding without location");
            Ok(LocationInfo::default())
        }
    }
}

/// Web research over the Perplexity API. Discovery finds businesses the search
/// engines missed; the field-group calls enrich known names.
pub struct Researcher {
    client: ChatClient,
}

impl Researcher {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: ChatClient::new(api_key, PERPLEXITY_MODEL)
                .with_base_url(PERPLEXITY_API_URL)
                .with_temperature(0.1),
        }
    }

    /// Discover businesses matching the requirement that are not already in
    /// `known_names`. Returns loosely-shaped records for the caller to map.
    pub async fn discover(
        &self,
        requirement: &str,
        known_names: &[String],
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let system = "You are a data researcher with real-time web search capabilities.\n\
                      Find and list ALL businesses matching the requirement.\n\
                      Return ONLY a valid JSON array of objects with fields:\n\
                      Name, Address, Phone, Website, Rating.\n\
                      Use null for unknown fields. Do NOT make up data.\n\
                      Search directories, review sites, and articles.";

        let mut user = format!(
            "Find ALL matching businesses for: {requirement}\n\n\
             Return a JSON array with Name, Address, Phone, Website, Rating for every match."
        );
        if !known_names.is_empty() {
            user.push_str("\n\nI already have these — find ADDITIONAL ones not in this list:\n");
            user.push_str(&known_names[..known_names.len().min(50)].join(", "));
        }

        let raw = self.client.chat(system, &user).await?;
        let records = extract_object_array(&raw);
        info!(count = records.len(), "Discovery research complete");
        Ok(records)
    }

    pub async fn research_amenities(
        &self,
        requirement: &str,
        names: &[String],
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        self.research_group(
            requirement,
            names,
            "amenities and services",
            &["Amenities", "Services", "Service Options"],
            "Find the amenities, facilities, and services each business offers.",
        )
        .await
    }

    pub async fn research_capacity(
        &self,
        requirement: &str,
        names: &[String],
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        self.research_group(
            requirement,
            names,
            "capacity and staffing",
            &["Capacity", "Staff Count", "Rooms"],
            "Find the customer capacity, number of rooms or stations, and staff size.",
        )
        .await
    }

    pub async fn research_pricing(
        &self,
        requirement: &str,
        names: &[String],
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        self.research_group(
            requirement,
            names,
            "pricing and hours",
            &["Price Range", "Pricing Details", "Hours"],
            "Find price ranges, typical service prices, and opening hours.",
        )
        .await
    }

    /// Research one group of fields for a list of businesses, batched so each
    /// call stays within what the model reliably handles.
    async fn research_group(
        &self,
        requirement: &str,
        names: &[String],
        group: &str,
        fields: &[&str],
        task: &str,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>> {
        let fields_list = fields.join(", ");
        let system = format!(
            "You are a data researcher specializing in {group}.\n\
             You have real-time web search access. Look up REAL data for each business.\n\
             Return ONLY a valid JSON array of objects.\n\
             Each object must have: Name, {fields_list}\n\
             Use null for unknown fields. Do NOT make up data."
        );

        let mut all_records = Vec::new();
        for batch in names.chunks(RESEARCH_BATCH_SIZE) {
            let names_list = batch
                .iter()
                .enumerate()
                .map(|(i, name)| format!("  {}. {name}", i + 1))
                .collect::<Vec<_>>()
                .join("\n");
            let user = format!(
                "Context: {requirement}\n\n\
                 Research task: {task}\n\n\
                 Businesses:\n{names_list}\n\n\
                 Return a JSON array with Name, {fields_list} for each business."
            );

            let raw = self.client.chat(&system, &user).await?;
            all_records.extend(extract_object_array(&raw));
        }

        info!(group, count = all_records.len(), "Field group research complete");
        Ok(all_records)
    }
}

//! Staged pipeline: generate queries, fetch every source, merge, export.
//!
//! Source fetches run concurrently where the APIs allow it; the merge core
//! runs once, synchronously, after the full batch is gathered. A failed stage
//! degrades to zero records from that source and the run continues.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use placescout_common::{Config, RawRecord, Source};
use placescout_export::export_xlsx;
use placescout_merge::{MergeConfig, MergeEngine};
use research_client::{generate_location, generate_search_queries, ChatClient, Researcher};
use serp_client::{MapsPlace, MapsSearchOptions, SerpClient};

use crate::sources;

/// Concurrent place-details fetches in flight.
const DETAIL_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub requirement: String,
    pub num_queries: usize,
    pub results_per_query: usize,
    pub max_place_details: usize,
    pub include_yelp: bool,
    pub include_local: bool,
    pub skip_research: bool,
    pub match_threshold: f64,
    pub output_dir: PathBuf,
}

pub async fn run(config: &Config, options: &PipelineOptions) -> Result<PathBuf> {
    // Config problems surface before any network call.
    let engine = MergeEngine::new(MergeConfig {
        match_threshold: options.match_threshold,
        ..MergeConfig::default()
    })
    .context("invalid merge configuration")?;

    // --- Stage 1: queries + location -----------------------------------

    let chat = ChatClient::new(&config.openai_api_key, &config.openai_model);
    let queries = generate_search_queries(&chat, &options.requirement, options.num_queries)
        .await
        .context("query generation failed")?;
    info!(count = queries.len(), "Search queries generated");

    let location = match generate_location(&chat, &options.requirement).await {
        Ok(location) => location,
        Err(error) => {
            warn!(%error, "Location extraction failed, proceeding without it");
            Default::default()
        }
    };
    if let Some(city) = &location.city {
        info!(city = city.as_str(), "Location detected");
    }

    let serp = SerpClient::new(config.serpapi_key.clone());
    let mut records: Vec<RawRecord> = Vec::new();

    // --- Stage 2: Google Maps listings ---------------------------------

    let maps_places = fetch_maps_listings(&serp, &queries, &location, options).await;
    records.extend(maps_places.iter().map(sources::from_maps_place));

    // --- Stage 3: place details enrichment -----------------------------

    let detail_ids: Vec<String> = maps_places
        .iter()
        .filter_map(|place| place.data_id.clone())
        .take(options.max_place_details)
        .collect();

    if !detail_ids.is_empty() {
        let detail_count = detail_ids.len();
        let detail_results: Vec<_> = stream::iter(detail_ids)
            .map(|data_id| {
                let serp = &serp;
                async move {
                    let result = serp.place_details(&data_id).await;
                    (data_id, result)
                }
            })
            .buffered(DETAIL_CONCURRENCY)
            .collect()
            .await;

        for (data_id, result) in detail_results {
            match result {
                Ok(details) => records.push(sources::from_place_details(&details)),
                Err(error) => warn!(data_id = data_id.as_str(), %error, "Place details fetch failed"),
            }
        }
        info!(requested = detail_count, "Place details enrichment complete");
    }

    // --- Stage 4: Yelp + local pack (optional) -------------------------

    if options.include_yelp {
        let yelp_location = location
            .yelp_location
            .clone()
            .or_else(|| location.city.clone())
            .unwrap_or_default();
        let yelp_query = queries.first().cloned().unwrap_or_else(|| options.requirement.clone());
        match serp.search_yelp(&yelp_query, &yelp_location).await {
            Ok(businesses) => records.extend(businesses.iter().map(sources::from_yelp)),
            Err(error) => warn!(%error, "Yelp search failed"),
        }
    }

    if options.include_local {
        let city = location.city.clone().unwrap_or_default();
        for query in queries.iter().take(2) {
            match serp.search_local(query, &city).await {
                Ok(places) => records.extend(places.iter().map(sources::from_local_place)),
                Err(error) => warn!(query = query.as_str(), %error, "Local pack search failed"),
            }
        }
    }

    // --- Stage 5: LLM research -----------------------------------------

    if !options.skip_research {
        match &config.perplexity_api_key {
            Some(key) => research(key, &options.requirement, &mut records).await,
            None => info!("No Perplexity key configured, skipping research stages"),
        }
    }

    // --- Stage 6: merge -------------------------------------------------

    info!(gathered = records.len(), "All sources gathered, merging");
    let canonical = engine.merge(records);

    // --- Stage 7: export ------------------------------------------------

    let path = export_xlsx(&canonical, &options.requirement, &options.output_dir)
        .context("spreadsheet export failed")?;
    Ok(path)
}

/// Run every maps query and keep the first record per business name, so
/// overlapping queries don't multiply the same listing.
async fn fetch_maps_listings(
    serp: &SerpClient,
    queries: &[String],
    location: &research_client::LocationInfo,
    options: &PipelineOptions,
) -> Vec<MapsPlace> {
    let search_options = MapsSearchOptions {
        max_results: options.results_per_query,
        location: location.latitude.zip(location.longitude),
    };

    let mut seen_names: HashSet<String> = HashSet::new();
    let mut places: Vec<MapsPlace> = Vec::new();

    for query in queries {
        match serp.search_maps(query, search_options).await {
            Ok(results) => {
                for place in results {
                    let key = place.title.trim().to_lowercase();
                    if !key.is_empty() && !seen_names.insert(key) {
                        continue;
                    }
                    places.push(place);
                }
            }
            Err(error) => warn!(query = query.as_str(), %error, "Maps search failed"),
        }
    }

    info!(count = places.len(), "Unique maps listings gathered");
    places
}

/// Discovery plus the three enrichment groups. Discovery runs first so the
/// enrichment calls cover businesses the search engines missed; the three
/// groups then run concurrently.
async fn research(api_key: &str, requirement: &str, records: &mut Vec<RawRecord>) {
    let researcher = Researcher::new(api_key);

    let known_names: Vec<String> = {
        let mut seen = HashSet::new();
        records
            .iter()
            .map(|r| r.name.trim().to_string())
            .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
            .collect()
    };

    let mut all_names = known_names.clone();
    match researcher.discover(requirement, &known_names).await {
        Ok(discovered) => {
            for map in &discovered {
                let record = sources::from_research(map, Source::LlmDiscovery);
                if !record.name.is_empty()
                    && !all_names
                        .iter()
                        .any(|n| n.eq_ignore_ascii_case(&record.name))
                {
                    all_names.push(record.name.clone());
                }
                records.push(record);
            }
        }
        Err(error) => warn!(%error, "Discovery research failed"),
    }

    if all_names.is_empty() {
        return;
    }

    let (amenities, capacity, pricing) = tokio::join!(
        researcher.research_amenities(requirement, &all_names),
        researcher.research_capacity(requirement, &all_names),
        researcher.research_pricing(requirement, &all_names),
    );

    for (label, source, result) in [
        ("amenities", Source::LlmAmenities, amenities),
        ("capacity", Source::LlmCapacity, capacity),
        ("pricing", Source::LlmPricing, pricing),
    ] {
        match result {
            Ok(maps) => {
                records.extend(maps.iter().map(|m| sources::from_research(m, source)));
            }
            Err(error) => warn!(group = label, %error, "Field research failed"),
        }
    }
}

//! JSearch job API client (RapidAPI).

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::job::NewJob;

pub const JOB_SOURCE: &str = "jsearch";
const RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";

#[derive(Debug, Error)]
pub enum JobSearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Job search API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Listing>,
}

/// One listing as returned by `/search`. Every field is optional upstream.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Listing {
    pub job_id: Option<String>,
    pub job_title: Option<String>,
    pub employer_name: Option<String>,
    pub job_city: Option<String>,
    pub job_state: Option<String>,
    pub job_country: Option<String>,
    pub job_description: Option<String>,
    pub job_employment_type: Option<String>,
    pub job_is_remote: Option<bool>,
    pub job_min_salary: Option<f64>,
    pub job_max_salary: Option<f64>,
    pub job_apply_link: Option<String>,
    pub job_posted_at_timestamp: Option<i64>,
}

#[derive(Clone)]
pub struct JobSearchClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl JobSearchClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, JobSearchError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the first page of listings for `role`, optionally narrowed to `location`.
    pub async fn search(
        &self,
        role: &str,
        location: Option<&str>,
    ) -> Result<Vec<Listing>, JobSearchError> {
        let query = search_query(role, location);
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .query(&[("query", query.as_str()), ("page", "1"), ("num_pages", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Job search API returned {status} for query {query:?}");
            return Err(JobSearchError::Api {
                status: status.as_u16(),
                message: crate::llm_client::api_error_message(body),
            });
        }

        let parsed: SearchResponse = response.json().await?;
        debug!("Job search returned {} listings for {query:?}", parsed.data.len());
        Ok(parsed.data)
    }
}

fn search_query(role: &str, location: Option<&str>) -> String {
    match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(location) => format!("{} in {location}", role.trim()),
        None => role.trim().to_string(),
    }
}

/// Maps a listing into the local schema. Listings without an id or a title are dropped.
pub fn map_listing(listing: Listing) -> Option<NewJob> {
    let external_id = non_empty(listing.job_id)?;
    let title = non_empty(listing.job_title)?;

    let location_parts: Vec<String> = [listing.job_city, listing.job_state, listing.job_country]
        .into_iter()
        .filter_map(non_empty)
        .collect();

    Some(NewJob {
        source: JOB_SOURCE,
        external_id,
        title,
        company: non_empty(listing.employer_name),
        location: (!location_parts.is_empty()).then(|| location_parts.join(", ")),
        description: non_empty(listing.job_description),
        employment_type: non_empty(listing.job_employment_type),
        is_remote: listing.job_is_remote.unwrap_or(false),
        salary_min: listing.job_min_salary,
        salary_max: listing.job_max_salary,
        apply_url: non_empty(listing.job_apply_link),
        posted_at: listing
            .job_posted_at_timestamp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

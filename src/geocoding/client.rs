// src/geocoding/client.rs
//
// Provider seam plus the HTTP client for a Nominatim-compatible search API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use url::Url;

use crate::geocoding::config::GeocoderConfig;
use crate::geocoding::GeocodeError;
use crate::models::location::de_opt_f64;
use crate::models::Coordinates;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateAddress {
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
}

impl CandidateAddress {
    /// First of city / town / village that is present.
    pub fn locality(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
    }
}

/// One search result. Nominatim sends `lat`/`lon` as strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub importance: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<CandidateAddress>,
}

impl GeocodeCandidate {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => None,
        }
    }
}

#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}

pub struct NominatimClient {
    http: reqwest::Client,
    search_endpoint: Url,
    country_codes: String,
    result_limit: u32,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid geocoder base URL: {}", config.base_url))?;
        let search_endpoint = base
            .join("search")
            .with_context(|| format!("Failed to build search endpoint from {}", base))?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .context("Failed to build geocoder HTTP client")?;

        Ok(Self {
            http,
            search_endpoint,
            country_codes: config.country_codes.join(","),
            result_limit: config.result_limit,
        })
    }

    pub fn search_url(&self, query: &str) -> Url {
        let mut url = self.search_endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", query)
                .append_pair("format", "json")
                .append_pair("addressdetails", "1")
                .append_pair("limit", &self.result_limit.to_string());
            if !self.country_codes.is_empty() {
                pairs.append_pair("countrycodes", &self.country_codes);
            }
        }
        url
    }
}

#[async_trait]
impl GeocodeProvider for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let url = self.search_url(query);
        debug!("Geocode request: {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeocodeError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        parse_candidates(&body)
    }
}

pub fn parse_candidates(body: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
    serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))
}

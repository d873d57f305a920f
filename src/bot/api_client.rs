//! HTTP client for the aggregation API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::bot::InsightsApi;
use crate::error::{AppError, Result};
use crate::filter::CardThreshold;
use crate::models::{EnrichedMatch, Fixture, FixtureScope, LeagueSeason};

pub struct InsightsApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Deserialize)]
struct MatchesBody {
    matches: Vec<Fixture>,
}

#[derive(Deserialize)]
struct CardFilterBody {
    confrontos_filtrados: Vec<Fixture>,
}

impl InsightsApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Insights API request");

        let resp = self.http.get(&url).query(query).send().await?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            let detail = resp
                .json::<ErrorBody>()
                .await
                .map(|b| b.detail)
                .unwrap_or_else(|_| path.to_string());
            return Err(AppError::NotFound(detail));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Fetch(format!("GET {path} returned {status}: {body}")));
        }

        resp.json()
            .await
            .map_err(|e| AppError::Fetch(format!("GET {path}: undecodable body: {e}")))
    }
}

#[async_trait]
impl InsightsApi for InsightsApiClient {
    async fn match_data(&self, match_id: i64) -> Result<EnrichedMatch> {
        self.get(&format!("/get-detailed-match-data/{match_id}"), &[])
            .await
    }

    async fn mismatches(&self, scope: LeagueSeason, fixture_scope: FixtureScope) -> Result<Vec<Fixture>> {
        let path = format!(
            "/{fixture_scope}-quartile-matches/{}/{}",
            scope.league_id, scope.season
        );
        let body: MatchesBody = self.get(&path, &[]).await?;
        Ok(body.matches)
    }

    async fn card_filtered(&self, season: i32, threshold: CardThreshold) -> Result<Vec<Fixture>> {
        let body: CardFilterBody = self
            .get(
                "/confrontos-filtrados",
                &[
                    ("season", season.to_string()),
                    ("cartoes_min_por_time", threshold.min_per_team.to_string()),
                    ("cartoes_media_somada", threshold.min_summed.to_string()),
                ],
            )
            .await?;
        Ok(body.confrontos_filtrados)
    }
}

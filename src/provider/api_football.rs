//! API-Football (RapidAPI) client.
//!
//! Every call waits on the shared request budget, issues a single GET and
//! decodes the envelope. No retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::provider::rate_limit::RequestBudget;
use crate::provider::types::{ApiEnvelope, RawFixtureEntry, RawStandingsEntry, RawTeamStatistics};
use crate::provider::{FixtureQuery, StatsProvider};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct ApiFootballClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    api_key: SecretString,
    budget: Arc<RequestBudget>,
}

impl ApiFootballClient {
    pub fn new(
        config: &ProviderConfig,
        api_key: SecretString,
        budget: Arc<RequestBudget>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            host: config.host.clone(),
            api_key,
            budget,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        self.budget.acquire().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "API-Football request");

        let resp = self
            .http
            .get(&url)
            .header("X-RapidAPI-Key", self.api_key.expose_secret())
            .header("X-RapidAPI-Host", &self.host)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("GET {path}: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Fetch(format!("GET {path} returned {status}: {body}")));
        }

        let envelope: ApiEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| AppError::Fetch(format!("GET {path}: undecodable body: {e}")))?;

        if let Some(message) = envelope.error_message() {
            return Err(AppError::Fetch(format!("GET {path} rejected: {message}")));
        }

        Ok(envelope.response)
    }
}

#[async_trait]
impl StatsProvider for ApiFootballClient {
    #[instrument(skip(self))]
    async fn standings(&self, league_id: i64, season: i32) -> Result<Vec<RawStandingsEntry>> {
        self.get(
            "/standings",
            &[("league", league_id.to_string()), ("season", season.to_string())],
        )
        .await
    }

    #[instrument(skip(self), fields(league_id = query.league_id, season = query.season))]
    async fn fixtures(&self, query: &FixtureQuery) -> Result<Vec<RawFixtureEntry>> {
        let mut params = vec![
            ("league", query.league_id.to_string()),
            ("season", query.season.to_string()),
        ];

        if query.dates.is_single_day() {
            params.push(("date", query.dates.from.format(DATE_FORMAT).to_string()));
        } else {
            params.push(("from", query.dates.from.format(DATE_FORMAT).to_string()));
            params.push(("to", query.dates.to.format(DATE_FORMAT).to_string()));
        }
        if let Some(status) = &query.status {
            params.push(("status", status.clone()));
        }
        if let Some(timezone) = &query.timezone {
            params.push(("timezone", timezone.clone()));
        }

        self.get("/fixtures", &params).await
    }

    #[instrument(skip(self))]
    async fn team_statistics(
        &self,
        league_id: i64,
        season: i32,
        team_id: i64,
    ) -> Result<RawTeamStatistics> {
        // The provider answers `"response": []` when it has nothing for the team.
        let response: serde_json::Value = self
            .get(
                "/teams/statistics",
                &[
                    ("league", league_id.to_string()),
                    ("season", season.to_string()),
                    ("team", team_id.to_string()),
                ],
            )
            .await?;

        let has_data = matches!(&response, serde_json::Value::Object(map) if !map.is_empty());
        if !has_data {
            return Err(AppError::InvalidPayload(format!(
                "no statistics for team {team_id} in league {league_id} season {season}"
            )));
        }

        serde_json::from_value(response)
            .map_err(|e| AppError::InvalidPayload(format!("team {team_id} statistics: {e}")))
    }

    fn name(&self) -> &str {
        "api-football"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::models::DateRange;

    fn client_for(server: &MockServer) -> ApiFootballClient {
        let config = ProviderConfig {
            base_url: server.uri(),
            host: "api-football-v1.p.rapidapi.com".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            fixture_status: "NS".to_string(),
            request_timeout_seconds: 5,
        };
        let budget = Arc::new(RequestBudget::new(100, Duration::from_secs(60)));
        ApiFootballClient::new(&config, SecretString::from("test-key".to_string()), budget)
            .expect("should build client")
    }

    #[tokio::test]
    async fn test_standings_sends_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/standings"))
            .and(query_param("league", "71"))
            .and(query_param("season", "2024"))
            .and(header("X-RapidAPI-Key", "test-key"))
            .and(header("X-RapidAPI-Host", "api-football-v1.p.rapidapi.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [],
                "response": [{
                    "league": {
                        "id": 71, "name": "Serie A", "country": "Brazil",
                        "logo": null, "flag": null, "season": 2024,
                        "standings": [[{"rank": 1, "team": {"id": 121, "name": "Palmeiras", "logo": null},
                                        "points": 3, "goalsDiff": 2, "form": "W"}]]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entries = client_for(&server).standings(71, 2024).await.expect("should fetch");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].league.standings[0][0].team.name, "Palmeiras");
    }

    #[tokio::test]
    async fn test_fixtures_single_day_uses_date_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fixtures"))
            .and(query_param("date", "2024-06-01"))
            .and(query_param("status", "NS"))
            .and(query_param("timezone", "America/Sao_Paulo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"errors": [], "response": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let query = FixtureQuery {
            league_id: 71,
            season: 2024,
            dates: DateRange::single(day),
            status: Some("NS".to_string()),
            timezone: Some("America/Sao_Paulo".to_string()),
        };
        let fixtures = client_for(&server).fixtures(&query).await.expect("should fetch");
        assert!(fixtures.is_empty());
    }

    #[tokio::test]
    async fn test_fixtures_range_uses_from_to() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fixtures"))
            .and(query_param("from", "2024-06-01"))
            .and(query_param("to", "2024-06-07"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"errors": [], "response": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let query = FixtureQuery {
            league_id: 71,
            season: 2024,
            dates: DateRange {
                from: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                to: NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            },
            status: None,
            timezone: None,
        };
        client_for(&server).fixtures(&query).await.expect("should fetch");
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/standings"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client_for(&server).standings(71, 2024).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_provider_errors_field_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/standings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": {"token": "Error/Missing application key."},
                "response": []
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).standings(71, 2024).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(ref msg) if msg.contains("application key")));
    }

    #[tokio::test]
    async fn test_empty_team_statistics_is_invalid_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams/statistics"))
            .and(query_param("team", "121"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"errors": [], "response": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).team_statistics(71, 2024, 121).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/standings"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).standings(71, 2024).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
    }
}

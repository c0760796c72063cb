use async_trait::async_trait;
use anyhow::{Result, anyhow};
use crate::providers::traits::{WebResult, WebSearch};
use reqwest::Client;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    engine: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: String, engine: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            engine,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn collect_results(response: SearchResponse, max_results: usize) -> Vec<WebResult> {
    response
        .organic_results
        .into_iter()
        .take(max_results)
        .filter(|item| !item.title.is_empty() && !item.snippet.is_empty())
        .map(|item| WebResult {
            title: item.title,
            snippet: item.snippet,
            url: item.link,
        })
        .collect()
}

#[async_trait]
impl WebSearch for SerpApiClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebResult>> {
        let url = format!("{}/search.json", self.base_url);
        let params = [
            ("engine", self.engine.as_str()),
            ("q", query),
            ("api_key", self.api_key.as_str()),
        ];

        log::info!("Searching the web for: {}", query);
        let response = self.client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send request: {}", e))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read search response: {}", e))?;

        let body: SearchResponse = match serde_json::from_str(&raw) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(anyhow!("API request failed with status: {}", status));
            }
            Err(e) => return Err(anyhow!("Failed to parse search response: {}", e)),
        };

        if let Some(error) = body.error {
            return Err(anyhow!("SerpAPI error: {}", error));
        }
        if !status.is_success() {
            return Err(anyhow!("API request failed with status: {}", status));
        }

        let results = collect_results(body, max_results);
        log::debug!("Web search returned {} usable results", results.len());
        Ok(results)
    }
}

/// Render web results as markdown-ish blocks separated by blank lines.
pub fn format_web_results(results: &[WebResult]) -> String {
    if results.is_empty() {
        return "No results found.".to_string();
    }
    results
        .iter()
        .map(|r| format!("**{}**\n{}", r.title, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn parse(raw: &str) -> SearchResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn keeps_only_results_with_title_and_snippet() {
        let response = parse(r#"{
            "organic_results": [
                {"title": "WHO - COVID-19", "snippet": "Fever and cough", "link": "https://who.int/covid"},
                {"title": "", "snippet": "orphan snippet", "link": "https://example.com"},
                {"title": "CDC", "snippet": "Symptoms list"}
            ]
        }"#);
        let results = collect_results(response, 3);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://who.int/covid");
        assert_eq!(results[1].title, "CDC");
        assert_eq!(results[1].url, "");
    }

    #[test]
    fn max_results_applies_before_filtering() {
        let response = parse(r#"{
            "organic_results": [
                {"title": "", "snippet": "x"},
                {"title": "A", "snippet": "a"},
                {"title": "B", "snippet": "b"}
            ]
        }"#);
        let results = collect_results(response, 2);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "A");
    }

    #[test]
    fn missing_organic_results_is_empty() {
        assert!(collect_results(parse(r#"{"search_metadata": {}}"#), 3).is_empty());
    }

    #[test]
    fn formats_results_and_empty_case() {
        assert_eq!(format_web_results(&[]), "No results found.");
        let results = vec![
            WebResult { title: "A".into(), snippet: "a".into(), url: "u1".into() },
            WebResult { title: "B".into(), snippet: "b".into(), url: "u2".into() },
        ];
        assert_eq!(format_web_results(&results), "**A**\na\n\n**B**\nb");
    }

    #[tokio::test]
    async fn search_sends_engine_query_and_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("engine".into(), "google".into()),
                Matcher::UrlEncoded("q".into(), "covid symptoms".into()),
                Matcher::UrlEncoded("api_key".into(), "serp-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"organic_results": [{"title": "T", "snippet": "S", "link": "L"}]}"#)
            .create_async()
            .await;

        let client = SerpApiClient::new("serp-key".into(), "google".into())
            .with_base_url(server.url());
        let results = client.search("covid symptoms", 3).await.unwrap();

        mock.assert_async().await;
        assert_eq!(results, vec![WebResult {
            title: "T".into(),
            snippet: "S".into(),
            url: "L".into(),
        }]);
    }

    #[tokio::test]
    async fn search_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "Invalid API key."}"#)
            .create_async()
            .await;

        let client = SerpApiClient::new("bad".into(), "google".into())
            .with_base_url(server.url());
        let err = client.search("anything", 3).await.unwrap_err();
        assert!(err.to_string().contains("Invalid API key."));
    }

    #[tokio::test]
    async fn non_json_error_pages_report_the_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_header("content-type", "text/html")
            .with_body("<html><body>Service Unavailable</body></html>")
            .create_async()
            .await;

        let client = SerpApiClient::new("key".into(), "google".into())
            .with_base_url(server.url());
        let err = client.search("anything", 3).await.unwrap_err();
        assert_eq!(err.to_string(), "API request failed with status: 503 Service Unavailable");
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = SerpApiClient::new("key".into(), "google".into())
            .with_base_url(server.url());
        let err = client.search("anything", 3).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse search response"));
    }
}

use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::NewsSettings;
use crate::domain::Topic;

/// A single story, as rendered on the trending page
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub published_at: String,
}

// Wire format of the aggregator's `top-headlines` endpoint. Most fields are
// nullable on their side, so everything optional is defaulted during the
// conversion to `Article`.
#[derive(Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    source: Option<RawSource>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Self {
            title: raw.title.unwrap_or_else(|| "No title".to_string()),
            summary: raw
                .description
                .unwrap_or_else(|| "No summary available.".to_string()),
            source: raw.source.and_then(|s| s.name).unwrap_or_default(),
            url: raw.url.unwrap_or_else(|| "#".to_string()),
            published_at: raw.published_at.unwrap_or_default(),
        }
    }
}

/// Client for the third-party news aggregator
pub struct NewsClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl NewsClient {
    pub fn new(cfg: &NewsSettings) -> Self {
        Self {
            http_client: Client::new(),
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
        }
    }

    /// Top headlines for `topic`, newest first, at most `page_size` items
    #[tracing::instrument(name = "Fetching top headlines", skip(self))]
    pub async fn fetch_trending(
        &self,
        topic: Topic,
        page_size: u32,
    ) -> Result<Vec<Article>, reqwest::Error> {
        let url = format!("{}/v2/top-headlines", self.base_url);
        let resp = self
            .http_client
            .get(&url)
            .query(&[
                ("q", topic.as_str()),
                ("pageSize", &page_size.to_string()),
                ("language", "en"),
            ])
            // the key goes in a header, not the query string, to keep it out
            // of access logs
            .header("X-Api-Key", self.api_key.expose_secret())
            .send()
            .await?
            .error_for_status()?
            .json::<HeadlinesResponse>()
            .await?;

        Ok(resp.articles.into_iter().map(Article::from).collect())
    }
}

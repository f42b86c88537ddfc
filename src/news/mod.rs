mod cache;
mod client;

pub use cache::NewsCache;
pub use client::Article;
pub use client::NewsClient;

use crate::domain::Topic;

/// Articles for one topic, in page order
pub type TopicDigest = (Topic, Vec<Article>);

/// Fetch the trending articles for every topic, going through the cache. A
/// topic whose fetch fails contributes an empty list, so the page still
/// renders; the failure only goes to the logs.
pub async fn trending_digest(
    client: &NewsClient,
    cache: &NewsCache,
    page_size: u32,
) -> Vec<TopicDigest> {
    let mut digest = Vec::with_capacity(Topic::ALL.len());
    for topic in Topic::ALL {
        if let Some(articles) = cache.get(topic, page_size) {
            digest.push((topic, articles));
            continue;
        }
        let articles = match client.fetch_trending(topic, page_size).await {
            Ok(articles) => {
                cache.set(topic, page_size, articles.clone());
                articles
            }
            Err(e) => {
                tracing::error!(topic = %topic, error = ?e, "failed to fetch trending news");
                Vec::new()
            }
        };
        digest.push((topic, articles));
    }
    digest
}

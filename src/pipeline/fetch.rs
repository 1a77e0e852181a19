//! Scholarly document acquisition.
//!
//! Walks the paged scholar search API for a query, scrapes each result's
//! abstract, and materializes the corpus the batch job consumes: one
//! normalized text file per document plus the metadata store.

use crate::index::store::{corpus_path, metadata_path};
use crate::index::types::{MetadataMap, PaperMetadata};
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Results per API page.
const PAGE_SIZE: usize = 20;
/// Last page offset walked, capping a corpus at about a hundred papers.
const MAX_OFFSET: usize = 80;

const SEARCH_API: &str = "https://serpapi.com/search.json";

/// Publisher pages only return the abstract blob to browser-looking agents.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// What an acquisition produced, for logging and diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct AcquisitionReport {
    pub documents: usize,
    pub skipped: usize,
}

/// Source of corpora for index builds.
///
/// `acquire` materializes everything a build needs under the data dir: the
/// corpus directory of `doc_id word word ...` files and the metadata store.
/// Failures surface as errors so the dispatcher can fail the primary
/// pipeline and move on to recovery.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn acquire(&self, url: &str, index_id: &str) -> Result<AcquisitionReport>;
}

/// Acquisition against the scholar search API plus publisher-page scraping.
pub struct ScholarApiSource {
    http_client: reqwest::Client,
    api_key: String,
    data_dir: PathBuf,
}

impl ScholarApiSource {
    pub fn new(data_dir: impl Into<PathBuf>, api_key: String) -> Self {
        ScholarApiSource {
            http_client: reqwest::Client::new(),
            api_key,
            data_dir: data_dir.into(),
        }
    }

    /// One page of scholar search results.
    async fn search_page(&self, query: &str, offset: usize) -> Result<Value> {
        // The query arrives still percent-encoded from the request url and
        // is forwarded as-is.
        let url = format!(
            "{}?engine=google_scholar&q={}&hl=en&start={}&num={}&api_key={}",
            SEARCH_API, query, offset, PAGE_SIZE, self.api_key
        );
        let response = self
            .get_with_retry(url, Duration::from_secs(20), 3)
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("search API returned {}", response.status());
        }
        Ok(response.json().await?)
    }

    async fn get_with_retry(
        &self,
        url: String,
        timeout: Duration,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .get(url.clone())
                .timeout(timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }

    /// Scrape the abstract from a publisher page. Any failure is a `None`;
    /// the document is simply skipped.
    async fn fetch_abstract(&self, link: &str) -> Option<String> {
        let response = self
            .http_client
            .get(link)
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(20))
            .send()
            .await
            .ok()?;
        let body = response.text().await.ok()?;
        extract_abstract(&body)
    }

    /// Publisher pages rate-limit aggressive clients; space the scrapes out.
    async fn pause_between_requests(&self) {
        let delay = rand::thread_rng().gen_range(800..2000);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[async_trait]
impl DocumentSource for ScholarApiSource {
    async fn acquire(&self, url: &str, index_id: &str) -> Result<AcquisitionReport> {
        let query =
            extract_query(url).ok_or_else(|| anyhow::anyhow!("no q= parameter in {:?}", url))?;

        let corpus_dir = corpus_path(&self.data_dir, index_id);
        fs::create_dir_all(&corpus_dir)?;

        let mut metadata = MetadataMap::new();
        let mut documents = 0usize;
        let mut skipped = 0usize;

        for offset in (0..=MAX_OFFSET).step_by(PAGE_SIZE) {
            let page = self.search_page(query, offset).await?;
            let Some(results) = page.get("organic_results").and_then(Value::as_array) else {
                break;
            };
            if results.is_empty() {
                break;
            }
            tracing::debug!(
                "Page at offset {}: {} results (total {:?})",
                offset,
                results.len(),
                page.pointer("/search_information/total_results")
            );

            for paper in results {
                let Some(link) = paper.get("link").and_then(Value::as_str) else {
                    skipped += 1;
                    continue;
                };
                let Some(doc_id) = extract_document_number(link) else {
                    tracing::debug!("No document number in {}, skipping", link);
                    skipped += 1;
                    continue;
                };

                self.pause_between_requests().await;
                let Some(text) = self.fetch_abstract(link).await else {
                    tracing::warn!("No abstract for document {}, skipping", doc_id);
                    skipped += 1;
                    continue;
                };

                let words = normalize_words(&text);
                fs::write(
                    corpus_dir.join(format!("{}.txt", doc_id)),
                    format!("{} {}", doc_id, words.join(" ")),
                )?;

                let title = paper
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let citation = paper
                    .pointer("/inline_links/cited_by/total")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                metadata.insert(
                    doc_id,
                    PaperMetadata {
                        title,
                        citation,
                        link: link.to_string(),
                    },
                );
                documents += 1;
            }
        }

        if documents == 0 {
            anyhow::bail!("acquisition produced no documents for {:?}", url);
        }

        fs::write(
            metadata_path(&self.data_dir, index_id),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        tracing::info!(
            "Acquired {} documents for index {} ({} skipped)",
            documents,
            index_id,
            skipped
        );
        Ok(AcquisitionReport { documents, skipped })
    }
}

/// Raw `q=` value of a request url's query string.
pub fn extract_query(url: &str) -> Option<&str> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| pair.strip_prefix("q="))
}

/// Numeric document id from a publisher link, e.g.
/// `https://ieeexplore.ieee.org/document/8578572/` yields `8578572`.
pub fn extract_document_number(link: &str) -> Option<String> {
    let re = Regex::new(r"/document/(\d+)(?:[/?#]|$)").unwrap();
    re.captures(link)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// First abstract blob embedded in a publisher page's inline JSON. Boolean
/// literals match the same pattern and are passed over.
pub fn extract_abstract(body: &str) -> Option<String> {
    let re = Regex::new(r#"(?s)"abstract":"(.+?)","#).unwrap();
    re.captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .find(|text| *text != "true" && *text != "false")
        .map(str::to_string)
}

/// Lowercase and split on runs of non-word characters, dropping empties.
pub fn normalize_words(text: &str) -> Vec<String> {
    let re = Regex::new(r"\W+").unwrap();
    re.split(&text.to_lowercase())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

//! Sitemap index synthesis
//!
//! The index lists whichever sitemap documents the asset store actually
//! has. Candidates are the named roots followed by a numbered shard family.
//! Every candidate is probed concurrently; the entries keep enumeration
//! order no matter which probe finishes first.

use chrono::NaiveDate;
use futures::future::join_all;
use std::fmt::Write;

use crate::config::SitemapConfig;
use crate::store::{AssetRequest, AssetStore};

/// One referenced sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
}

/// Ordered index, built per request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapIndex {
    pub entries: Vec<SitemapEntry>,
}

/// Store paths to probe, roots first, then shards in ascending order
pub fn candidate_paths(cfg: &SitemapConfig) -> Vec<String> {
    let roots = cfg
        .roots
        .iter()
        .map(|root| format!("/{}", root.trim_start_matches('/')));
    let shards = (cfg.shard_min..=cfg.shard_max).map(|n| {
        format!(
            "/{}{n:0width$}{}",
            cfg.shard_prefix,
            cfg.shard_suffix,
            width = cfg.shard_width
        )
    });
    roots.chain(shards).collect()
}

/// Whether `path` resolves in the store; a failing lookup counts as absent
pub async fn probe(store: &dyn AssetStore, path: &str) -> bool {
    match store.fetch(&AssetRequest::probe(path)).await {
        Ok(response) => response.status().is_success(),
        Err(e) => {
            tracing::warn!(path, error = %e, "sitemap probe failed");
            false
        }
    }
}

/// Probe every candidate and keep the ones that exist
pub async fn synthesize_index(
    store: &dyn AssetStore,
    candidates: &[String],
    origin: &str,
    today: NaiveDate,
) -> SitemapIndex {
    let found = join_all(candidates.iter().map(|path| probe(store, path))).await;
    let origin = origin.trim_end_matches('/');
    let entries = candidates
        .iter()
        .zip(found)
        .filter_map(|(path, exists)| {
            exists.then(|| SitemapEntry {
                loc: format!("{origin}{path}"),
                lastmod: today,
            })
        })
        .collect();
    SitemapIndex { entries }
}

impl SitemapIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for entry in &self.entries {
            let _ = write!(
                xml,
                "  <sitemap>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n  </sitemap>\n",
                quick_xml::escape::escape(entry.loc.as_str()),
                entry.lastmod.format("%Y-%m-%d")
            );
        }
        xml.push_str("</sitemapindex>\n");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAssetStore;
    use pretty_assertions::assert_eq;

    const ORIGIN: &str = "https://example.com";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn config() -> SitemapConfig {
        SitemapConfig {
            shard_max: 5,
            ..SitemapConfig::default()
        }
    }

    fn store_with_shards(shards: &[u32]) -> MemoryAssetStore {
        shards.iter().fold(
            MemoryAssetStore::new().with_asset("/sitemap.xml", "<urlset/>"),
            |store, n| store.with_asset(&format!("/sitemap_small{n}.xml"), "<urlset/>"),
        )
    }

    fn locs(index: &SitemapIndex) -> Vec<&str> {
        index.entries.iter().map(|e| e.loc.as_str()).collect()
    }

    #[test]
    fn test_candidate_order_and_padding() {
        let paths = candidate_paths(&config());
        assert_eq!(
            paths,
            vec![
                "/sitemap.xml",
                "/sitemap_pages.xml",
                "/sitemap_small1.xml",
                "/sitemap_small2.xml",
                "/sitemap_small3.xml",
                "/sitemap_small4.xml",
                "/sitemap_small5.xml",
            ]
        );

        let padded = SitemapConfig {
            shard_min: 9,
            shard_max: 10,
            shard_width: 3,
            roots: Vec::new(),
            ..SitemapConfig::default()
        };
        assert_eq!(candidate_paths(&padded), vec!["/sitemap_small009.xml", "/sitemap_small010.xml"]);
    }

    #[tokio::test]
    async fn test_only_existing_shards_are_listed() {
        let store = store_with_shards(&[1, 2, 3]);
        let index = synthesize_index(&store, &candidate_paths(&config()), ORIGIN, today()).await;

        assert_eq!(
            locs(&index),
            vec![
                "https://example.com/sitemap.xml",
                "https://example.com/sitemap_small1.xml",
                "https://example.com/sitemap_small2.xml",
                "https://example.com/sitemap_small3.xml",
            ]
        );
        assert!(index.entries.iter().all(|e| e.lastmod == today()));
        assert!(!index.to_xml().contains("sitemap_small5.xml"));
    }

    #[tokio::test]
    async fn test_failed_probe_skips_only_that_candidate() {
        let store = store_with_shards(&[1, 2, 3]).with_failure("/sitemap_small2.xml");
        let index = synthesize_index(&store, &candidate_paths(&config()), ORIGIN, today()).await;
        assert_eq!(
            locs(&index),
            vec![
                "https://example.com/sitemap.xml",
                "https://example.com/sitemap_small1.xml",
                "https://example.com/sitemap_small3.xml",
            ]
        );
    }

    #[tokio::test]
    async fn test_entries_exist_and_omitted_candidates_do_not() {
        let store = store_with_shards(&[2, 5]);
        let candidates = candidate_paths(&config());
        let index = synthesize_index(&store, &candidates, ORIGIN, today()).await;

        for path in &candidates {
            let listed = index.entries.iter().any(|e| e.loc == format!("{ORIGIN}{path}"));
            assert_eq!(probe(&store, path).await, listed, "{path}");
        }
    }

    #[tokio::test]
    async fn test_repeated_synthesis_is_stable() {
        let store = store_with_shards(&[1, 4]);
        let candidates = candidate_paths(&config());
        let first = synthesize_index(&store, &candidates, ORIGIN, today()).await;
        let second = synthesize_index(&store, &candidates, ORIGIN, today()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_store_gives_empty_index() {
        let store = MemoryAssetStore::new();
        let index = synthesize_index(&store, &candidate_paths(&config()), ORIGIN, today()).await;
        assert!(index.is_empty());
        assert_eq!(
            index.to_xml(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
             </sitemapindex>\n"
        );
    }

    #[test]
    fn test_xml_escapes_locations() {
        let index = SitemapIndex {
            entries: vec![SitemapEntry {
                loc: "https://example.com/sitemap.xml?a=1&b=2".to_string(),
                lastmod: today(),
            }],
        };
        let xml = index.to_xml();
        assert!(xml.contains("<loc>https://example.com/sitemap.xml?a=1&amp;b=2</loc>"));
        assert!(xml.contains("<lastmod>2024-05-17</lastmod>"));
    }
}

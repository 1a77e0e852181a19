//! Pipeline Module Tests
//!
//! Validates the in-process cluster and the pure acquisition helpers.
//!
//! ## Test Scopes
//! - **LocalCluster**: Full job/merge/archive/recover cycle on a temp dir.
//! - **Outcomes**: Exit-code folding and diagnostics.
//! - **Acquisition helpers**: Query extraction, document numbers, abstract
//!   scraping, word normalization.
//!
//! *Note: `ScholarApiSource` itself talks to live services and is only
//! exercised through its pure helpers here.*

#[cfg(test)]
mod tests {
    use crate::index::IndexStore;
    use crate::index::store::aggregated_path;
    use crate::pipeline::cluster::{CommandOutcome, ComputeCluster, LocalCluster};
    use crate::pipeline::fetch::{
        extract_abstract, extract_document_number, extract_query, normalize_words,
    };
    use std::fs;

    fn seed_corpus(dir: &std::path::Path, index_id: &str, docs: &[(&str, &str)]) {
        let corpus = dir.join(index_id);
        fs::create_dir_all(&corpus).unwrap();
        for (doc_id, words) in docs {
            fs::write(
                corpus.join(format!("{}.txt", doc_id)),
                format!("{} {}", doc_id, words),
            )
            .unwrap();
        }
    }

    // ============================================================
    // LOCAL CLUSTER TESTS
    // ============================================================

    #[tokio::test]
    async fn test_local_job_produces_parseable_index() {
        let dir = tempfile::tempdir().unwrap();
        seed_corpus(
            dir.path(),
            "idx1",
            &[("d1", "cat dog cat"), ("d2", "dog fish")],
        );
        let cluster = LocalCluster::new(dir.path());

        assert!(cluster.run_job("idx1").await.is_success());
        assert!(cluster.merge_output("idx1").await.is_success());

        let index = IndexStore::new(dir.path()).build("idx1").unwrap();
        assert_eq!(index.get("cat").unwrap().total_count, 2);
        assert_eq!(index.get("dog").unwrap().total_count, 2);
        assert_eq!(index.get("fish").unwrap().total_count, 1);

        let dog = index.get("dog").unwrap();
        assert_eq!(dog.postings.len(), 2, "dog appears in both documents");
    }

    #[tokio::test]
    async fn test_local_job_without_corpus_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = LocalCluster::new(dir.path());

        let outcome = cluster.run_job("missing").await;
        assert!(!outcome.is_success());
        assert!(!outcome.diagnostic().is_empty());
    }

    #[tokio::test]
    async fn test_merge_without_job_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = LocalCluster::new(dir.path());

        assert!(!cluster.merge_output("idx1").await.is_success());
    }

    #[tokio::test]
    async fn test_archive_and_recover_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = LocalCluster::new(dir.path());
        let local = aggregated_path(dir.path(), "idx1");
        fs::write(&local, "cat\t2:d1,2\n").unwrap();

        assert!(cluster.archive_index("idx1").await.is_success());
        fs::remove_file(&local).unwrap();

        assert!(cluster.fetch_archived_index("idx1").await.is_success());
        assert_eq!(fs::read_to_string(&local).unwrap(), "cat\t2:d1,2\n");
    }

    #[tokio::test]
    async fn test_recover_without_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = LocalCluster::new(dir.path());

        assert!(!cluster.fetch_archived_index("idx1").await.is_success());
    }

    #[tokio::test]
    async fn test_rebuild_overwrites_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        let cluster = LocalCluster::new(dir.path());
        let local = aggregated_path(dir.path(), "idx1");

        fs::write(&local, "old\t1:d1,1\n").unwrap();
        cluster.archive_index("idx1").await;
        fs::write(&local, "new\t1:d1,1\n").unwrap();
        cluster.archive_index("idx1").await;

        fs::remove_file(&local).unwrap();
        cluster.fetch_archived_index("idx1").await;
        assert_eq!(fs::read_to_string(&local).unwrap(), "new\t1:d1,1\n");
    }

    // ============================================================
    // COMMAND OUTCOME TESTS
    // ============================================================

    #[test]
    fn test_outcome_success_and_failure() {
        assert!(CommandOutcome::success().is_success());

        let failed = CommandOutcome::failure("spawn refused");
        assert!(!failed.is_success());
        assert_eq!(failed.code, -1);
        assert_eq!(failed.diagnostic(), "spawn refused");
    }

    #[test]
    fn test_diagnostic_prefers_stderr_then_stdout() {
        let outcome = CommandOutcome {
            code: 1,
            stdout: "partial output".to_string(),
            stderr: "real problem".to_string(),
        };
        assert_eq!(outcome.diagnostic(), "real problem");

        let outcome = CommandOutcome {
            code: 1,
            stdout: "partial output".to_string(),
            stderr: String::new(),
        };
        assert_eq!(outcome.diagnostic(), "partial output");

        let outcome = CommandOutcome {
            code: 3,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(outcome.diagnostic(), "exit code 3");
    }

    // ============================================================
    // ACQUISITION HELPER TESTS
    // ============================================================

    #[test]
    fn test_extract_query_parameter() {
        assert_eq!(
            extract_query("https://scholar.example.com/search?hl=en&q=deep+learning&page=2"),
            Some("deep+learning")
        );
        assert_eq!(extract_query("https://scholar.example.com/search"), None);
        assert_eq!(
            extract_query("https://scholar.example.com/search?hl=en"),
            None
        );
    }

    #[test]
    fn test_extract_document_number_variants() {
        for link in [
            "https://ieeexplore.ieee.org/document/8578572",
            "https://ieeexplore.ieee.org/document/8578572/",
            "https://ieeexplore.ieee.org/document/8578572?arnumber=1",
            "https://ieeexplore.ieee.org/document/8578572#section",
        ] {
            assert_eq!(
                extract_document_number(link).as_deref(),
                Some("8578572"),
                "{}",
                link
            );
        }

        assert_eq!(
            extract_document_number("https://ieeexplore.ieee.org/document/857a8572"),
            None
        );
        assert_eq!(extract_document_number("https://example.org/paper/123"), None);
    }

    #[test]
    fn test_extract_abstract_skips_boolean_fields() {
        let body = r#"{"openAccess":{"abstract":"true","x":1},
            "article":{"abstract":"Deep nets learn features.","doi":"10.1"}}"#;
        assert_eq!(
            extract_abstract(body).as_deref(),
            Some("Deep nets learn features.")
        );
    }

    #[test]
    fn test_extract_abstract_missing() {
        assert_eq!(extract_abstract("<html>no json here</html>"), None);
    }

    #[test]
    fn test_normalize_words_lowercases_and_strips_punctuation() {
        assert_eq!(
            normalize_words("Deep-Learning, nets (CNNs)!"),
            vec!["deep", "learning", "nets", "cnns"]
        );
        assert!(normalize_words("...!?").is_empty());
        assert!(normalize_words("").is_empty());
    }
}

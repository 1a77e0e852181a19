//! Batch compute and durable storage collaborators.

use crate::index::store::{aggregated_path, corpus_path};
use crate::reduce;
use async_trait::async_trait;
use std::fs;
use std::io::{self, BufReader, Cursor};
use std::path::PathBuf;

pub const DEFAULT_STREAMING_JAR: &str = "/usr/lib/hadoop/hadoop-streaming.jar";

/// Result of one collaborator command.
///
/// Cluster operations report through exit codes rather than errors; a spawn
/// failure is folded into code -1 so callers only ever look at the outcome.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success() -> Self {
        CommandOutcome {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        CommandOutcome {
            code: -1,
            stdout: String::new(),
            stderr: detail.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Most useful single line for logs and FAILED responses.
    pub fn diagnostic(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if !self.stdout.is_empty() {
            self.stdout.clone()
        } else {
            format!("exit code {}", self.code)
        }
    }
}

/// Batch cluster contract used by the build pipeline.
///
/// `run_job` and `merge_output` are the primary path; `archive_index` and
/// `fetch_archived_index` are the durable-storage half used for recovery.
/// All four are best-effort commands whose outcome the dispatcher inspects.
#[async_trait]
pub trait ComputeCluster: Send + Sync {
    /// Ship the corpus for `index_id` to the cluster and run the streaming
    /// map/reduce job over it.
    async fn run_job(&self, index_id: &str) -> CommandOutcome;

    /// Collect the job's output parts into the local aggregated index file.
    async fn merge_output(&self, index_id: &str) -> CommandOutcome;

    /// Copy the aggregated index file to durable storage.
    async fn archive_index(&self, index_id: &str) -> CommandOutcome;

    /// Recover a previously archived index file into the local data dir.
    async fn fetch_archived_index(&self, index_id: &str) -> CommandOutcome;
}

/// Hadoop-streaming backed cluster. Every operation shells out to the
/// `hadoop` CLI; the map and reduce stages are this same binary re-invoked
/// with its `mapper` and `reducer` subcommands.
pub struct StreamingCluster {
    data_dir: PathBuf,
    streaming_jar: String,
}

impl StreamingCluster {
    pub fn new(data_dir: impl Into<PathBuf>, streaming_jar: impl Into<String>) -> Self {
        StreamingCluster {
            data_dir: data_dir.into(),
            streaming_jar: streaming_jar.into(),
        }
    }

    async fn run_command(&self, args: &[&str]) -> CommandOutcome {
        tracing::debug!("Running: hadoop {}", args.join(" "));
        match tokio::process::Command::new("hadoop")
            .args(args)
            .output()
            .await
        {
            Ok(output) => CommandOutcome {
                code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            },
            Err(e) => CommandOutcome::failure(format!("failed to spawn hadoop: {}", e)),
        }
    }
}

#[async_trait]
impl ComputeCluster for StreamingCluster {
    async fn run_job(&self, index_id: &str) -> CommandOutcome {
        let corpus = corpus_path(&self.data_dir, index_id).display().to_string();
        let input = format!("/{}", index_id);
        let output = format!("/{}-TempOutFolder", index_id);

        // A rebuild leaves the previous input and output trees behind, and
        // the job refuses to start over an existing output path.
        self.run_command(&["fs", "-rm", "-r", "-skipTrash", &input, &output])
            .await;

        let upload = self.run_command(&["fs", "-put", &corpus, "/"]).await;
        if !upload.is_success() {
            return upload;
        }

        let exe = match std::env::current_exe() {
            Ok(path) => path,
            Err(e) => return CommandOutcome::failure(format!("cannot locate own binary: {}", e)),
        };
        let exe_path = exe.display().to_string();
        let exe_name = exe
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "scholar-cluster".to_string());
        let mapper_cmd = format!("./{} mapper", exe_name);
        let reducer_cmd = format!("./{} reducer", exe_name);

        self.run_command(&[
            "jar",
            &self.streaming_jar,
            "-file",
            &exe_path,
            "-mapper",
            &mapper_cmd,
            "-reducer",
            &reducer_cmd,
            "-input",
            &input,
            "-output",
            &output,
        ])
        .await
    }

    async fn merge_output(&self, index_id: &str) -> CommandOutcome {
        let output = format!("/{}-TempOutFolder", index_id);
        let local = aggregated_path(&self.data_dir, index_id).display().to_string();
        self.run_command(&["fs", "-getmerge", &output, &local])
            .await
    }

    async fn archive_index(&self, index_id: &str) -> CommandOutcome {
        let local = aggregated_path(&self.data_dir, index_id).display().to_string();
        let remote = format!("/{}-index", index_id);
        self.run_command(&["fs", "-put", "-f", &local, &remote])
            .await
    }

    async fn fetch_archived_index(&self, index_id: &str) -> CommandOutcome {
        let remote = format!("/{}-index", index_id);
        let local = aggregated_path(&self.data_dir, index_id);
        // -get refuses to overwrite an existing local file.
        let _ = fs::remove_file(&local);
        self.run_command(&["fs", "-get", &remote, &local.display().to_string()])
            .await
    }
}

/// In-process cluster for local mode and tests. Runs the same map and
/// reduce stages over the corpus directory and keeps its durable storage in
/// an `archive/` directory under the data dir.
pub struct LocalCluster {
    data_dir: PathBuf,
}

impl LocalCluster {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        LocalCluster {
            data_dir: data_dir.into(),
        }
    }

    fn archive_path(&self, index_id: &str) -> PathBuf {
        self.data_dir.join("archive").join(format!("{}-index", index_id))
    }

    fn temp_output_path(&self, index_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}-TempOut", index_id))
    }

    fn try_run_job(&self, index_id: &str) -> io::Result<()> {
        let corpus = corpus_path(&self.data_dir, index_id);
        let mut files: Vec<PathBuf> = fs::read_dir(&corpus)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut mapped = Vec::new();
        for path in files {
            let file = fs::File::open(&path)?;
            mapped = reduce::map_stream(BufReader::new(file), mapped)?;
        }

        // Stand-in for the shuffle phase: group equal words by sorting.
        let text = String::from_utf8(mapped)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort_unstable();

        let reduced = reduce::reduce_stream(Cursor::new(lines.join("\n")), Vec::new())?;
        fs::write(self.temp_output_path(index_id), reduced)?;
        Ok(())
    }
}

#[async_trait]
impl ComputeCluster for LocalCluster {
    async fn run_job(&self, index_id: &str) -> CommandOutcome {
        match self.try_run_job(index_id) {
            Ok(()) => CommandOutcome::success(),
            Err(e) => CommandOutcome::failure(format!("local job failed: {}", e)),
        }
    }

    async fn merge_output(&self, index_id: &str) -> CommandOutcome {
        let temp = self.temp_output_path(index_id);
        let target = aggregated_path(&self.data_dir, index_id);
        match fs::rename(&temp, &target) {
            Ok(()) => CommandOutcome::success(),
            Err(e) => CommandOutcome::failure(format!("no job output to merge: {}", e)),
        }
    }

    async fn archive_index(&self, index_id: &str) -> CommandOutcome {
        let archive = self.archive_path(index_id);
        let result = archive
            .parent()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| fs::copy(aggregated_path(&self.data_dir, index_id), &archive));
        match result {
            Ok(_) => CommandOutcome::success(),
            Err(e) => CommandOutcome::failure(format!("archive failed: {}", e)),
        }
    }

    async fn fetch_archived_index(&self, index_id: &str) -> CommandOutcome {
        match fs::copy(
            self.archive_path(index_id),
            aggregated_path(&self.data_dir, index_id),
        ) {
            Ok(_) => CommandOutcome::success(),
            Err(e) => CommandOutcome::failure(format!("no archived index: {}", e)),
        }
    }
}

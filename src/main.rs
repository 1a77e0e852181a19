use scholar_cluster::dispatch::RequestDispatcher;
use scholar_cluster::gateway::{Gateway, UdpTransport};
use scholar_cluster::index::IndexStore;
use scholar_cluster::pipeline::cluster::{
    ComputeCluster, DEFAULT_STREAMING_JAR, LocalCluster, StreamingCluster,
};
use scholar_cluster::pipeline::fetch::{DocumentSource, ScholarApiSource};
use scholar_cluster::reduce;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Streaming-job entry points. The batch cluster ships this binary and
    // runs it as `<name> mapper` / `<name> reducer` over stdin/stdout, so
    // these must stay free of any other output on stdout.
    match args.get(1).map(String::as_str) {
        Some("mapper") => {
            reduce::map_stream(io::stdin().lock(), io::stdout().lock())?;
            return Ok(());
        }
        Some("reducer") => {
            reduce::reduce_stream(io::stdin().lock(), io::stdout().lock())?;
            return Ok(());
        }
        _ => {}
    }

    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> --respond <addr:port> [--data <dir>] [--local]",
            args[0]
        );
        eprintln!("       {} mapper|reducer", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:5000 --respond 127.0.0.1:5001",
            args[0]
        );
        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut respond_addr: Option<SocketAddr> = None;
    let mut data_dir = PathBuf::from("./data");
    let mut local_mode = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--respond" => {
                respond_addr = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--data" => {
                data_dir = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--local" => {
                local_mode = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.expect("--bind is required");
    let respond_addr = respond_addr.expect("--respond is required");

    tracing::info!("Starting node on {} (responding to {})", bind_addr, respond_addr);
    tracing::info!("Data directory: {}", data_dir.display());
    std::fs::create_dir_all(&data_dir)?;

    // 1. Index store (two-tier cache over the data dir):
    let store = Arc::new(IndexStore::new(&data_dir));

    // 2. Build collaborators:
    let api_key = std::env::var("SCHOLAR_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("SCHOLAR_API_KEY is not set; acquisitions will fail over to recovery");
    }
    let source: Arc<dyn DocumentSource> = Arc::new(ScholarApiSource::new(&data_dir, api_key));

    let cluster: Arc<dyn ComputeCluster> = if local_mode {
        tracing::info!("Local mode: running batch jobs in-process");
        Arc::new(LocalCluster::new(&data_dir))
    } else {
        let streaming_jar = std::env::var("HADOOP_STREAMING_JAR")
            .unwrap_or_else(|_| DEFAULT_STREAMING_JAR.to_string());
        tracing::info!("Streaming jar: {}", streaming_jar);
        Arc::new(StreamingCluster::new(&data_dir, streaming_jar))
    };

    // 3. Dispatcher and transport:
    let dispatcher = RequestDispatcher::new(store, source, cluster);
    let transport = UdpTransport::bind(bind_addr, respond_addr).await?;

    // 4. Serve:
    tracing::info!("Press Ctrl+C to shutdown");
    let gateway = Gateway::new(transport, dispatcher);
    gateway.run().await;

    Ok(())
}

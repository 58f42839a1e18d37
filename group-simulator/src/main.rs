use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cluster;
mod models;
mod runner;
mod stats;
mod workload;

/// Cluster simulator for peercache groups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the CLI
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a workload against an in-process cluster
    Simulate {
        /// Workload CSV (node,key) produced by `generate`; a synthetic
        /// workload is used when omitted
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Number of nodes in the cluster
        #[arg(short, long, default_value = "3")]
        nodes: usize,

        /// Byte budget of each node's cache (0 = unbounded)
        /// Example: 1048576 for 1MB
        #[arg(long, default_value = "1048576")]
        max_bytes: u64,

        /// Virtual nodes per real node on the hash ring
        #[arg(long, default_value_t = peercache::config::DEFAULT_REPLICAS)]
        replicas: usize,

        /// Worker threads issuing requests
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Simulated backing-store latency in microseconds
        #[arg(long, default_value = "200")]
        loader_latency_us: u64,

        /// Size of every value in bytes
        #[arg(long, default_value = "256")]
        value_size: usize,

        /// Percentage of peer fetches that fail (exercises local fallback)
        #[arg(long, default_value = "0")]
        peer_failure_percent: u8,

        /// Synthetic workload: number of requests
        #[arg(long, default_value = "100000")]
        requests: usize,

        /// Synthetic workload: number of distinct keys
        #[arg(long, default_value = "10000")]
        keys: usize,

        /// Synthetic workload: Zipf exponent (0 = uniform)
        #[arg(long, default_value = "0.9")]
        skew: f64,

        /// Synthetic workload: percentage of requests for missing keys
        #[arg(long, default_value = "1")]
        missing_percent: u8,

        /// Synthetic workload: RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Export per-node results to CSV file
        #[arg(long, value_name = "PATH")]
        output_csv: Option<PathBuf>,
    },

    /// Generate a workload file
    Generate {
        /// Number of requests
        #[arg(long, default_value = "100000")]
        requests: usize,

        /// Number of distinct keys
        #[arg(long, default_value = "10000")]
        keys: usize,

        /// Number of nodes requests are spread over
        #[arg(short, long, default_value = "3")]
        nodes: usize,

        /// Zipf exponent (0 = uniform)
        #[arg(long, default_value = "0.9")]
        skew: f64,

        /// Percentage of requests for missing keys
        #[arg(long, default_value = "1")]
        missing_percent: u8,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output file
        #[arg(short, long, default_value = "workload.csv")]
        output: PathBuf,
    },
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,peercache=info,group_simulator=info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            requests,
            keys,
            nodes,
            skew,
            missing_percent,
            seed,
            output,
        } => {
            let config = workload::WorkloadConfig {
                requests,
                unique_keys: keys,
                skew,
                nodes,
                missing_percent,
                seed,
            };
            let requests = workload::generate(&config);
            workload::write_csv(&output, &requests)?;
            info!(requests = requests.len(), path = %output.display(), "workload written");
            Ok(())
        }

        Commands::Simulate {
            input,
            nodes,
            max_bytes,
            replicas,
            threads,
            loader_latency_us,
            value_size,
            peer_failure_percent,
            requests,
            keys,
            skew,
            missing_percent,
            seed,
            output_csv,
        } => {
            let workload = match input {
                Some(path) => {
                    info!(path = %path.display(), "reading workload");
                    workload::read_csv(&path)?
                }
                None => workload::generate(&workload::WorkloadConfig {
                    requests,
                    unique_keys: keys,
                    skew,
                    nodes,
                    missing_percent,
                    seed,
                }),
            };

            let config = models::SimulationConfig {
                nodes,
                max_bytes,
                replicas,
                threads,
                loader_latency: Duration::from_micros(loader_latency_us),
                value_size,
                peer_failure_rate: f64::from(peer_failure_percent.min(100)) / 100.0,
            };

            println!("Cluster Simulation");
            println!("==================");
            println!("{config:#?}");

            let result = runner::SimulationRunner::new(config, workload).run();
            stats::print_summary(&result);

            if let Some(csv_path) = output_csv {
                match stats::export_csv(&result, &csv_path) {
                    Ok(()) => println!("\nResults exported to: {}", csv_path.display()),
                    Err(e) => eprintln!("Failed to export CSV: {e}"),
                }
            }
            Ok(())
        }
    }
}

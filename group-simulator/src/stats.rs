// Reporting for cluster simulation results

use crate::models::SimulationResult;
use std::path::Path;

/// Prints the run summary followed by one line per node.
pub fn print_summary(result: &SimulationResult) {
    println!("\nSimulation completed in {:.2?}", result.duration);
    println!("Total requests:   {}", result.total_requests);
    println!("Unique keys:      {}", result.unique_keys);
    println!("Failed requests:  {}", result.failed_requests);
    println!("Backing loads:    {}", result.backing_loads);
    println!(
        "Cluster hit rate: {:.2}%",
        result.cluster_hit_rate() * 100.0
    );
    if result.duration.as_secs_f64() > 0.0 {
        println!(
            "Throughput:       {:.0} req/s",
            result.total_requests as f64 / result.duration.as_secs_f64()
        );
    }

    println!(
        "\n{:<10} {:>9} {:>9} {:>8} {:>8} {:>8} {:>8} {:>8} {:>9} {:>9} {:>12}",
        "node",
        "gets",
        "hits",
        "hit%",
        "peer",
        "peer_err",
        "local",
        "deduped",
        "evictions",
        "entries",
        "bytes"
    );
    println!("{}", "-".repeat(108));
    for node in &result.nodes {
        println!(
            "{:<10} {:>9} {:>9} {:>7.2}% {:>8} {:>8} {:>8} {:>8} {:>9} {:>9} {:>12}",
            node.node,
            node.gets,
            node.cache_hits,
            node.hit_rate * 100.0,
            node.peer_loads,
            node.peer_errors,
            node.local_loads,
            node.loads_deduped,
            node.evictions,
            node.cache_entries,
            node.cache_bytes
        );
    }
}

/// Writes one CSV row per node.
pub fn export_csv(result: &SimulationResult, path: &Path) -> Result<(), std::io::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for node in &result.nodes {
        writer.serialize(node)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeReport;
    use std::time::Duration;

    #[test]
    fn test_export_csv_writes_header_and_rows() {
        let row = NodeReport {
            node: "node-0".to_string(),
            gets: 10,
            cache_hits: 7,
            hit_rate: 0.7,
            loads: 3,
            loads_deduped: 0,
            peer_loads: 1,
            peer_errors: 0,
            local_loads: 2,
            local_load_errs: 0,
            evictions: 0,
            cache_entries: 2,
            cache_bytes: 64,
        };
        let result = SimulationResult {
            nodes: vec![row],
            total_requests: 10,
            unique_keys: 3,
            failed_requests: 0,
            backing_loads: 2,
            duration: Duration::from_millis(5),
        };

        let path = std::env::temp_dir().join(format!("group-sim-{}.csv", std::process::id()));
        export_csv(&result, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("node,gets,cache_hits,hit_rate"));
        assert!(lines.next().unwrap().starts_with("node-0,10,7,0.7"));
        assert!(lines.next().is_none());
    }
}

//! Appends one summary row per sweep combination to a CSV file, replacing
//! the reference driver's `rm output.csv` + hand-written `f.write(...)`
//! with a buffered `csv::Writer` opened once for the whole sweep.

use std::fs::File;
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

use crate::sweep::{RunParams, RunSummary};

/// Exactly the header `spec.md` §6 specifies, in order.
#[derive(Debug, Serialize)]
struct Row {
    no_of_clients: u64,
    strategy: &'static str,
    #[serde(rename = "type")]
    topology: &'static str,
    service_time: &'static str,
    cache_time: &'static str,
    server_utilization: f64,
    client_latency: f64,
    server_queue_length: f64,
    dropped_requests: u64,
}

pub struct Writer {
    inner: csv::Writer<File>,
}

impl Writer {
    /// Creates (truncating any existing file) the CSV at `path` and writes
    /// its header row.
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file {}", path.display()))?;
        Ok(Self {
            inner: csv::Writer::from_writer(file),
        })
    }

    pub fn write_row(&mut self, params: &RunParams, summary: &RunSummary) -> anyhow::Result<()> {
        self.inner
            .serialize(Row {
                no_of_clients: params.num_clients,
                strategy: params.strategy.as_str(),
                topology: params.topology.as_str(),
                service_time: params.service_time_tier.as_str(),
                cache_time: params.cache_time_tier.as_str(),
                server_utilization: summary.server_utilization,
                client_latency: summary.client_latency,
                server_queue_length: summary.server_queue_length,
                dropped_requests: summary.dropped_requests,
            })
            .context("failed to write CSV row")?;
        Ok(())
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.inner.flush().context("failed to flush CSV output")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use websim_core::{LbTopology, StrategyKind};

    use crate::sweep::{CacheTimeTier, ServiceTimeTier};

    #[test]
    fn writes_header_and_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = Writer::create(&path).unwrap();
        writer
            .write_row(
                &RunParams {
                    num_clients: 350,
                    strategy: StrategyKind::RoundRobin,
                    topology: LbTopology::Gateway,
                    service_time_tier: ServiceTimeTier::High,
                    cache_time_tier: CacheTimeTier::Low,
                },
                &RunSummary {
                    server_utilization: 0.5,
                    client_latency: 1.25,
                    server_queue_length: 2.0,
                    dropped_requests: 3,
                },
            )
            .unwrap();
        writer.flush().unwrap();

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "no_of_clients,strategy,type,service_time,cache_time,server_utilization,client_latency,server_queue_length,dropped_requests"
        );
        assert_eq!(
            lines.next().unwrap(),
            "350,round_robin,gateway,high,low,0.5,1.25,2,3"
        );
    }
}

//! Renders one PNG per time series named in `spec.md` §6, behind the
//! `plot` feature. Plain data-in/image-out: takes a finished run's
//! [`Metrics`] and an output directory, no simulation logic of its own.

use std::path::Path;

use anyhow::Context as _;
use websim_core::metrics::{Metrics, Sample};
use websim_plot::{plot_series, Point};

fn to_points(samples: &[Sample]) -> Vec<Point> {
    samples
        .iter()
        .map(|s| Point {
            x: s.at.as_secs_f64(),
            y: s.value,
        })
        .collect()
}

fn plot_if_nonempty(dir: &Path, name: &str, title: &str, samples: &[Sample]) -> anyhow::Result<()> {
    if samples.is_empty() {
        return Ok(());
    }
    let points = to_points(samples);
    let path = dir.join(format!("{name}.png"));
    plot_series(path.to_str().context("output path is not valid UTF-8")?, title, &points)
        .with_context(|| format!("failed to render {name}"))
}

/// Writes every series `spec.md` §6 lists for one finished run into `dir`,
/// creating it if necessary. Series with no samples (e.g. a drop counter
/// that never fired) are silently skipped rather than producing an empty
/// plot.
pub fn render_all(metrics: &Metrics, dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create plot directory {}", dir.display()))?;

    for (server, samples) in metrics.server_queue_depth_series() {
        plot_if_nonempty(
            dir,
            &format!("server_{}_queue_depth", sanitize(server.as_str())),
            &format!("Server {server} queue depth"),
            samples,
        )?;
    }
    for (server, samples) in metrics.server_drops_series() {
        plot_if_nonempty(
            dir,
            &format!("server_{}_drops", sanitize(server.as_str())),
            &format!("Server {server} dropped requests"),
            samples,
        )?;
    }

    plot_if_nonempty(dir, "lb_req_queue", "Load balancer request queue depth", metrics.lb_request_queue_depth_series())?;
    plot_if_nonempty(dir, "lb_res_queue", "Load balancer response queue depth", metrics.lb_response_queue_depth_series())?;
    plot_if_nonempty(dir, "lb_req_drops", "Load balancer request drops", metrics.lb_request_drops_series())?;
    plot_if_nonempty(dir, "lb_res_drops", "Load balancer response drops", metrics.lb_response_drops_series())?;
    plot_if_nonempty(dir, "dns_queue", "DNS queue depth", metrics.dns_queue_depth_series())?;
    plot_if_nonempty(dir, "dns_drops", "DNS drops", metrics.dns_drops_series())?;
    plot_if_nonempty(dir, "client_latency", "Client latency", metrics.client_latency_series())?;
    plot_if_nonempty(dir, "completions", "Cumulative completions", metrics.completions_series())?;
    plot_if_nonempty(dir, "concurrent_clients", "Concurrent clients", metrics.concurrent_clients_series())?;

    Ok(())
}

fn sanitize(addr: &str) -> String {
    addr.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

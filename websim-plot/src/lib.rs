//! Optional PNG rendering of a metrics time series: the raw samples plus a
//! rolling moving-average line and a shaded +-1 rolling-standard-deviation
//! band around it.
//!
//! Mirrors the reference implementation's plotting stage, which used the
//! same window size for both the moving average and the moving standard
//! deviation band.

use plotters::prelude::*;
use thiserror::Error;

/// Width of the rolling window used for both the moving average and the
/// moving standard deviation band.
pub const WINDOW_SIZE: usize = 10;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("series has no samples to plot")]
    EmptySeries,
    #[error("failed to render plot: {0}")]
    Drawing(String),
}

/// One (x, y) observation to be plotted. `x` is virtual time in seconds.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Renders `series` to a PNG at `path`, titled `title`, with a moving
/// average overlay and a shaded +-1 standard deviation band.
pub fn plot_series(path: &str, title: &str, series: &[Point]) -> Result<(), PlotError> {
    if series.is_empty() {
        return Err(PlotError::EmptySeries);
    }

    let moving_avg = moving_average(series, WINDOW_SIZE);
    let moving_std = moving_std_dev(series, WINDOW_SIZE);

    let x_min = series.first().map(|p| p.x).unwrap_or(0.0);
    let x_max = series.last().map(|p| p.x).unwrap_or(1.0);
    let y_min = series.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let y_max = series.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let y_pad = ((y_max - y_min).abs() * 0.1).max(1.0);

    let root = BitMapBackend::new(path, (1024, 576)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(
            x_min..x_max.max(x_min + 1.0),
            (y_min - y_pad)..(y_max + y_pad),
        )
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("time (s)")
        .y_desc("value")
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let band: Vec<(f64, f64, f64)> = moving_avg
        .iter()
        .zip(moving_std.iter())
        .map(|((x, avg), (_, std))| (*x, avg - std, avg + std))
        .collect();
    chart
        .draw_series(AreaSeries::new(
            band.iter().map(|(x, low, _)| (*x, *low)),
            y_min - y_pad,
            BLUE.mix(0.0),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    chart
        .draw_series(band.windows(2).map(|w| {
            let (x0, low0, high0) = w[0];
            let (x1, low1, high1) = w[1];
            Polygon::new(
                vec![(x0, low0), (x1, low1), (x1, high1), (x0, high0)],
                BLUE.mix(0.15),
            )
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(series.iter().map(|p| Circle::new((p.x, p.y), 2, GREY.mix(0.5).filled())))
        .map_err(|e| PlotError::Drawing(e.to_string()))?
        .label("raw samples");

    chart
        .draw_series(LineSeries::new(
            moving_avg.iter().map(|(x, y)| (*x, *y)),
            &RED,
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?
        .label("moving average")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present().map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

fn moving_average(series: &[Point], window: usize) -> Vec<(f64, f64)> {
    windowed(series, window, |chunk| {
        chunk.iter().map(|p| p.y).sum::<f64>() / chunk.len() as f64
    })
}

fn moving_std_dev(series: &[Point], window: usize) -> Vec<(f64, f64)> {
    windowed(series, window, |chunk| {
        let mean = chunk.iter().map(|p| p.y).sum::<f64>() / chunk.len() as f64;
        let variance =
            chunk.iter().map(|p| (p.y - mean).powi(2)).sum::<f64>() / chunk.len() as f64;
        variance.sqrt()
    })
}

fn windowed(series: &[Point], window: usize, reduce: impl Fn(&[Point]) -> f64) -> Vec<(f64, f64)> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let start = i.saturating_sub(window - 1);
        let chunk = &series[start..=i];
        out.push((series[i].x, reduce(chunk)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_matches_manual_calc() {
        let series: Vec<Point> = (0..5)
            .map(|i| Point {
                x: i as f64,
                y: i as f64,
            })
            .collect();
        let avg = moving_average(&series, 3);
        // window at i=4 covers y = [2,3,4]
        assert!((avg[4].1 - 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_series_rejected() {
        let err = plot_series("/tmp/does-not-matter.png", "t", &[]).unwrap_err();
        assert!(matches!(err, PlotError::EmptySeries));
    }
}

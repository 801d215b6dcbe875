//! Near and far points plot

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use plotters::{
    coord::ranged1d::{AsRangedCoord, ValueFormatter},
    prelude::*,
    series::DashedLineSeries,
};

use crate::{
    config::PlotOptions,
    report::{ReportError, StagedFile},
    table::DofTable,
};

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("failed to draw {1:?}: {0}")]
    Drawing(String, PathBuf),
    #[error("failed to save the plot")]
    Export(#[from] ReportError),
    #[error("nothing to plot, no cell of the table could be computed")]
    Empty,
}
type Result<T> = std::result::Result<T, PlotError>;

fn drawing_error<E: Display>(path: &Path) -> impl Fn(E) -> PlotError + '_ {
    move |e| PlotError::Drawing(e.to_string(), path.to_path_buf())
}

/// Finite (aperture, distance) points of one subject distance
struct Series {
    distance_m: f64,
    near: Vec<(f64, f64)>,
    far: Vec<(f64, f64)>,
}

impl DofTable {
    fn series(&self) -> Vec<Series> {
        self.distances()
            .iter()
            .zip(self.rows())
            .map(|(&distance_m, row)| {
                let results: Vec<_> = row.iter().filter_map(|cell| cell.as_ref().ok()).collect();
                Series {
                    distance_m,
                    near: results
                        .iter()
                        .map(|result| (result.aperture, result.near_point_m))
                        .collect(),
                    far: results
                        .iter()
                        .filter_map(|result| {
                            result.far_point.finite().map(|far| (result.aperture, far))
                        })
                        .collect(),
                }
            })
            .collect()
    }
    /// Plots the near and far points versus aperture, one pair of lines per distance
    ///
    /// Far points at infinity and degenerate cells are left out.
    pub fn plot<P: AsRef<Path>>(&self, path: P, options: &PlotOptions) -> Result<PathBuf> {
        let series = self.series();
        let values: Vec<f64> = series
            .iter()
            .flat_map(|s| s.near.iter().chain(s.far.iter()).map(|(_, y)| *y))
            .collect();
        if values.is_empty() {
            return Err(PlotError::Empty);
        }
        let y_min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let y_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let staged = StagedFile::new(path)?;
        if options.log_scale {
            let (lower, upper) = match options.y_limit {
                Some((lower, upper)) if lower > 0f64 => (lower, upper),
                Some((_, upper)) => {
                    log::warn!("non-positive lower distance limit ignored on a log scale");
                    (y_min * 0.8, upper)
                }
                None => (y_min * 0.8, y_max * 1.25),
            };
            self.draw(staged.partial(), options, &series, (lower..upper).log_scale())?;
        } else {
            let (lower, upper) = options.y_limit.unwrap_or((0f64, y_max * 1.05));
            self.draw(staged.partial(), options, &series, lower..upper)?;
        }
        let path = staged.commit()?;
        log::info!("near and far points plot written to {:?}", path);
        Ok(path)
    }
    fn draw<Y>(
        &self,
        path: &Path,
        options: &PlotOptions,
        series: &[Series],
        y_range: Y,
    ) -> Result<()>
    where
        Y: AsRangedCoord<Value = f64>,
        Y::CoordDescType: ValueFormatter<f64>,
    {
        let n_min = self.apertures().iter().cloned().fold(f64::INFINITY, f64::min);
        let n_max = self
            .apertures()
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        let padding = ((n_max - n_min) * 0.03).max(0.1);
        // apertures are drawn at -N on an inverted axis
        let sign = if options.invert_aperture_axis {
            -1f64
        } else {
            1f64
        };
        let x_range = if options.invert_aperture_axis {
            -(n_max + padding)..-(n_min - padding)
        } else {
            (n_min - padding)..(n_max + padding)
        };
        let pixels = |points: f64| options.scaled(points).round() as u32;

        let plot = BitMapBackend::new(path, options.pixels()).into_drawing_area();
        plot.fill(&WHITE).map_err(drawing_error(path))?;
        let mut chart = ChartBuilder::on(&plot)
            .caption(
                "Near and Far Points vs. Aperture for Various Distances",
                ("sans-serif", options.scaled(16.)),
            )
            .set_label_area_size(LabelAreaPosition::Left, pixels(50.))
            .set_label_area_size(LabelAreaPosition::Bottom, pixels(40.))
            .margin(pixels(10.))
            .build_cartesian_2d(x_range, y_range)
            .map_err(drawing_error(path))?;
        chart
            .configure_mesh()
            .x_desc("Aperture (f)")
            .y_desc("Distance (m)")
            .x_label_formatter(&|x| format!("{}", (sign * x * 10.).round() / 10.))
            .label_style(("sans-serif", options.scaled(10.)))
            .axis_desc_style(("sans-serif", options.scaled(12.)))
            .draw()
            .map_err(drawing_error(path))?;

        let stroke = pixels(1.5);
        let marker = pixels(3.);
        for (s, color) in series.iter().zip(colorous::TABLEAU10.iter().cycle()) {
            let rgb = RGBColor(color.r, color.g, color.b);
            let near: Vec<_> = s.near.iter().map(|&(n, y)| (sign * n, y)).collect();
            let far: Vec<_> = s.far.iter().map(|&(n, y)| (sign * n, y)).collect();
            chart
                .draw_series(LineSeries::new(near.iter().cloned(), rgb.stroke_width(stroke)))
                .map_err(drawing_error(path))?
                .label(format!("Near Point at {} m", s.distance_m))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], rgb.stroke_width(stroke))
                });
            chart
                .draw_series(near.iter().map(|&p| Circle::new(p, marker, rgb.filled())))
                .map_err(drawing_error(path))?;
            if far.is_empty() {
                continue;
            }
            chart
                .draw_series(DashedLineSeries::new(
                    far.iter().cloned(),
                    pixels(6.),
                    pixels(4.),
                    rgb.stroke_width(stroke),
                ))
                .map_err(drawing_error(path))?
                .label(format!("Far Point at {} m", s.distance_m))
                .legend(move |(x, y)| Cross::new((x + 10, y), 4, rgb.stroke_width(stroke)));
            chart
                .draw_series(far.iter().map(|&p| Cross::new(p, marker, rgb.stroke_width(stroke))))
                .map_err(drawing_error(path))?;
        }
        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .label_font(("sans-serif", options.scaled(9.)))
            .position(SeriesLabelPosition::UpperRight)
            .draw()
            .map_err(drawing_error(path))?;
        plot.present().map_err(drawing_error(path))?;
        Ok(())
    }
}

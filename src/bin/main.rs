use std::path::PathBuf;

use dof_cheatsheet::{config::PLOT_FILENAME, DofTable, MarkdownReport, ReportConfig};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "dof-cheatsheet",
    about = "Depth of field cheatsheet: near & far points tables, plot and Markdown report"
)]
struct Opt {
    /// JSON configuration file, defaults to the file given by the `DOF_CONFIG` env var
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Lens focal length [mm]
    #[structopt(short, long)]
    focal_length: Option<f64>,
    /// Circle of confusion [mm]
    #[structopt(long)]
    coc: Option<f64>,
    /// Comma separated apertures [f-number]
    #[structopt(short, long, use_delimiter = true)]
    apertures: Option<Vec<f64>>,
    /// Comma separated subject distances [m]
    #[structopt(short, long, use_delimiter = true)]
    distances: Option<Vec<f64>>,
    /// Round the reported values to that many decimals
    #[structopt(long)]
    decimals: Option<u32>,
    /// Do not invert the aperture axis of the plot
    #[structopt(long)]
    no_invert: bool,
    /// Linear distance axis
    #[structopt(long)]
    linear: bool,
    /// Distance axis range [m] as `lower,upper`
    #[structopt(long, use_delimiter = true, number_of_values = 2)]
    y_limit: Option<Vec<f64>>,
    /// Plot image path
    #[structopt(long, parse(from_os_str))]
    plot: Option<PathBuf>,
    /// Skip the plot
    #[structopt(long)]
    no_plot: bool,
    /// Plot resolution
    #[structopt(long)]
    dpi: Option<u32>,
    /// Write the Markdown report to that path
    #[structopt(long, parse(from_os_str))]
    markdown: Option<PathBuf>,
    /// Write the table to that CSV file
    #[structopt(long, parse(from_os_str))]
    csv: Option<PathBuf>,
}
impl Opt {
    /// Overrides the configuration with the command line arguments
    fn configure(self, mut config: ReportConfig) -> ReportConfig {
        if let Some(arg) = self.focal_length {
            config = config.focal_length_mm(arg);
        }
        if let Some(arg) = self.coc {
            config = config.circle_of_confusion_mm(arg);
        }
        if let Some(arg) = self.apertures {
            config = config.apertures(arg);
        }
        if let Some(arg) = self.distances {
            config = config.distances(arg);
        }
        if let Some(arg) = self.decimals {
            config = config.decimals(arg);
        }
        if self.no_invert {
            config = config.invert_aperture_axis(false);
        }
        if self.linear {
            config = config.log_scale(false);
        }
        if let Some(&[lower, upper]) = self.y_limit.as_deref() {
            config = config.y_limit(lower, upper);
        }
        if let Some(arg) = self.dpi {
            config = config.dpi(arg);
        }
        if let Some(arg) = self.plot {
            config = config.plot(arg);
        }
        if self.no_plot {
            config = config.no_plot();
        }
        if let Some(arg) = self.markdown {
            config = config.markdown(arg);
        }
        if let Some(arg) = self.csv {
            config = config.csv(arg);
        }
        config
    }
}

fn run(config: &ReportConfig) -> Result<(), dof_cheatsheet::Error> {
    let rounding = config.rounding();
    let table = DofTable::compute(config.optics()?, &config.apertures, &config.distances)?;
    table.summary(rounding);

    #[cfg(feature = "plot")]
    if let Some(path) = &config.plot {
        table.plot(path, &config.plot_options)?;
    }
    #[cfg(not(feature = "plot"))]
    if config.plot.is_some() {
        log::warn!("built without the `plot` feature, the plot is not written");
    }

    if let Some(path) = &config.csv {
        table.to_csv(path, rounding)?;
    }
    if let Some(path) = &config.markdown {
        let image = config.plot.clone().unwrap_or_else(|| {
            log::warn!("the Markdown report refers to {PLOT_FILENAME} which is not generated");
            PathBuf::from(PLOT_FILENAME)
        });
        MarkdownReport::new(&table, image)
            .rounding(rounding)
            .write(path)?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut opt = Opt::from_args();

    let path = opt.config.take();
    let config = opt.configure(ReportConfig::load(path)?);
    log::debug!("{:?}", config);
    run(&config)?;

    Ok(())
}

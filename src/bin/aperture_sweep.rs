use std::path::PathBuf;

use dof_cheatsheet::{ApertureSweep, ReportConfig, Rounding};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "aperture-sweep",
    about = "Near point, far point & depth of field versus aperture at a single subject distance"
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
    /// Subject distance [m]
    #[structopt(short, long, default_value = "2")]
    distance: f64,
    /// Round the reported values to that many decimals
    #[structopt(long, default_value = "2")]
    decimals: u32,
    /// Report the values with full precision
    #[structopt(long)]
    full: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut config = ReportConfig::load(opt.config.as_ref())?;
    if let Some(arg) = opt.focal_length {
        config = config.focal_length_mm(arg);
    }
    if let Some(arg) = opt.coc {
        config = config.circle_of_confusion_mm(arg);
    }
    if let Some(arg) = opt.apertures {
        config = config.apertures(arg);
    }
    let rounding = if opt.full {
        Rounding::Full
    } else {
        Rounding::Decimals(opt.decimals)
    };

    let sweep = ApertureSweep::compute(config.optics()?, &config.apertures, opt.distance)?;
    sweep.summary(rounding);

    Ok(())
}

/*!
# Depth of field cheatsheet

Tables and plots of the photographic depth of field of a lens versus aperture and
subject distance.

## Key Components

- [`OpticalConfig`] - lens focal length and circle of confusion
- [`DofTable`] - near point, far point and depth of field for every pair of
  subject distance and aperture
- [`ApertureSweep`] - the same quantities at a single subject distance
- [`ReportConfig`] - run parameters, loaded from defaults, a JSON file and the command line
- [`MarkdownReport`] - Markdown export of the near and far point tables

## Usage

```rust,no_run
use dof_cheatsheet::{DofTable, OpticalConfig, Rounding, APERTURES, DISTANCES};

let optics = OpticalConfig::new(40., 0.03)?;
let table = DofTable::compute(optics, &APERTURES, &DISTANCES)?;
table.summary(Rounding::Decimals(2));
# Ok::<(), dof_cheatsheet::OpticsError>(())
```
*/

/// Default focal length [mm]
pub const FOCAL_LENGTH_MM: f64 = 40f64;
/// Default circle of confusion [mm]
pub const CIRCLE_OF_CONFUSION_MM: f64 = 0.03;
/// Default apertures [f-number]
pub const APERTURES: [f64; 10] = [1.7, 2., 2.8, 4., 5.6, 8., 11., 16., 22., 28.];
/// Default subject distances [m]
pub const DISTANCES: [f64; 6] = [0.5, 1., 2., 5., 10., 20.];

pub mod config;
mod error;
pub mod optics;
#[cfg(feature = "plot")]
pub mod plot;
pub mod report;
pub mod table;

pub use config::{ConfigError, PlotOptions, ReportConfig};
pub use error::Error;
pub use optics::{Distance, OpticalConfig, OpticsError};
#[cfg(feature = "plot")]
pub use plot::PlotError;
pub use report::{MarkdownReport, ReportError};
pub use table::{ApertureSweep, Cell, DofResult, DofTable, Quantity, Rounding, TableError};

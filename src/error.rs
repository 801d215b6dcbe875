use crate::{config::ConfigError, optics::OpticsError, report::ReportError, table::TableError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `optics` module")]
    Optics(#[from] OpticsError),
    #[error("Error in the `config` module")]
    Config(#[from] ConfigError),
    #[error("Error in the `table` module")]
    Table(#[from] TableError),
    #[error("Error in the `report` module")]
    Report(#[from] ReportError),
    #[cfg(feature = "plot")]
    #[error("Error in the `plot` module")]
    Plot(#[from] crate::plot::PlotError),
}

//! Depth of field tables
//!
//! A [DofTable] holds one [Cell] per (distance, aperture) pair, indexed
//! `[distance][aperture]` in the order the distances and apertures were given.
//! A degenerate cell does not abort the table, it is kept as an error in its slot.

use std::{path::Path, time::Instant};

use rayon::prelude::*;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::{
    optics::{
        depth_of_field, far_point, near_point, validate, Distance, OpticalConfig, OpticsError,
        Parameter,
    },
    report::{self, text_table, StagedFile},
};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to compute the depth of field table")]
    Optics(#[from] OpticsError),
    #[error("failed to write the CSV file")]
    Csv(#[from] csv::Error),
    #[error("failed to export the table")]
    Export(#[from] report::ReportError),
}
type Result<T> = std::result::Result<T, TableError>;

/// Depth of field at one aperture and one subject distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DofResult {
    pub aperture: f64,
    pub distance_m: f64,
    pub hyperfocal_m: f64,
    pub near_point_m: f64,
    pub far_point: Distance,
    pub dof: Distance,
}
impl DofResult {
    /// Computes the hyperfocal distance, the near and far points and the depth of field
    pub fn compute(
        optics: &OpticalConfig,
        aperture: f64,
        distance_m: f64,
    ) -> std::result::Result<Self, OpticsError> {
        let aperture = validate(Parameter::Aperture, aperture)?;
        let distance_m = validate(Parameter::Distance, distance_m)?;
        let degenerate = OpticsError::DegenerateGeometry {
            distance_m,
            aperture,
        };
        if distance_m <= optics.focal_length_m() {
            return Err(degenerate);
        }
        let hyperfocal_m = optics.hyperfocal_distance(aperture);
        if !hyperfocal_m.is_finite() {
            return Err(degenerate);
        }
        let near_point_m =
            near_point(hyperfocal_m, distance_m, optics.focal_length_mm()).ok_or(degenerate)?;
        let far_point = far_point(hyperfocal_m, distance_m, optics.focal_length_mm());
        Ok(Self {
            aperture,
            distance_m,
            hyperfocal_m,
            near_point_m,
            far_point,
            dof: depth_of_field(near_point_m, far_point),
        })
    }
    pub fn get(&self, quantity: Quantity) -> Distance {
        match quantity {
            Quantity::NearPoint => Distance::Finite(self.near_point_m),
            Quantity::FarPoint => self.far_point,
            Quantity::DepthOfField => self.dof,
        }
    }
}

/// Table cell: a result or the reason it could not be computed
pub type Cell = std::result::Result<DofResult, OpticsError>;

/// Depth of field quantities a table can be projected onto
#[derive(EnumIter, Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    NearPoint,
    FarPoint,
    DepthOfField,
}
impl Quantity {
    pub fn title(&self) -> &'static str {
        match self {
            Quantity::NearPoint => "Near Points (m)",
            Quantity::FarPoint => "Far Points (m)",
            Quantity::DepthOfField => "Depth of Field (m)",
        }
    }
}

/// Presentation rounding of table values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Rounding {
    /// Full floating point precision
    #[default]
    Full,
    /// Rounded half away from zero to that many decimal places
    Decimals(u32),
}
impl Rounding {
    pub fn apply(&self, value: Distance) -> Distance {
        match self {
            Rounding::Full => value,
            Rounding::Decimals(decimals) => value.round(*decimals),
        }
    }
    pub fn format(&self, value: Distance) -> String {
        match self {
            Rounding::Full => value.to_string(),
            Rounding::Decimals(decimals) => {
                format!("{:.*}", *decimals as usize, self.apply(value))
            }
        }
    }
    /// Formats a table cell, degenerate cells are marked `n/a`
    pub fn format_cell(&self, cell: &Cell, quantity: Quantity) -> String {
        match cell {
            Ok(result) => self.format(result.get(quantity)),
            Err(_) => String::from("n/a"),
        }
    }
}
impl From<Option<u32>> for Rounding {
    fn from(decimals: Option<u32>) -> Self {
        decimals.map_or(Rounding::Full, Rounding::Decimals)
    }
}

fn validate_all(
    parameter: Parameter,
    name: &'static str,
    values: &[f64],
) -> std::result::Result<(), OpticsError> {
    if values.is_empty() {
        return Err(OpticsError::EmptyInput(name));
    }
    values
        .iter()
        .try_for_each(|&value| validate(parameter, value).map(|_| ()))
}

/// Depth of field for every pair of subject distances and apertures
#[derive(Debug, Clone)]
pub struct DofTable {
    optics: OpticalConfig,
    apertures: Vec<f64>,
    distances: Vec<f64>,
    rows: Vec<Vec<Cell>>,
}
impl DofTable {
    /// Computes the table, rows are evaluated in parallel
    pub fn compute(
        optics: OpticalConfig,
        apertures: &[f64],
        distances: &[f64],
    ) -> std::result::Result<Self, OpticsError> {
        validate_all(Parameter::Aperture, "apertures", apertures)?;
        validate_all(Parameter::Distance, "distances", distances)?;
        let now = Instant::now();
        let rows: Vec<Vec<Cell>> = distances
            .par_iter()
            .map(|&distance| {
                apertures
                    .iter()
                    .map(|&aperture| DofResult::compute(&optics, aperture, distance))
                    .collect()
            })
            .collect();
        log::info!(
            "{}x{} depth of field table computed in {}us",
            distances.len(),
            apertures.len(),
            now.elapsed().as_micros()
        );
        let this = Self {
            optics,
            apertures: apertures.to_vec(),
            distances: distances.to_vec(),
            rows,
        };
        this.degenerate_cells().for_each(|e| log::warn!("{}", e));
        Ok(this)
    }
    pub fn optics(&self) -> &OpticalConfig {
        &self.optics
    }
    pub fn apertures(&self) -> &[f64] {
        &self.apertures
    }
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
    /// Returns the cell at the given distance and aperture indices
    pub fn cell(&self, distance_idx: usize, aperture_idx: usize) -> Option<&Cell> {
        self.rows.get(distance_idx)?.get(aperture_idx)
    }
    /// Iterator over the errors of the cells that could not be computed
    pub fn degenerate_cells(&self) -> impl Iterator<Item = &OpticsError> {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter_map(|cell| cell.as_ref().err())
    }
    /// Projects the table onto one quantity, `None` marks degenerate cells
    pub fn column(&self, quantity: Quantity) -> Vec<Vec<Option<Distance>>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().ok().map(|result| result.get(quantity)))
                    .collect()
            })
            .collect()
    }
    /// Restriction of the table to the distance at `distance_idx`
    pub fn sweep(&self, distance_idx: usize) -> Option<ApertureSweep> {
        Some(ApertureSweep {
            optics: self.optics,
            distance_m: *self.distances.get(distance_idx)?,
            results: self.rows.get(distance_idx)?.clone(),
        })
    }
    /// Formatted cells of one quantity together with the row and column labels
    pub fn formatted(&self, quantity: Quantity, rounding: Rounding) -> FormattedTable {
        FormattedTable {
            columns: self.apertures.iter().map(|a| a.to_string()).collect(),
            rows: self
                .distances
                .iter()
                .zip(self.rows.iter())
                .map(|(distance, row)| {
                    (
                        distance.to_string(),
                        row.iter()
                            .map(|cell| rounding.format_cell(cell, quantity))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
    /// Console report of the given quantities
    pub fn to_text(&self, quantities: &[Quantity], rounding: Rounding) -> String {
        quantities
            .iter()
            .map(|&quantity| {
                let table = self.formatted(quantity, rounding);
                format!(
                    "{}:\n{}",
                    quantity.title(),
                    text_table("Distance (m)", Some("Aperture (f)"), &table)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
    /// Prints the near and far point tables
    pub fn summary(&self, rounding: Rounding) {
        println!(
            "{}",
            self.to_text(&[Quantity::NearPoint, Quantity::FarPoint], rounding)
        );
    }
    /// Writes the table to a CSV file, one record per cell
    pub fn to_csv<P: AsRef<Path>>(&self, path: P, rounding: Rounding) -> Result<()> {
        let mut staged = StagedFile::new(path)?;
        {
            let mut wtr = csv::Writer::from_writer(staged.file_mut());
            let mut headers = vec!["distance_m", "aperture", "hyperfocal_m"];
            headers.extend(Quantity::iter().map(|quantity| match quantity {
                Quantity::NearPoint => "near_point_m",
                Quantity::FarPoint => "far_point_m",
                Quantity::DepthOfField => "dof_m",
            }));
            headers.push("status");
            wtr.write_record(&headers)?;
            for (&distance, row) in self.distances.iter().zip(self.rows.iter()) {
                for (&aperture, cell) in self.apertures.iter().zip(row.iter()) {
                    let mut record = vec![distance.to_string(), aperture.to_string()];
                    match cell {
                        Ok(result) => {
                            record.push(rounding.format(Distance::Finite(result.hyperfocal_m)));
                            record.extend(
                                Quantity::iter().map(|quantity| rounding.format(result.get(quantity))),
                            );
                            record.push(String::from("ok"));
                        }
                        Err(_) => {
                            record.extend(std::iter::repeat(String::new()).take(4));
                            record.push(String::from("degenerate"));
                        }
                    }
                    wtr.write_record(&record)?;
                }
            }
            wtr.flush().map_err(csv::Error::from)?;
        }
        let path = staged.commit()?;
        log::info!("depth of field table written to {:?}", path);
        Ok(())
    }
}

/// Cell strings of a table with their row and column labels
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedTable {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<String>)>,
}

/// Depth of field versus aperture at a single subject distance
#[derive(Debug, Clone)]
pub struct ApertureSweep {
    optics: OpticalConfig,
    distance_m: f64,
    results: Vec<Cell>,
}
impl ApertureSweep {
    pub fn compute(
        optics: OpticalConfig,
        apertures: &[f64],
        distance_m: f64,
    ) -> std::result::Result<Self, OpticsError> {
        let table = DofTable::compute(optics, apertures, &[distance_m])?;
        table
            .sweep(0)
            .ok_or(OpticsError::EmptyInput("distances"))
    }
    pub fn optics(&self) -> &OpticalConfig {
        &self.optics
    }
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }
    pub fn results(&self) -> &[Cell] {
        &self.results
    }
    /// Depth of field at each aperture, `None` marks degenerate cells
    pub fn dof(&self) -> Vec<Option<Distance>> {
        self.results
            .iter()
            .map(|cell| cell.as_ref().ok().map(|result| result.dof))
            .collect()
    }
    pub fn formatted(&self, rounding: Rounding) -> FormattedTable {
        FormattedTable {
            columns: Quantity::iter()
                .map(|quantity| quantity.title().replace("Points", "Point"))
                .collect(),
            rows: self
                .results
                .iter()
                .map(|cell| {
                    let aperture = match cell {
                        Ok(result) => result.aperture,
                        Err(OpticsError::DegenerateGeometry { aperture, .. }) => *aperture,
                        Err(_) => f64::NAN,
                    };
                    (
                        aperture.to_string(),
                        Quantity::iter()
                            .map(|quantity| rounding.format_cell(cell, quantity))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
    pub fn to_text(&self, rounding: Rounding) -> String {
        format!(
            "Depth of field at {} m:\n{}",
            self.distance_m,
            text_table("Aperture (f)", None, &self.formatted(rounding))
        )
    }
    pub fn summary(&self, rounding: Rounding) {
        println!("{}", self.to_text(rounding));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{APERTURES, CIRCLE_OF_CONFUSION_MM, DISTANCES, FOCAL_LENGTH_MM};

    fn cheatsheet() -> DofTable {
        let optics = OpticalConfig::new(FOCAL_LENGTH_MM, CIRCLE_OF_CONFUSION_MM).unwrap();
        DofTable::compute(optics, &APERTURES, &DISTANCES).unwrap()
    }

    #[test]
    fn table_layout() {
        let table = cheatsheet();
        assert_eq!(table.rows().len(), DISTANCES.len());
        assert!(table.rows().iter().all(|row| row.len() == APERTURES.len()));
        for (row, &distance) in table.rows().iter().zip(DISTANCES.iter()) {
            for (cell, &aperture) in row.iter().zip(APERTURES.iter()) {
                let result = cell.as_ref().unwrap();
                assert_eq!(result.distance_m, distance);
                assert_eq!(result.aperture, aperture);
            }
        }
    }

    #[test]
    fn fixture_cell() {
        let table = cheatsheet();
        // 2m at f/8
        let result = table.cell(2, 5).unwrap().as_ref().unwrap();
        assert_eq!(result.aperture, 8f64);
        assert!((result.near_point_m - 1.5476923076923075).abs() < 1e-12);
        assert!((result.far_point.finite().unwrap() - 2.8258426966292136).abs() < 1e-12);
        assert!((result.dof.finite().unwrap() - 1.2781503889369061).abs() < 1e-12);
    }

    #[test]
    fn infinite_far_point_iff_beyond_hyperfocal() {
        let table = cheatsheet();
        for cell in table.rows().iter().flatten() {
            let result = cell.as_ref().unwrap();
            assert_eq!(
                result.far_point.is_infinite(),
                result.distance_m >= result.hyperfocal_m
            );
            assert_eq!(result.dof.is_infinite(), result.far_point.is_infinite());
        }
        // 2m at f/28: H = 1.94m
        assert!(table.cell(2, 9).unwrap().as_ref().unwrap().far_point.is_infinite());
        // 2m at f/22: H = 2.46m
        assert!(!table.cell(2, 8).unwrap().as_ref().unwrap().far_point.is_infinite());
    }

    #[test]
    fn dof_non_decreasing_with_f_number() {
        let table = cheatsheet();
        for row in table.column(Quantity::DepthOfField) {
            let dof: Vec<_> = row.into_iter().map(|d| d.unwrap()).collect();
            for w in dof.windows(2) {
                match (w[0], w[1]) {
                    (Distance::Finite(a), Distance::Finite(b)) => assert!(b >= a),
                    (Distance::Infinite, Distance::Finite(_)) => panic!("DOF decreased from infinity"),
                    _ => (),
                }
            }
        }
    }

    #[test]
    fn degenerate_cell_does_not_abort_table() {
        let optics = OpticalConfig::new(FOCAL_LENGTH_MM, CIRCLE_OF_CONFUSION_MM).unwrap();
        let table = DofTable::compute(optics, &[2.8, 8.], &[0.03, 2.]).unwrap();
        assert!(table.rows()[0].iter().all(|cell| matches!(
            cell,
            Err(OpticsError::DegenerateGeometry { .. })
        )));
        assert!(table.rows()[1].iter().all(|cell| cell.is_ok()));
        assert_eq!(table.degenerate_cells().count(), 2);
        assert_eq!(table.column(Quantity::NearPoint)[0], vec![None, None]);
        assert_eq!(
            table.formatted(Quantity::NearPoint, Rounding::Decimals(2)).rows[0].1,
            vec!["n/a", "n/a"]
        );
    }

    #[test]
    fn invalid_inputs_rejected_before_computation() {
        let optics = OpticalConfig::new(FOCAL_LENGTH_MM, CIRCLE_OF_CONFUSION_MM).unwrap();
        assert!(matches!(
            DofTable::compute(optics, &[2.8, 0.], &[2.]),
            Err(OpticsError::InvalidConfiguration {
                parameter: Parameter::Aperture,
                ..
            })
        ));
        assert!(matches!(
            DofTable::compute(optics, &[2.8], &[-1.]),
            Err(OpticsError::InvalidConfiguration {
                parameter: Parameter::Distance,
                ..
            })
        ));
        assert!(matches!(
            DofTable::compute(optics, &[], &[2.]),
            Err(OpticsError::EmptyInput("apertures"))
        ));
    }

    #[test]
    fn rounded_cells() {
        let table = cheatsheet();
        let near = table.formatted(Quantity::NearPoint, Rounding::Decimals(2));
        assert_eq!(near.rows[2].0, "2");
        assert_eq!(near.rows[2].1[5], "1.55");
        let far = table.formatted(Quantity::FarPoint, Rounding::Decimals(2));
        assert_eq!(far.rows[2].1[5], "2.83");
        assert_eq!(far.rows[2].1[9], "inf");
        let full = table.formatted(Quantity::NearPoint, Rounding::Full);
        let result = table.cell(2, 5).unwrap().as_ref().unwrap();
        assert_eq!(full.rows[2].1[5], result.near_point_m.to_string());
        assert!(near
            .rows
            .iter()
            .flat_map(|(_, cells)| cells.iter())
            .filter(|cell| cell.as_str() != "inf")
            .all(|cell| cell.split('.').nth(1).map(|d| d.len()) == Some(2)));
    }

    #[test]
    fn sweep_matches_table_row() {
        let optics = OpticalConfig::new(FOCAL_LENGTH_MM, CIRCLE_OF_CONFUSION_MM).unwrap();
        let sweep = ApertureSweep::compute(optics, &APERTURES, 2f64).unwrap();
        let table = cheatsheet();
        assert_eq!(sweep.results(), table.sweep(2).unwrap().results());
        assert_eq!(sweep.distance_m(), 2f64);
        let text = sweep.to_text(Rounding::Decimals(2));
        assert!(text.starts_with("Depth of field at 2 m:"));
        assert!(text.contains("1.28"));
    }

    #[test]
    fn sweep_dof_column() {
        let optics = OpticalConfig::new(FOCAL_LENGTH_MM, CIRCLE_OF_CONFUSION_MM).unwrap();
        let dof = ApertureSweep::compute(optics, &APERTURES, 2f64).unwrap().dof();
        assert_eq!(dof.len(), APERTURES.len());
        // f/8
        let f8 = dof[5].and_then(|d| d.finite()).unwrap();
        assert!((f8 - 1.2781503889369061).abs() < 1e-12);
        // f/28, beyond the hyperfocal distance
        assert_eq!(dof[9], Some(Distance::Infinite));
    }

    #[test]
    fn overflowing_hyperfocal_is_degenerate() {
        let optics = OpticalConfig::new(FOCAL_LENGTH_MM, CIRCLE_OF_CONFUSION_MM).unwrap();
        // N c underflows to a subnormal and H to infinity
        assert!(optics.hyperfocal_distance(f64::MIN_POSITIVE).is_infinite());
        assert!(matches!(
            DofResult::compute(&optics, f64::MIN_POSITIVE, 2f64),
            Err(OpticsError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn console_report() {
        let text = cheatsheet().to_text(
            &[Quantity::NearPoint, Quantity::FarPoint],
            Rounding::Decimals(2),
        );
        assert!(text.starts_with("Near Points (m):\n"));
        assert!(text.contains("\nFar Points (m):\n"));
        assert!(text.contains("Distance (m)"));
        assert!(text.contains("Aperture (f)"));
    }

    #[test]
    fn csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cheatsheet.csv");
        cheatsheet().to_csv(&path, Rounding::Decimals(2)).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "distance_m,aperture,hyperfocal_m,near_point_m,far_point_m,dof_m,status"
        );
        assert_eq!(lines.len(), 1 + DISTANCES.len() * APERTURES.len());
        assert!(lines.contains(&"2,8,6.71,1.55,2.83,1.28,ok"));
        assert!(lines.contains(&"2,28,1.94,1.00,inf,inf,ok"));
    }
}

use std::path::{Path, PathBuf};

use super::{markdown_table, write_staged, ReportError};
use crate::table::{DofTable, Quantity, Rounding};

/// Markdown cheatsheet: a title, the lens description, the near and far point tables
/// and a reference to the plot image
pub struct MarkdownReport<'a> {
    table: &'a DofTable,
    image: PathBuf,
    rounding: Rounding,
    title: String,
}
impl<'a> MarkdownReport<'a> {
    pub fn new<P: AsRef<Path>>(table: &'a DofTable, image: P) -> Self {
        Self {
            table,
            image: image.as_ref().to_path_buf(),
            rounding: Rounding::default(),
            title: String::from("Depth of Field Cheatsheet"),
        }
    }
    pub fn rounding(self, rounding: Rounding) -> Self {
        Self { rounding, ..self }
    }
    pub fn title<S: Into<String>>(self, title: S) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }
    /// Lens, aperture and distance range line
    pub fn description(&self) -> String {
        let range = |values: &[f64]| {
            (
                values.iter().cloned().fold(f64::INFINITY, f64::min),
                values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            )
        };
        let optics = self.table.optics();
        let (n_min, n_max) = range(self.table.apertures());
        let (d_min, d_max) = range(self.table.distances());
        format!(
            "Lens: {}mm, CoC: {}mm, apertures f/{}–f/{}, distances {}–{} m",
            optics.focal_length_mm(),
            optics.circle_of_confusion_mm(),
            n_min,
            n_max,
            d_min,
            d_max
        )
    }
    /// Renders the report, `image` is written as given
    pub fn render(&self, image: &Path) -> String {
        let sections: Vec<_> = [Quantity::NearPoint, Quantity::FarPoint]
            .into_iter()
            .map(|quantity| {
                format!(
                    "## {}\n\n{}",
                    quantity.title(),
                    markdown_table(
                        "Distance (m)",
                        "f/",
                        &self.table.formatted(quantity, self.rounding)
                    )
                )
            })
            .collect();
        format!(
            "# {}\n\n{}\n\n{}\n\n![Near and Far Points]({})\n",
            self.title,
            self.description(),
            sections.join("\n\n"),
            image.display()
        )
    }
    /// Writes the report to `path`
    ///
    /// The image is referenced relative to the report when both sit in the same folder.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, ReportError> {
        let path = path.as_ref();
        let image = match (self.image.parent(), path.parent(), self.image.file_name()) {
            (Some(image_dir), Some(report_dir), Some(name)) if image_dir == report_dir => {
                PathBuf::from(name)
            }
            _ => self.image.clone(),
        };
        let path = write_staged(path, &self.render(&image))?;
        log::info!("markdown report written to {:?}", path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        optics::OpticalConfig, APERTURES, CIRCLE_OF_CONFUSION_MM, DISTANCES, FOCAL_LENGTH_MM,
    };

    fn cheatsheet() -> DofTable {
        let optics = OpticalConfig::new(FOCAL_LENGTH_MM, CIRCLE_OF_CONFUSION_MM).unwrap();
        DofTable::compute(optics, &APERTURES, &DISTANCES).unwrap()
    }

    /// Line kinds in order of appearance: each run of table rows is collapsed to `T`,
    /// images to `I`
    fn blocks(md: &str) -> String {
        let mut kinds = String::new();
        let mut in_table = false;
        for line in md.lines() {
            let is_table = line.starts_with('|');
            if is_table && !in_table {
                kinds.push('T');
            } else if line.starts_with("![") {
                kinds.push('I');
            }
            in_table = is_table;
        }
        kinds
    }

    #[test]
    fn description_line() {
        let table = cheatsheet();
        let report = MarkdownReport::new(&table, "cheatsheet.png");
        assert_eq!(
            report.description(),
            "Lens: 40mm, CoC: 0.03mm, apertures f/1.7–f/28, distances 0.5–20 m"
        );
    }

    #[test]
    fn two_tables_then_image() {
        let table = cheatsheet();
        let md = MarkdownReport::new(&table, "cheatsheet.png")
            .rounding(Rounding::Decimals(2))
            .render(Path::new("cheatsheet.png"));
        assert!(md.starts_with("# Depth of Field Cheatsheet\n"));
        assert_eq!(blocks(&md), "TTI");
        let near = md.find("## Near Points (m)").unwrap();
        let far = md.find("## Far Points (m)").unwrap();
        let image = md.find("![Near and Far Points](cheatsheet.png)").unwrap();
        assert!(near < far && far < image);
        assert!(md.contains("| 2 | "));
        assert!(md.contains(" 1.55 |"));
    }

    #[test]
    fn written_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cheatsheet.md");
        let table = cheatsheet();
        MarkdownReport::new(&table, dir.path().join("cheatsheet.png"))
            .title("40mm lens")
            .write(&path)
            .unwrap();
        let md = fs::read_to_string(&path).unwrap();
        assert!(md.starts_with("# 40mm lens\n"));
        assert!(md.contains("![Near and Far Points](cheatsheet.png)"));
        assert_eq!(blocks(&md), "TTI");
    }
}

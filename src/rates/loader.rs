//! Workbook loader for charge-off and prepayment curves
//!
//! A workbook is a directory holding one CSV export per sheet
//! (`<sheet name>.csv`). Each sheet has a header row, a period column first,
//! and one named rate curve per remaining column.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::table::{RateKind, RateTable};
use crate::error::{LoanError, LoanResult};

/// One sheet of the workbook: every curve keyed by its column header
#[derive(Debug, Clone)]
pub struct RateSheet {
    name: String,
    curves: Vec<(String, RateTable)>,
}

impl RateSheet {
    /// Parse a sheet from CSV text
    pub fn from_reader<R: Read>(name: &str, kind: RateKind, reader: R) -> LoanResult<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers()?.clone();

        // Blank headers are spacer columns left over from the spreadsheet
        let columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, h)| !h.trim().is_empty())
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        if columns.is_empty() {
            return Err(LoanError::input(name, "sheet has no rate columns"));
        }

        let mut entries: Vec<Vec<(u32, f64)>> = vec![Vec::new(); columns.len()];

        for result in reader.records() {
            let record = result?;
            let period_cell = record.get(0).unwrap_or("").trim();
            if period_cell.is_empty() {
                continue;
            }
            let period: u32 = period_cell.parse().map_err(|_| {
                LoanError::input(name, format!("bad period '{}'", period_cell))
            })?;

            for (slot, (col, header)) in columns.iter().enumerate() {
                let cell = record.get(*col).unwrap_or("").trim();
                if cell.is_empty() {
                    continue;
                }
                let rate = parse_rate(cell).ok_or_else(|| {
                    LoanError::input(
                        name,
                        format!("bad rate '{}' in column '{}' at period {}", cell, header, period),
                    )
                })?;
                entries[slot].push((period, rate));
            }
        }

        let curves = columns
            .into_iter()
            .zip(entries)
            .map(|((_, header), rates)| RateTable::new(kind, rates).map(|table| (header, table)))
            .collect::<LoanResult<Vec<_>>>()?;

        debug!("Sheet '{}' has {} curves", name, curves.len());

        Ok(Self {
            name: name.to_string(),
            curves,
        })
    }

    /// Load a sheet from a CSV file
    pub fn load(path: &Path, kind: RateKind) -> LoanResult<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path)?;
        Self::from_reader(&name, kind, file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.curves.iter().map(|(k, _)| k.as_str())
    }

    /// Curve for the given column header
    pub fn curve(&self, key: &str) -> LoanResult<&RateTable> {
        self.curves
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, table)| table)
            .ok_or_else(|| LoanError::CurveNotFound {
                sheet: self.name.clone(),
                key: key.to_string(),
            })
    }

    /// Curve for the given key
    ///
    /// An exact header match wins. A sheet holding a single curve answers any
    /// other key too, with a warning naming the curve substituted.
    pub fn resolve(&self, key: &str) -> LoanResult<&RateTable> {
        match (self.curve(key), self.curves.as_slice()) {
            (Ok(table), _) => Ok(table),
            (Err(_), [(only_key, only)]) => {
                warn!(
                    "Sheet '{}' has no curve '{}', using its only curve '{}'",
                    self.name, key, only_key
                );
                Ok(only)
            }
            (Err(err), _) => Err(err),
        }
    }
}

/// Accepts plain fractions ("0.012") and percentages ("1.2%")
fn parse_rate(cell: &str) -> Option<f64> {
    match cell.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok().map(|v| v / 100.0),
        None => cell.parse().ok(),
    }
}

/// A directory of sheet exports
#[derive(Debug, Clone)]
pub struct Workbook {
    root: PathBuf,
}

impl Workbook {
    pub fn open<P: AsRef<Path>>(root: P) -> LoanResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(LoanError::input(
                root.display().to_string(),
                "workbook directory not found",
            ));
        }
        Ok(Self { root })
    }

    pub fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.root.join(format!("{}.csv", sheet))
    }

    pub fn sheet(&self, sheet: &str, kind: RateKind) -> LoanResult<RateSheet> {
        let path = self.sheet_path(sheet);
        if !path.is_file() {
            return Err(LoanError::input(
                self.root.display().to_string(),
                format!("sheet '{}' not found", sheet),
            ));
        }
        let loaded = RateSheet::load(&path, kind)?;
        info!(
            "Loaded {} sheet '{}' ({} curves)",
            kind.as_str(),
            sheet,
            loaded.curves.len()
        );
        Ok(loaded)
    }
}

/// Both rate sheets a run needs, loaded once
#[derive(Debug, Clone)]
pub struct RateSheets {
    pub charge_off: RateSheet,
    pub prepay: RateSheet,
}

impl RateSheets {
    pub fn load(workbook: &Workbook, charge_off_sheet: &str, prepay_sheet: &str) -> LoanResult<Self> {
        Ok(Self {
            charge_off: workbook.sheet(charge_off_sheet, RateKind::ChargeOff)?,
            prepay: workbook.sheet(prepay_sheet, RateKind::Prepay)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARGE_OFF: &str = "\
Period,36-A1,36-C4,,60-C4
1,0,0.001,,0.002
2,0.0005,0.004,,0.005
3,0.001,1.5%,,
";

    #[test]
    fn test_sheet_parses_curves() {
        let sheet =
            RateSheet::from_reader("charge_off", RateKind::ChargeOff, CHARGE_OFF.as_bytes())
                .unwrap();
        assert_eq!(sheet.keys().collect::<Vec<_>>(), vec!["36-A1", "36-C4", "60-C4"]);

        let c4 = sheet.curve("36-C4").unwrap();
        assert_eq!(c4.rate(2), 0.004);
        assert!((c4.rate(3) - 0.015).abs() < 1e-12);

        // Blank cells are absent entries
        let c4_60 = sheet.curve("60-C4").unwrap();
        assert_eq!(c4_60.len(), 2);
        assert_eq!(c4_60.rate(3), 0.0);
    }

    #[test]
    fn test_missing_curve() {
        let sheet =
            RateSheet::from_reader("charge_off", RateKind::ChargeOff, CHARGE_OFF.as_bytes())
                .unwrap();
        assert!(matches!(
            sheet.curve("36-Z9"),
            Err(LoanError::CurveNotFound { .. })
        ));
        assert!(sheet.resolve("36-Z9").is_err());
    }

    #[test]
    fn test_single_curve_resolves_any_key() {
        let csv = "Period,36\n1,0.01\n2,0.02\n";
        let sheet = RateSheet::from_reader("prepay", RateKind::Prepay, csv.as_bytes()).unwrap();
        assert_eq!(sheet.resolve("36").unwrap().rate(2), 0.02);
        assert_eq!(sheet.resolve("60").unwrap().rate(2), 0.02);
        assert!(sheet.curve("60").is_err());
    }

    #[test]
    fn test_invalid_rate_in_sheet() {
        let csv = "Period,36\n1,0.01\n2,1.2\n";
        assert!(matches!(
            RateSheet::from_reader("prepay", RateKind::Prepay, csv.as_bytes()),
            Err(LoanError::InvalidRate { period: 2, .. })
        ));
    }

    #[test]
    fn test_bad_cell_rejected() {
        let csv = "Period,36\n1,abc\n";
        assert!(matches!(
            RateSheet::from_reader("prepay", RateKind::Prepay, csv.as_bytes()),
            Err(LoanError::Input { .. })
        ));
    }

    #[test]
    fn test_load_sample_workbook() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/rates");
        let workbook = Workbook::open(root).unwrap();
        let sheets = RateSheets::load(&workbook, "charge_off", "prepay").unwrap();
        assert!(sheets.charge_off.curve("36-C4").is_ok());
        assert!(sheets.prepay.curve("36").is_ok());
        assert!(workbook.sheet("missing", RateKind::Prepay).is_err());
    }
}

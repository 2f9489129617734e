//! YAML run configuration
//!
//! ```yaml
//! input:
//!   filename: rates            # workbook directory, relative to this file
//!   default_sheetname: charge_off
//!   prepay_sheetname: prepay
//! solver:
//!   guess: 0.1
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::amortization::IrrSolver;
use crate::error::{LoanError, LoanResult};
use crate::rates::{RateSheets, Workbook};

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "data/config.yaml";

/// Where the rate workbook lives and which sheets hold which curves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Workbook directory
    pub filename: PathBuf,

    /// Sheet holding the charge-off curves
    #[serde(rename = "default_sheetname", alias = "charge_off_sheetname")]
    pub charge_off_sheet: String,

    /// Sheet holding the prepayment curves
    #[serde(rename = "prepay_sheetname")]
    pub prepay_sheet: String,
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub input: InputConfig,

    #[serde(default)]
    pub solver: IrrSolver,
}

impl Config {
    /// Parse a configuration from YAML text
    pub fn from_yaml(text: &str) -> LoanResult<Self> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; a relative workbook path is taken
    /// relative to the file's directory
    pub fn load<P: AsRef<Path>>(path: P) -> LoanResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&text)?;

        if config.input.filename.is_relative() {
            if let Some(dir) = path.parent() {
                config.input.filename = dir.join(&config.input.filename);
            }
        }

        Ok(config)
    }

    fn validate(&self) -> LoanResult<()> {
        if self.input.filename.as_os_str().is_empty() {
            return Err(LoanError::Config("input.filename is empty".into()));
        }
        if self.input.charge_off_sheet.trim().is_empty() {
            return Err(LoanError::Config("input.default_sheetname is empty".into()));
        }
        if self.input.prepay_sheet.trim().is_empty() {
            return Err(LoanError::Config("input.prepay_sheetname is empty".into()));
        }
        if self.solver.tolerance.is_nan() || self.solver.tolerance <= 0.0 {
            return Err(LoanError::Config(format!(
                "solver.tolerance must be positive, got {}",
                self.solver.tolerance
            )));
        }
        if self.solver.max_iterations == 0 {
            return Err(LoanError::Config("solver.max_iterations must be positive".into()));
        }
        Ok(())
    }

    /// Open the workbook and read both rate sheets
    pub fn load_rate_sheets(&self) -> LoanResult<RateSheets> {
        let workbook = Workbook::open(&self.input.filename)?;
        RateSheets::load(
            &workbook,
            &self.input.charge_off_sheet,
            &self.input.prepay_sheet,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = "\
input:
  filename: rates
  default_sheetname: Charge Off
  prepay_sheetname: Prepay
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.input.filename, PathBuf::from("rates"));
        assert_eq!(config.input.charge_off_sheet, "Charge Off");
        assert_eq!(config.input.prepay_sheet, "Prepay");
        assert_eq!(config.solver, IrrSolver::default());
    }

    #[test]
    fn test_partial_solver_section() {
        let yaml = "\
input:
  filename: rates
  charge_off_sheetname: co
  prepay_sheetname: pp
solver:
  guess: 0.01
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.input.charge_off_sheet, "co");
        assert_eq!(config.solver.guess, 0.01);
        assert_eq!(config.solver.max_iterations, IrrSolver::default().max_iterations);
    }

    #[test]
    fn test_invalid_config() {
        let missing_sheet = "input:\n  filename: rates\n  prepay_sheetname: pp\n";
        assert!(matches!(
            Config::from_yaml(missing_sheet),
            Err(LoanError::Yaml(_))
        ));

        let bad_solver = "\
input:
  filename: rates
  default_sheetname: co
  prepay_sheetname: pp
solver:
  tolerance: 0
";
        assert!(matches!(Config::from_yaml(bad_solver), Err(LoanError::Config(_))));
    }

    #[test]
    fn test_load_sample_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = Config::load(&path).unwrap();
        assert!(config.input.filename.is_absolute());

        let sheets = config.load_rate_sheets().unwrap();
        assert!(sheets.charge_off.keys().count() > 1);
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options that control how a source is profiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    /// Number of equal-width sub-intervals for continuous columns.
    pub number_of_intervals: usize,
    /// Distinct/non-null ratio below which a column is categorical.
    pub categorical_threshold: f64,
    /// Match ratio a semantic reference pattern must exceed.
    pub semantic_threshold: f64,
    /// Optional allow-list of columns to profile.
    pub columns_to_include: Option<Vec<String>>,
    /// Optional cap on the number of sampled rows.
    #[serde(alias = "number_of_rows_from_which_to_create_pattern")]
    pub sample_rows: Option<usize>,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            number_of_intervals: 5,
            categorical_threshold: 0.2,
            semantic_threshold: 0.8,
            columns_to_include: None,
            sample_rows: None,
        }
    }
}

impl ProfileOptions {
    pub fn validate(&self) -> Result<()> {
        if self.number_of_intervals == 0 {
            return Err(Error::InvalidConfig(
                "number_of_intervals must be >= 1".to_string(),
            ));
        }
        if !(self.categorical_threshold > 0.0 && self.categorical_threshold <= 1.0) {
            return Err(Error::InvalidConfig(
                "categorical_threshold must be in (0, 1]".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.semantic_threshold) {
            return Err(Error::InvalidConfig(
                "semantic_threshold must be in [0, 1)".to_string(),
            ));
        }
        if self.sample_rows == Some(0) {
            return Err(Error::InvalidConfig("sample_rows must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Options that control synthetic row generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Rows requested from every generator per flush.
    pub batch_size: usize,
    /// Seed for the per-column random streams; random when absent.
    pub seed: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            seed: None,
        }
    }
}

impl GenerateOptions {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ProfileOptions::default();
        assert_eq!(options.number_of_intervals, 5);
        assert_eq!(options.categorical_threshold, 0.2);
        assert!(options.validate().is_ok());
        assert_eq!(GenerateOptions::default().batch_size, 100);
        assert!(GenerateOptions::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let options = ProfileOptions {
            categorical_threshold: 0.0,
            ..ProfileOptions::default()
        };
        assert!(matches!(options.validate(), Err(Error::InvalidConfig(_))));

        let options = ProfileOptions {
            number_of_intervals: 0,
            ..ProfileOptions::default()
        };
        assert!(options.validate().is_err());

        let options = GenerateOptions {
            batch_size: 0,
            seed: None,
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn accepts_long_sample_cap_name() {
        let options: ProfileOptions =
            serde_json::from_str(r#"{"number_of_rows_from_which_to_create_pattern": 500}"#)
                .unwrap();
        assert_eq!(options.sample_rows, Some(500));
        assert_eq!(options.number_of_intervals, 5);
    }
}

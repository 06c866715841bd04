//! Run settings, read from an optional TOML file.
//!
//! Every key has a default, so an empty file (or no file) is a valid
//! configuration.
//!
//! ```toml
//! [pricing]
//! region = "Lusaka"
//! tier = "Avg"
//! normalization = "loose"
//!
//! [fields]
//! amount = "Amount (Qty*Rate)"
//!
//! [inputs]
//! prices = ["prices/"]
//! recipes = "recipes.csv"
//!
//! [bill]
//! discount = 0.0
//! contingency = 0.05
//! ```

use crate::error::LoadError;
use crate::model::{KeyNormalization, PriceColumn, Tier, NATIONAL_REGION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub pricing: PricingSettings,
    pub fields: FieldSettings,
    pub inputs: InputSettings,
    pub bill: BillSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PricingSettings {
    pub region: String,
    pub tier: Tier,
    pub normalization: KeyNormalization,
    pub currency: String,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            region: NATIONAL_REGION.to_string(),
            tier: Tier::Avg,
            normalization: KeyNormalization::Loose,
            currency: "ZMW".to_string(),
        }
    }
}

impl PricingSettings {
    #[must_use]
    pub fn column(&self) -> PriceColumn {
        PriceColumn::new(self.region.clone(), self.tier)
    }
}

/// Host field names read and written by the estimator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldSettings {
    pub cost: String,
    pub amount: String,
    pub type_comments: String,
    pub function: String,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            cost: "Cost".to_string(),
            amount: "Amount (Qty*Rate)".to_string(),
            type_comments: "Type Comments".to_string(),
            function: "Function".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputSettings {
    /// Price CSV files or directories of them, loaded in order.
    pub prices: Vec<PathBuf>,
    pub recipes: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BillSettings {
    /// Fraction taken off Sub total 1.
    pub discount: f64,
    /// Fraction of Sub total 2.
    pub contingency: f64,
}

impl Default for BillSettings {
    fn default() -> Self {
        Self {
            discount: 0.0,
            contingency: 0.05,
        }
    }
}

impl Settings {
    /// Reads settings from `path`. Relative input paths are resolved
    /// against the file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = crate::parser::read_clean(path)?;
        let mut settings: Self = toml::from_str(&content).map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            settings.inputs.resolve_against(base);
        }

        tracing::info!(
            file = %path.display(),
            column = %settings.pricing.column(),
            "loaded settings"
        );
        Ok(settings)
    }
}

impl InputSettings {
    fn resolve_against(&mut self, base: &Path) {
        let resolve = |p: &PathBuf| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.clone()
            }
        };
        self.prices = self.prices.iter().map(resolve).collect();
        self.recipes = self.recipes.as_ref().map(resolve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fields.amount, "Amount (Qty*Rate)");
        assert_eq!(settings.pricing.column().regional_header(), "National_Avg_UnitCost");
        assert!((settings.bill.contingency - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings: Settings = toml::from_str(
            "[pricing]\nregion = \"Lusaka\"\ntier = \"Max\"\nnormalization = \"strict\"\n\n[fields]\namount = \"Line Total\"\n",
        )
        .unwrap();

        assert_eq!(settings.pricing.region, "Lusaka");
        assert_eq!(settings.pricing.tier, Tier::Max);
        assert_eq!(settings.pricing.normalization, KeyNormalization::Strict);
        assert_eq!(settings.pricing.currency, "ZMW");
        assert_eq!(settings.fields.amount, "Line Total");
        assert_eq!(settings.fields.cost, "Cost");
    }

    #[test]
    fn load_resolves_relative_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boq.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[inputs]\nprices = [\"prices\"]\nrecipes = \"recipes.csv\"").unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.inputs.prices, vec![dir.path().join("prices")]);
        assert_eq!(settings.inputs.recipes, Some(dir.path().join("recipes.csv")));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[pricing\nregion=").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(LoadError::Config { .. })
        ));
    }
}

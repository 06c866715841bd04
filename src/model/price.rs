use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Cost-estimation confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Min,
    Avg,
    Max,
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "avg" | "average" => Ok(Self::Avg),
            "max" => Ok(Self::Max),
            other => Err(format!("unknown cost tier '{other}' (expected Min, Avg or Max)")),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Min => "Min",
            Self::Avg => "Avg",
            Self::Max => "Max",
        })
    }
}

pub const NATIONAL_REGION: &str = "National";

/// Which price column of a wide unit-cost table supplies prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceColumn {
    pub region: String,
    pub tier: Tier,
}

impl PriceColumn {
    #[must_use]
    pub fn new(region: impl Into<String>, tier: Tier) -> Self {
        Self {
            region: region.into(),
            tier,
        }
    }

    /// `"{Region}_{Tier}_UnitCost"`
    #[must_use]
    pub fn regional_header(&self) -> String {
        format!("{}_{}_UnitCost", self.region, self.tier)
    }

    /// `"National_{Tier}_UnitCost"`
    #[must_use]
    pub fn national_header(&self) -> String {
        format!("{NATIONAL_REGION}_{}_UnitCost", self.tier)
    }

    #[must_use]
    pub fn is_national(&self) -> bool {
        self.region.eq_ignore_ascii_case(NATIONAL_REGION)
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.region, self.tier)
    }
}

/// How strictly item and type names are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyNormalization {
    /// Case-folded and trimmed.
    #[default]
    Loose,
    /// Loose, and spaces, hyphens and underscores removed.
    Strict,
}

impl KeyNormalization {
    #[must_use]
    pub fn normalize(self, name: &str) -> String {
        let folded = name.trim().to_lowercase();
        match self {
            Self::Loose => folded,
            Self::Strict => folded
                .chars()
                .filter(|c| !matches!(c, ' ' | '-' | '_'))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceSource {
    /// The selected region's column.
    Regional,
    /// The `National_{Tier}` column, used because the regional value was
    /// blank or not positive.
    NationalFallback,
    /// A legacy single `UnitCost` column.
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    pub item: String,
    pub price: f64,
    pub source: PriceSource,
    pub uom: Option<String>,
}

/// Anything that can resolve a component name to a unit price.
pub trait PriceLookup {
    fn lookup(&self, name: &str) -> Option<&PriceEntry>;

    /// Files the prices were read from, in load order.
    fn sources(&self) -> &[PathBuf] {
        &[]
    }
}

/// Unit prices keyed by normalized item name. Later inserts win.
#[derive(Debug, Clone)]
pub struct UnitPriceTable {
    pub column: PriceColumn,
    pub normalization: KeyNormalization,
    pub sources: Vec<PathBuf>,
    entries: HashMap<String, PriceEntry>,
}

impl UnitPriceTable {
    #[must_use]
    pub fn new(column: PriceColumn, normalization: KeyNormalization) -> Self {
        Self {
            column,
            normalization,
            sources: Vec::new(),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, entry: PriceEntry) {
        let key = self.normalization.normalize(&entry.item);
        self.entries.insert(key, entry);
    }

    /// Shorthand for a regional price without unit metadata.
    pub fn set_price(&mut self, item: &str, price: f64) {
        self.insert(PriceEntry {
            item: item.trim().to_string(),
            price,
            source: PriceSource::Regional,
            uom: None,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PriceEntry> {
        self.entries.values()
    }
}

impl PriceLookup for UnitPriceTable {
    fn lookup(&self, name: &str) -> Option<&PriceEntry> {
        self.entries.get(&self.normalization.normalize(name))
    }

    fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

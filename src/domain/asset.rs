//! Asset classes, symbol metadata and the tracked-symbol catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Forex,
    Commodity,
    Bond,
    Crypto,
    PreciousMetal,
    Energy,
    AiMaterial,
}

impl AssetClass {
    pub const ALL: [AssetClass; 8] = [
        AssetClass::Equity,
        AssetClass::Forex,
        AssetClass::Commodity,
        AssetClass::Bond,
        AssetClass::Crypto,
        AssetClass::PreciousMetal,
        AssetClass::Energy,
        AssetClass::AiMaterial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::Forex => "forex",
            AssetClass::Commodity => "commodity",
            AssetClass::Bond => "bond",
            AssetClass::Crypto => "crypto",
            AssetClass::PreciousMetal => "precious_metal",
            AssetClass::Energy => "energy",
            AssetClass::AiMaterial => "ai_material",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        AssetClass::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("unknown asset class: {}", s.trim()))
    }
}

/// Descriptive data for one (symbol, asset class) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolMetadata {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub name: String,
    pub unit: Option<String>,
}

impl SymbolMetadata {
    /// Metadata with the symbol doubling as its display name.
    pub fn bare(symbol: &str, asset_class: AssetClass) -> Self {
        Self {
            symbol: symbol.to_string(),
            asset_class,
            name: symbol.to_string(),
            unit: None,
        }
    }
}

struct CatalogEntry {
    symbol: &'static str,
    asset_class: AssetClass,
    name: &'static str,
    unit: Option<&'static str>,
}

const fn entry(
    symbol: &'static str,
    asset_class: AssetClass,
    name: &'static str,
    unit: Option<&'static str>,
) -> CatalogEntry {
    CatalogEntry {
        symbol,
        asset_class,
        name,
        unit,
    }
}

// Macro universe: major indices, FX crosses, commodities and yields, plus the
// metals/energy/AI-materials basket.
const CATALOG: &[CatalogEntry] = &[
    entry("^GSPC", AssetClass::Equity, "S&P 500", None),
    entry("^GDAXI", AssetClass::Equity, "DAX", None),
    entry("^N225", AssetClass::Equity, "Nikkei 225", None),
    entry("^FTSE", AssetClass::Equity, "FTSE 100", None),
    entry("^FCHI", AssetClass::Equity, "CAC 40", None),
    entry("^HSI", AssetClass::Equity, "Hang Seng", None),
    entry("^AXJO", AssetClass::Equity, "ASX 200", None),
    entry("^BVSP", AssetClass::Equity, "Bovespa", None),
    entry("^TWII", AssetClass::Equity, "Taiwan Weighted", None),
    entry("^KS11", AssetClass::Equity, "Korea Composite", None),
    entry("EURUSD=X", AssetClass::Forex, "EUR/USD", None),
    entry("GBPUSD=X", AssetClass::Forex, "GBP/USD", None),
    entry("USDJPY=X", AssetClass::Forex, "USD/JPY", None),
    entry("AUDUSD=X", AssetClass::Forex, "AUD/USD", None),
    entry("USDCAD=X", AssetClass::Forex, "USD/CAD", None),
    entry("USDCNH=X", AssetClass::Forex, "USD/CNH", None),
    entry("GC=F", AssetClass::Commodity, "Gold", None),
    entry("CL=F", AssetClass::Commodity, "Crude Oil", None),
    entry("NG=F", AssetClass::Commodity, "Natural Gas", None),
    entry("ZC=F", AssetClass::Commodity, "Corn", None),
    entry("ZW=F", AssetClass::Commodity, "Wheat", None),
    entry("HG=F", AssetClass::Commodity, "Copper", None),
    entry("^TNX", AssetClass::Bond, "US 10-Year Yield", None),
    entry("^TYX", AssetClass::Bond, "US 30-Year Yield", None),
    entry("^FVX", AssetClass::Bond, "US 5-Year Yield", None),
    entry("GC=F", AssetClass::PreciousMetal, "Gold Futures", Some("oz")),
    entry("SI=F", AssetClass::PreciousMetal, "Silver Futures", Some("oz")),
    entry("HG=F", AssetClass::PreciousMetal, "Copper Futures", Some("lb")),
    entry("PL=F", AssetClass::PreciousMetal, "Platinum Futures", Some("oz")),
    entry("PA=F", AssetClass::PreciousMetal, "Palladium Futures", Some("oz")),
    entry("LIT", AssetClass::AiMaterial, "Lithium ETF", Some("per_share")),
    entry("SMH", AssetClass::AiMaterial, "Semiconductor ETF", Some("per_share")),
    entry("REMX", AssetClass::AiMaterial, "Rare Earth ETF", Some("per_share")),
    entry("ALU=F", AssetClass::AiMaterial, "Aluminum Futures", Some("ton")),
    entry("NI=F", AssetClass::AiMaterial, "Nickel Futures", Some("ton")),
    entry("CL=F", AssetClass::Energy, "Crude Oil Futures", Some("barrel")),
    entry("NG=F", AssetClass::Energy, "Natural Gas Futures", Some("mmbtu")),
    entry("URA", AssetClass::Energy, "Uranium ETF", Some("per_share")),
];

/// The default tracked universe.
pub fn tracked_catalog() -> Vec<SymbolMetadata> {
    CATALOG
        .iter()
        .map(|e| SymbolMetadata {
            symbol: e.symbol.to_string(),
            asset_class: e.asset_class,
            name: e.name.to_string(),
            unit: e.unit.map(str::to_string),
        })
        .collect()
}

/// Catalog entry for `(symbol, asset_class)`, falling back to a bare entry.
pub fn lookup(symbol: &str, asset_class: AssetClass) -> SymbolMetadata {
    tracked_catalog()
        .into_iter()
        .find(|m| m.symbol == symbol && m.asset_class == asset_class)
        .unwrap_or_else(|| SymbolMetadata::bare(symbol, asset_class))
}

/// The first catalog class listed for `symbol`, if it is tracked at all.
pub fn default_class(symbol: &str) -> Option<AssetClass> {
    CATALOG
        .iter()
        .find(|e| e.symbol == symbol)
        .map(|e| e.asset_class)
}

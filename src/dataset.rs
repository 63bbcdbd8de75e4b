//! Dataset specification and validation
//!
//! A [`DatasetSpec`] names one archive family on Binance Vision:
//! `ASSET_CLASS / DATA_TYPE [/ FREQUENCY]`. Invalid combinations are
//! rejected at construction so every later stage can treat the spec as total.

use crate::Frequency;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Spot market
    #[serde(rename = "spot")]
    Spot,
    /// USD(T)-margined futures
    #[serde(rename = "um")]
    UsdMargined,
    /// Coin-margined futures
    #[serde(rename = "cm")]
    CoinMargined,
}

impl AssetClass {
    /// Path token ("spot", "um", "cm")
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Spot => "spot",
            AssetClass::UsdMargined => "um",
            AssetClass::CoinMargined => "cm",
        }
    }

    /// Whether archives live under the `futures/` prefix
    pub fn is_futures(&self) -> bool {
        !matches!(self, AssetClass::Spot)
    }

    /// Data types published for this asset class
    pub fn data_types(&self) -> &'static [DataType] {
        match self {
            AssetClass::Spot => &[DataType::AggTrades, DataType::Klines, DataType::Trades],
            AssetClass::CoinMargined => &[
                DataType::AggTrades,
                DataType::Klines,
                DataType::Trades,
                DataType::IndexPriceKlines,
                DataType::MarkPriceKlines,
                DataType::PremiumIndexKlines,
            ],
            AssetClass::UsdMargined => &[
                DataType::AggTrades,
                DataType::Klines,
                DataType::Trades,
                DataType::IndexPriceKlines,
                DataType::MarkPriceKlines,
                DataType::PremiumIndexKlines,
                DataType::Metrics,
            ],
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spot" => Ok(AssetClass::Spot),
            "um" => Ok(AssetClass::UsdMargined),
            "cm" => Ok(AssetClass::CoinMargined),
            _ => Err(DatasetError::UnknownAssetClass(s.to_string())),
        }
    }
}

/// Kind of recorded market data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataType {
    /// Aggregated trades
    AggTrades,
    /// OHLCV bars
    Klines,
    /// Individual trade prints
    Trades,
    /// Index price bars
    IndexPriceKlines,
    /// Mark price bars
    MarkPriceKlines,
    /// Premium index bars
    PremiumIndexKlines,
    /// Computed futures metrics (daily archives only)
    Metrics,
}

impl DataType {
    /// Path token as published on Binance Vision
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::AggTrades => "aggTrades",
            DataType::Klines => "klines",
            DataType::Trades => "trades",
            DataType::IndexPriceKlines => "indexPriceKlines",
            DataType::MarkPriceKlines => "markPriceKlines",
            DataType::PremiumIndexKlines => "premiumIndexKlines",
            DataType::Metrics => "metrics",
        }
    }

    /// Bar types are split by frequency
    pub fn requires_frequency(&self) -> bool {
        matches!(
            self,
            DataType::Klines
                | DataType::IndexPriceKlines
                | DataType::MarkPriceKlines
                | DataType::PremiumIndexKlines
        )
    }

    /// Trade-level archives are large, so they are fetched with low parallelism
    pub fn is_bulk(&self) -> bool {
        matches!(self, DataType::Trades | DataType::AggTrades)
    }

    /// `metrics` is only published as daily archives
    pub fn has_monthly_archives(&self) -> bool {
        !matches!(self, DataType::Metrics)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aggTrades" => Ok(DataType::AggTrades),
            "klines" => Ok(DataType::Klines),
            "trades" => Ok(DataType::Trades),
            "indexPriceKlines" => Ok(DataType::IndexPriceKlines),
            "markPriceKlines" => Ok(DataType::MarkPriceKlines),
            "premiumIndexKlines" => Ok(DataType::PremiumIndexKlines),
            "metrics" => Ok(DataType::Metrics),
            _ => Err(DatasetError::UnknownDataType(s.to_string())),
        }
    }
}

/// Validated description of one archive family
///
/// # Examples
///
/// ```
/// use vision_mirror::dataset::{AssetClass, DataType, DatasetSpec};
/// use vision_mirror::Frequency;
///
/// let spec = DatasetSpec::new(AssetClass::Spot, DataType::Klines, Some(Frequency::OneMinute)).unwrap();
/// assert_eq!(spec.file_tag(), "1m");
///
/// assert!(DatasetSpec::new(AssetClass::Spot, DataType::Metrics, None).is_err());
/// assert!(DatasetSpec::new(AssetClass::Spot, DataType::Klines, None).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetSpec {
    asset_class: AssetClass,
    data_type: DataType,
    frequency: Option<Frequency>,
}

impl DatasetSpec {
    /// Build a spec, rejecting combinations Binance Vision does not publish
    ///
    /// # Errors
    ///
    /// - [`DatasetError::UnsupportedDataType`] if the asset class has no such data type
    /// - [`DatasetError::UnsupportedCombination`] if a bar type has no frequency,
    ///   or a non-bar type was given one
    pub fn new(
        asset_class: AssetClass,
        data_type: DataType,
        frequency: Option<Frequency>,
    ) -> Result<Self, DatasetError> {
        if !asset_class.data_types().contains(&data_type) {
            return Err(DatasetError::UnsupportedDataType {
                asset_class,
                data_type,
            });
        }

        match (data_type.requires_frequency(), frequency) {
            (true, None) => {
                return Err(DatasetError::UnsupportedCombination(format!(
                    "data type {data_type} requires a frequency"
                )))
            }
            (false, Some(freq)) => {
                return Err(DatasetError::UnsupportedCombination(format!(
                    "data type {data_type} does not take a frequency (got {freq})"
                )))
            }
            _ => {}
        }

        Ok(Self {
            asset_class,
            data_type,
            frequency,
        })
    }

    /// Parse the three CLI strings into a spec
    pub fn parse(
        asset_class: &str,
        data_type: &str,
        frequency: Option<&str>,
    ) -> Result<Self, DatasetError> {
        let asset_class = AssetClass::from_str(asset_class)?;
        let data_type = DataType::from_str(data_type)?;
        let frequency = frequency
            .map(|f| Frequency::from_str(f).map_err(|_| DatasetError::UnknownFrequency(f.to_string())))
            .transpose()?;
        Self::new(asset_class, data_type, frequency)
    }

    /// Asset class
    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    /// Data type
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Bar width, for frequency-bearing data types only
    pub fn frequency(&self) -> Option<Frequency> {
        self.frequency
    }

    /// Middle token of archive filenames: the frequency, else the data type
    pub fn file_tag(&self) -> &'static str {
        match self.frequency {
            Some(freq) => freq.as_str(),
            None => self.data_type.as_str(),
        }
    }
}

impl fmt::Display for DatasetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset_class, self.data_type)?;
        if let Some(freq) = self.frequency {
            write!(f, "/{freq}")?;
        }
        Ok(())
    }
}

/// Dataset configuration errors
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Asset class not recognized
    #[error("unknown asset class: {0} (expected spot, um or cm)")]
    UnknownAssetClass(String),

    /// Data type not recognized
    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    /// Frequency not recognized
    #[error("unknown data frequency: {0}")]
    UnknownFrequency(String),

    /// Data type not published for the asset class
    #[error("data type {data_type} is not available for asset class {asset_class}")]
    UnsupportedDataType {
        /// Requested asset class
        asset_class: AssetClass,
        /// Requested data type
        data_type: DataType,
    },

    /// Frequency presence does not match the data type
    #[error("unsupported combination: {0}")]
    UnsupportedCombination(String),
}

//! Binance endpoint configuration
//!
//! Spot, USD-margined and coin-margined markets differ only in where their
//! exchange metadata lives. The archive host is shared.
//!
//! # Endpoints
//!
//! - **spot**: <https://api.binance.com/api/v3/exchangeInfo>
//! - **um**: <https://fapi.binance.com/fapi/v1/exchangeInfo>
//! - **cm**: <https://dapi.binance.com/dapi/v1/exchangeInfo>

use crate::dataset::AssetClass;

/// Archive host serving the listing page
pub const VISION_BASE_URL: &str = "https://data.binance.vision";

/// Root under which every archive path suffix lives
pub const VISION_DATA_URL: &str = "https://data.binance.vision/data";

/// Endpoint configuration for one market
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinanceMarketConfig {
    /// API base URL including version path (e.g., <https://fapi.binance.com/fapi/v1>)
    pub api_base_url: &'static str,

    /// Exchange info endpoint path
    pub exchange_info_endpoint: &'static str,
}

/// Spot market (`/api/v3`)
pub const SPOT_CONFIG: BinanceMarketConfig = BinanceMarketConfig {
    api_base_url: "https://api.binance.com/api/v3",
    exchange_info_endpoint: "/exchangeInfo",
};

/// USD(T)-margined futures (FAPI)
pub const USDT_FUTURES_CONFIG: BinanceMarketConfig = BinanceMarketConfig {
    api_base_url: "https://fapi.binance.com/fapi/v1",
    exchange_info_endpoint: "/exchangeInfo",
};

/// Coin-margined futures (DAPI)
pub const COIN_FUTURES_CONFIG: BinanceMarketConfig = BinanceMarketConfig {
    api_base_url: "https://dapi.binance.com/dapi/v1",
    exchange_info_endpoint: "/exchangeInfo",
};

impl BinanceMarketConfig {
    /// Configuration for `asset_class`
    pub fn for_asset_class(asset_class: AssetClass) -> &'static BinanceMarketConfig {
        match asset_class {
            AssetClass::Spot => &SPOT_CONFIG,
            AssetClass::UsdMargined => &USDT_FUTURES_CONFIG,
            AssetClass::CoinMargined => &COIN_FUTURES_CONFIG,
        }
    }
}

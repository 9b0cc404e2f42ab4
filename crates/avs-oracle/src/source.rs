//! Price sources.
//!
//! The operator picks one source at startup from configuration:
//!
//! - [`AggregatorSource`] when an aggregator contract is configured: base
//!   price from `twapPriceX96(long window)`, drift from pool ticks.
//! - [`PoolSource`] otherwise: base price from the pool's spot price, drift
//!   from the same pool ticks.
//! - [`StaticSource`] serves a fixed observation, for tests.

use std::sync::Arc;

use alloy_primitives::Address;
use avs_chain::{ChainReader, PriceAggregator, UniswapPool};
use avs_types::PriceObservation;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reader::PoolOracle;
use crate::{OracleError, Result};

/// Short and long TWAP windows in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwapWindows {
    pub short_secs: u32,
    pub long_secs: u32,
}

impl TwapWindows {
    /// # Errors
    ///
    /// - [`OracleError::ZeroWindow`] if either window is zero
    pub fn new(short_secs: u32, long_secs: u32) -> Result<Self> {
        if short_secs == 0 || long_secs == 0 {
            return Err(OracleError::ZeroWindow);
        }
        Ok(Self {
            short_secs,
            long_secs,
        })
    }
}

/// Produces the base price and both window ticks for one round.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Read the base price and drift ticks.
    async fn observe(&self) -> Result<PriceObservation>;
}

/// Build the source implied by the configured addresses.
pub fn from_addresses(
    reader: Arc<dyn ChainReader>,
    pool: Address,
    aggregator: Option<Address>,
    windows: TwapWindows,
) -> Box<dyn PriceSource> {
    let oracle = PoolOracle::new(UniswapPool::new(pool, reader.clone()));
    match aggregator {
        Some(address) => Box::new(AggregatorSource::new(
            PriceAggregator::new(address, reader),
            oracle,
            windows,
        )),
        None => Box::new(PoolSource::new(oracle, windows)),
    }
}

async fn window_ticks(oracle: &PoolOracle, windows: TwapWindows) -> Result<(i64, i64)> {
    let short = oracle.twap_tick(windows.short_secs).await?;
    let long = oracle.twap_tick(windows.long_secs).await?;
    Ok((short, long))
}

/// Base price from an on-chain aggregator.
pub struct AggregatorSource {
    aggregator: PriceAggregator,
    oracle: PoolOracle,
    windows: TwapWindows,
}

impl AggregatorSource {
    pub fn new(aggregator: PriceAggregator, oracle: PoolOracle, windows: TwapWindows) -> Self {
        Self {
            aggregator,
            oracle,
            windows,
        }
    }
}

#[async_trait::async_trait]
impl PriceSource for AggregatorSource {
    fn name(&self) -> &'static str {
        "aggregator"
    }

    async fn observe(&self) -> Result<PriceObservation> {
        let base_x96 = self.aggregator.twap_price_x96(self.windows.long_secs).await?;
        let (short_tick, long_tick) = window_ticks(&self.oracle, self.windows).await?;
        debug!(
            aggregator = %self.aggregator.address(),
            %base_x96,
            short_tick,
            long_tick,
            "aggregator observation"
        );
        Ok(PriceObservation::new(base_x96, short_tick, long_tick))
    }
}

/// Base price from the pool's current `slot0`.
pub struct PoolSource {
    oracle: PoolOracle,
    windows: TwapWindows,
}

impl PoolSource {
    pub fn new(oracle: PoolOracle, windows: TwapWindows) -> Self {
        Self { oracle, windows }
    }
}

#[async_trait::async_trait]
impl PriceSource for PoolSource {
    fn name(&self) -> &'static str {
        "pool"
    }

    async fn observe(&self) -> Result<PriceObservation> {
        let base_x96 = self.oracle.spot_price_x96().await?;
        let (short_tick, long_tick) = window_ticks(&self.oracle, self.windows).await?;
        debug!(
            pool = %self.oracle.pool().address(),
            %base_x96,
            short_tick,
            long_tick,
            "pool observation"
        );
        Ok(PriceObservation::new(base_x96, short_tick, long_tick))
    }
}

/// A source that always returns the same observation.
#[derive(Debug, Clone)]
pub struct StaticSource {
    observation: PriceObservation,
}

impl StaticSource {
    pub fn new(observation: PriceObservation) -> Self {
        Self { observation }
    }
}

#[async_trait::async_trait]
impl PriceSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn observe(&self) -> Result<PriceObservation> {
        Ok(self.observation)
    }
}

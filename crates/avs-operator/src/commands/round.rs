//! Round command handlers: run, commit, reveal, predict.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use avs_chain::{AvsManager, ChainReader, ChainWriter, RpcClient};
use avs_db::{RoundStore, SqliteRoundStore, DB_FILE_NAME};
use avs_oracle::PriceSource;
use avs_protocol::{CommittedRound, RoundCoordinator};
use avs_types::{RoundId, RoundRecord};
use tracing::info;

use super::Report;
use crate::config::{OperatorConfig, PRIVATE_KEY_ENV};

/// Unsigned client for the configured endpoint.
pub fn read_client(config: &OperatorConfig) -> anyhow::Result<Arc<RpcClient>> {
    config.validate_reads()?;
    Ok(Arc::new(
        RpcClient::new(&config.chain.rpc_url, config.chain.chain_id)?
            .with_request_timeout(config.request_timeout()),
    ))
}

fn price_source(
    config: &OperatorConfig,
    reader: Arc<dyn ChainReader>,
) -> anyhow::Result<Arc<dyn PriceSource>> {
    let source = avs_oracle::source::from_addresses(
        reader,
        config.pool_address()?,
        config.aggregator_address()?,
        config.windows()?,
    );
    info!(source = source.name(), pool = %config.contracts.pool, "price source selected");
    Ok(Arc::from(source))
}

/// Open (creating if needed) the round database in the data directory.
pub fn open_store(config: &OperatorConfig) -> anyhow::Result<Arc<SqliteRoundStore>> {
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    Ok(Arc::new(SqliteRoundStore::open(&data_dir.join(DB_FILE_NAME))?))
}

/// Wire a coordinator over `chain` and `store` from `config`.
pub fn coordinator<C>(
    config: &OperatorConfig,
    chain: Arc<C>,
    store: Arc<dyn RoundStore>,
) -> anyhow::Result<RoundCoordinator>
where
    C: ChainReader + ChainWriter + 'static,
{
    config.validate()?;
    let source = price_source(config, chain.clone())?;
    let avs = AvsManager::new(config.avs_manager_address()?, chain);
    Ok(RoundCoordinator::new(source, avs, store)
        .with_alpha_bps(config.prediction.alpha_bps)
        .with_reveal_delay(config.reveal_delay()))
}

/// Signing client plus the on-disk store, for the submitting commands.
pub fn connect(config: &OperatorConfig) -> anyhow::Result<RoundCoordinator> {
    config.validate()?;
    let key = std::env::var(PRIVATE_KEY_ENV)
        .with_context(|| format!("{PRIVATE_KEY_ENV} is required to submit transactions"))?;
    let client = RpcClient::new(&config.chain.rpc_url, config.chain.chain_id)?
        .with_request_timeout(config.request_timeout())
        .with_signing_key(&key)?;
    info!(
        operator = ?client.operator(),
        chain_id = client.chain_id(),
        avs_manager = %config.contracts.avs_manager,
        "operator ready"
    );
    coordinator(config, Arc::new(client), open_store(config)?)
}

fn committed_text(out: &mut String, committed: &CommittedRound) -> std::fmt::Result {
    let obs = &committed.prediction.observation;
    writeln!(out, "round {} committed", committed.record.round_id)?;
    writeln!(out, "  base_x96:       {}", obs.base_x96)?;
    writeln!(out, "  ticks:          short={} long={}", obs.short_tick, obs.long_tick)?;
    writeln!(out, "  prediction_x96: {}", committed.record.prediction_x96)?;
    writeln!(out, "  commitment:     {}", committed.commitment)?;
    if let Some(tx) = committed.record.commit_tx {
        writeln!(out, "  commit_tx:      {tx}")?;
    }
    Ok(())
}

fn revealed_text(out: &mut String, record: &RoundRecord) -> std::fmt::Result {
    writeln!(out, "round {} revealed", record.round_id)?;
    if let Some(tx) = record.reveal_tx {
        writeln!(out, "  reveal_tx:      {tx}")?;
    }
    Ok(())
}

/// Predict, commit, wait, reveal.
pub async fn run(coordinator: &RoundCoordinator, round_id: RoundId) -> anyhow::Result<Report> {
    let outcome = coordinator.run(round_id).await?;
    let mut text = String::new();
    committed_text(&mut text, &outcome.committed)?;
    revealed_text(&mut text, &outcome.revealed)?;
    Ok(Report {
        json: serde_json::to_value(&outcome)?,
        text,
    })
}

/// Predict and commit only.
pub async fn commit(coordinator: &RoundCoordinator, round_id: RoundId) -> anyhow::Result<Report> {
    let committed = coordinator.commit(round_id).await?;
    let mut text = String::new();
    committed_text(&mut text, &committed)?;
    Ok(Report {
        json: serde_json::to_value(&committed)?,
        text,
    })
}

/// Reveal a round committed by an earlier invocation.
pub async fn reveal(coordinator: &RoundCoordinator, round_id: RoundId) -> anyhow::Result<Report> {
    let record = coordinator.reveal(round_id).await?;
    let mut text = String::new();
    revealed_text(&mut text, &record)?;
    Ok(Report {
        json: serde_json::to_value(&record)?,
        text,
    })
}

/// Dry run: read prices and predict. No key, no submission, no store.
pub async fn predict(config: &OperatorConfig, reader: Arc<dyn ChainReader>) -> anyhow::Result<Report> {
    config.validate_reads()?;
    let source = price_source(config, reader)?;
    let observation = source.observe().await?;
    let prediction = avs_oracle::predict(&observation, config.prediction.alpha_bps)?;

    let mut text = String::new();
    writeln!(text, "source:         {}", source.name())?;
    writeln!(text, "base_x96:       {}", observation.base_x96)?;
    writeln!(text, "ticks:          short={} long={}", observation.short_tick, observation.long_tick)?;
    writeln!(text, "drift_bps:      {}", prediction.drift_bps)?;
    writeln!(text, "alpha_bps:      {}", prediction.alpha_bps)?;
    write!(text, "prediction_x96: {}", prediction.prediction_x96)?;

    let mut json = serde_json::to_value(prediction)?;
    if let Some(obj) = json.as_object_mut() {
        obj.insert("source".to_string(), source.name().into());
    }
    Ok(Report { json, text })
}

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tokio_stream::{StreamExt, wrappers::LinesStream};

use lifecard_exchange::{
    cli::parse_args,
    clock::{Clock, SystemClock},
    config::Config,
    desk::{ExchangeDesk, ExpirySweeper},
    logging::init_tracing,
    store::{FileKeyValueStore, KeyValueStore, SessionTokens},
    types::MILLIS_PER_HOUR,
    wire::handle_line,
};

const SESSION_TOKEN_ENV: &str = "LIFECARD_SESSION_TOKEN";

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    let config = Config::load(&args.config_path)
        .with_context(|| format!("failed to load config from {}", args.config_path.display()))?;
    if args.check_config {
        eprintln!("config ok: {}", args.config_path.display());
        return Ok(());
    }

    let logging = init_tracing(&config.logging)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache: Arc<dyn KeyValueStore> =
        Arc::new(FileKeyValueStore::new(config.store.path.clone()));
    let purged = cache
        .purge_expired(clock.now_millis())
        .await
        .context("failed to purge expired cache entries")?;

    let session = SessionTokens::new(
        Arc::clone(&cache),
        Some(config.store.session_ttl_hours.saturating_mul(MILLIS_PER_HOUR)),
    );
    if let Ok(token) = std::env::var(SESSION_TOKEN_ENV) {
        session
            .save_token(&token, clock.now_millis())
            .await
            .context("failed to store session token")?;
    }
    let has_session = session
        .load_token(clock.now_millis())
        .await
        .context("failed to read session token")?
        .is_some();
    tracing::info!(
        target: "main",
        run_id = logging.run_id(),
        log_dir = %logging.log_dir().display(),
        store = %config.store.path.display(),
        purged,
        has_session,
        "exchange_desk_starting"
    );

    let (notice_tx, mut notice_rx) = mpsc::channel(config.exchange.notice_queue_capacity.max(1));
    let desk = Arc::new(ExchangeDesk::new(
        config.policy(),
        Arc::clone(&clock),
        Some(notice_tx),
    ));
    let sweeper = ExpirySweeper::spawn(Arc::clone(&desk), config.sweep_interval());

    let cache_ttl_ms = config.store.cache_ttl_secs.saturating_mul(1_000);
    let notice_cache = Arc::clone(&cache);
    let notice_clock = Arc::clone(&clock);
    let notice_task = tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            let key = format!("settlement.last.{}", notice.requester_id);
            let value = match serde_json::to_value(&notice) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(target: "main", error = %err, "settlement_notice_unencodable");
                    continue;
                }
            };
            if let Err(err) = notice_cache
                .put(&key, value, Some(cache_ttl_ms), notice_clock.now_millis())
                .await
            {
                tracing::warn!(target: "main", key = %key, error = %err, "settlement_cache_write_failed");
            }
        }
    });

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let mut stdout = tokio::io::stdout();
    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;

    let stop_reason = loop {
        tokio::select! {
            _ = sigint.recv() => break "SIGINT",
            _ = sigterm.recv() => break "SIGTERM",
            next = lines.next() => match next {
                None => break "EOF",
                Some(Err(err)) => return Err(err).context("failed to read command from stdin"),
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let mut response = handle_line(&desk, &line).await?;
                    response.push('\n');
                    stdout
                        .write_all(response.as_bytes())
                        .await
                        .context("failed to write response")?;
                    stdout.flush().await.context("failed to flush stdout")?;
                }
            },
        }
    };

    sweeper
        .stop()
        .await
        .context("expiry sweeper task join failed")?;
    // Dropping the last desk handle closes the notice channel so the cache writer drains and exits.
    drop(desk);
    notice_task.await.context("settlement notice task join failed")?;

    tracing::info!(target: "main", reason = stop_reason, "exchange_desk_stopped");
    Ok(())
}

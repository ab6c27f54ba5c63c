use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tokio_stream::{StreamExt, wrappers::LinesStream};
use tokio_util::sync::CancellationToken;

use awardwatch::{
    cache::EligibilityCache,
    classifier::SpotClassifier,
    cli::config_path_from_args,
    config::Config,
    history::InMemoryContactHistory,
    logging::init_tracing,
    protocol::{ClientMessage, ServerMessage, encode_server_message, parse_client_message},
    roster::InMemoryRoster,
    stream::SpotStream,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging = init_tracing(&config.logging)?;

    let registry = Arc::new(
        config
            .awards
            .build_registry()
            .context("award table is invalid")?,
    );
    let roster = Arc::new(match &config.data.roster_path {
        Some(path) => InMemoryRoster::load_json(path)?,
        None => InMemoryRoster::new(),
    });
    let history = Arc::new(match &config.data.history_path {
        Some(path) => InMemoryContactHistory::load_json(path)?,
        None => InMemoryContactHistory::new(),
    });
    tracing::info!(
        target: "main",
        run_id = logging.run_id(),
        awards = registry.len(),
        roster_members = roster.len(),
        contacts = history.len(),
        "awardwatch_starting"
    );

    let cache = Arc::new(EligibilityCache::new(
        registry,
        history.clone(),
        roster,
        config.cache.to_cache_config(),
    ));
    cache.request_refresh();

    let shutdown = CancellationToken::new();
    let (spot_tx, spot_rx) = mpsc::channel(config.stream.spot_queue_capacity.max(1));
    let (result_tx, mut result_rx) = mpsc::channel(config.stream.result_queue_capacity.max(1));
    let (out_tx, out_rx) = mpsc::channel::<ServerMessage>(config.stream.result_queue_capacity.max(1));

    let spot_stream = SpotStream::new(
        SpotClassifier::new(config.classifier.clone()),
        Arc::clone(&cache),
        spot_rx,
        result_tx,
        shutdown.clone(),
    );
    let stream_task = tokio::spawn(spot_stream.run());

    let forward_tx = out_tx.clone();
    let forward_task = tokio::spawn(async move {
        while let Some(classified) = result_rx.recv().await {
            let message = ServerMessage::Classified {
                spot: classified.spot,
                result: classified.result,
            };
            if forward_tx.send(message).await.is_err() {
                break;
            }
        }
    });
    let writer_task = tokio::spawn(write_messages(out_rx));

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    let stop_reason = loop {
        let line = tokio::select! {
            _ = sigint.recv() => {
                shutdown.cancel();
                break "SIGINT";
            }
            _ = sigterm.recv() => {
                shutdown.cancel();
                break "SIGTERM";
            }
            line = lines.next() => line,
        };

        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                tracing::warn!(target: "main", error = %err, "stdin_read_failed");
                break "stdin error";
            }
            None => break "stdin closed",
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_client_message(&line) {
            Ok(ClientMessage::Spot(spot)) => {
                if spot_tx.send(spot).await.is_err() {
                    break "spot stream stopped";
                }
            }
            Ok(ClientMessage::Contact(contact)) => {
                if let Err(err) = contact.validate() {
                    let _ = out_tx
                        .send(ServerMessage::Error {
                            message: err.to_string(),
                        })
                        .await;
                    continue;
                }
                history.commit(contact.clone());
                cache.contact_committed(&contact);
            }
            Ok(ClientMessage::Progress) => {
                let message = progress_message(Arc::clone(&cache)).await;
                let _ = out_tx.send(message).await;
            }
            Ok(ClientMessage::Exit) => break "exit",
            Err(err) => {
                tracing::warn!(target: "main", error = %err, "invalid_client_message");
                let _ = out_tx
                    .send(ServerMessage::Error {
                        message: format!("invalid message: {err}"),
                    })
                    .await;
            }
        }
    };

    tracing::info!(target: "main", reason = stop_reason, "awardwatch_stopping");
    cache.shutdown();
    drop(spot_tx);
    let stats = stream_task.await.context("spot stream task join failed")?;
    forward_task.await.context("result forwarder join failed")?;
    drop(out_tx);
    writer_task.await.context("stdout writer join failed")??;

    tracing::info!(
        target: "main",
        classified = stats.classified,
        skipped = stats.skipped,
        "awardwatch_stopped"
    );
    eprintln!("awardwatch stopped: {stop_reason}");
    Ok(())
}

async fn progress_message(cache: Arc<EligibilityCache>) -> ServerMessage {
    match tokio::task::spawn_blocking(move || cache.get_snapshot()).await {
        Ok(Ok(snapshot)) => ServerMessage::Progress {
            generation: snapshot.generation(),
            awards: snapshot.summaries(),
        },
        Ok(Err(err)) => ServerMessage::Error {
            message: err.to_string(),
        },
        Err(err) => ServerMessage::Error {
            message: format!("progress task failed: {err}"),
        },
    }
}

async fn write_messages(mut out_rx: mpsc::Receiver<ServerMessage>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = out_rx.recv().await {
        let mut line = encode_server_message(&message).context("failed to encode message")?;
        line.push('\n');
        stdout
            .write_all(line.as_bytes())
            .await
            .context("failed to write to stdout")?;
        stdout.flush().await.context("failed to flush stdout")?;
    }
    Ok(())
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    cache::EligibilityCache,
    classifier::{EligibilityResult, Spot, SpotClassifier},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSpot {
    pub spot: Spot,
    pub result: EligibilityResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub classified: u64,
    pub skipped: u64,
}

/// Consumes pushed spots and forwards each with its classification.
pub struct SpotStream {
    classifier: SpotClassifier,
    cache: Arc<EligibilityCache>,
    spots_rx: mpsc::Receiver<Spot>,
    results_tx: mpsc::Sender<ClassifiedSpot>,
    shutdown: CancellationToken,
}

impl SpotStream {
    pub fn new(
        classifier: SpotClassifier,
        cache: Arc<EligibilityCache>,
        spots_rx: mpsc::Receiver<Spot>,
        results_tx: mpsc::Sender<ClassifiedSpot>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            classifier,
            cache,
            spots_rx,
            results_tx,
            shutdown,
        }
    }

    /// Runs until shutdown, until the spot source closes, or until the result
    /// receiver is dropped. Malformed spots are logged and skipped.
    #[tracing::instrument(name = "spot_stream_run", target = "stream", skip(self))]
    pub async fn run(mut self) -> StreamStats {
        let mut stats = StreamStats::default();
        loop {
            let spot = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                spot = self.spots_rx.recv() => match spot {
                    Some(spot) => spot,
                    None => break,
                },
            };

            let result = match self.classifier.classify(&spot, &self.cache) {
                Ok(result) => result,
                Err(err) => {
                    stats.skipped = stats.skipped.saturating_add(1);
                    tracing::warn!(
                        target: "stream",
                        station_id = %spot.station_id,
                        source = %spot.source,
                        error = %err,
                        "invalid_spot_skipped"
                    );
                    continue;
                }
            };

            if self
                .results_tx
                .send(ClassifiedSpot { spot, result })
                .await
                .is_err()
            {
                tracing::info!(target: "stream", "result_receiver_closed");
                break;
            }
            stats.classified = stats.classified.saturating_add(1);
        }

        tracing::info!(
            target: "stream",
            classified = stats.classified,
            skipped = stats.skipped,
            "spot_stream_stopped"
        );
        stats
    }
}

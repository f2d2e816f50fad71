// Observer seam between the supervisor and the host application

use tokio::sync::mpsc::UnboundedSender;

use super::models::ProgressSample;

/// Receives live progress samples while a subprocess runs. Implementations
/// must tolerate non-monotonic percentages and should display the latest
/// sample, not a running maximum.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, sample: ProgressSample);
}

/// Observer that forwards every sample into a channel, for hosts that pump
/// progress through an event loop.
pub struct ChannelObserver {
    tx: UnboundedSender<ProgressSample>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<ProgressSample>) -> Self {
        Self { tx }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&self, sample: ProgressSample) {
        // Receiver may be gone during teardown; dropping the sample is fine
        let _ = self.tx.send(sample);
    }
}

/// Observer that ignores everything, for probe calls and tests.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_progress(&self, _sample: ProgressSample) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_observer_forwards() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let observer = ChannelObserver::new(tx);
        observer.on_progress(ProgressSample {
            percent: 50.0,
            downloaded_mb: None,
            total_mb: None,
            speed_mb_s: None,
            eta_secs: None,
        });
        let got = rx.try_recv().unwrap();
        assert!((got.percent - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_channel_observer_survives_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let observer = ChannelObserver::new(tx);
        observer.on_progress(ProgressSample {
            percent: 1.0,
            downloaded_mb: None,
            total_mb: None,
            speed_mb_s: None,
            eta_secs: None,
        });
    }
}

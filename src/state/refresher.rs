use crate::state::messages::NetworkRequest;
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{MissedTickBehavior, interval};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Set while a background refresh is queued or running. The poll loop skips
/// its tick until the worker releases it, so polls never pile up in front of
/// user actions when the backend is slow.
#[derive(Debug, Clone, Default)]
pub struct PollGate(Arc<AtomicBool>);

impl PollGate {
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Poll loop: asks for a background refresh every `period` until the
/// shutdown signal flips (or its sender is dropped).
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
    period: Duration,
    gate: PollGate,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>, period: Duration, gate: PollGate) -> Self {
        Self { network_requests, period, gate }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut poll_interval = interval(self.period);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        poll_interval.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("poll loop stopped");
                        break;
                    }
                }
                _ = poll_interval.tick() => {
                    if !self.gate.try_acquire() {
                        debug!("previous poll still pending, skipping tick");
                        continue;
                    }
                    let request = NetworkRequest::Refresh { background: true };
                    if self.network_requests.send(request).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const POLL: NetworkRequest = NetworkRequest::Refresh { background: true };
    const USER_REFRESH: NetworkRequest = NetworkRequest::Refresh { background: false };

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    /// Drains the channel the way the worker would, releasing the gate for
    /// every finished poll.
    fn drain(rx: &mut mpsc::Receiver<NetworkRequest>, gate: &PollGate) -> Vec<NetworkRequest> {
        let mut out = Vec::new();
        while let Ok(request) = rx.try_recv() {
            if request == POLL {
                gate.release();
            }
            out.push(request);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn polls_three_times_in_nine_seconds() {
        let (tx, mut rx) = mpsc::channel(16);
        let gate = PollGate::default();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle =
            tokio::spawn(PeriodicRefresher::new(tx, DEFAULT_POLL_INTERVAL, gate.clone()).run(stop_rx));
        settle().await;

        let mut sent = Vec::new();
        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(1)).await;
            settle().await;
            sent.extend(drain(&mut rx, &gate));
        }

        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|r| *r == POLL));

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unfinished_poll_blocks_the_next_one() {
        let (tx, mut rx) = mpsc::channel(16);
        let gate = PollGate::default();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle =
            tokio::spawn(PeriodicRefresher::new(tx, DEFAULT_POLL_INTERVAL, gate.clone()).run(stop_rx));
        settle().await;

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        let mut queued = Vec::new();
        while let Ok(request) = rx.try_recv() {
            queued.push(request);
        }
        assert_eq!(queued, vec![POLL]);

        gate.release();
        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(drain(&mut rx, &gate), vec![POLL]);

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn user_refresh_waits_for_at_most_one_poll() {
        let (tx, mut rx) = mpsc::channel(100);
        let gate = PollGate::default();
        let (stop_tx, stop_rx) = watch::channel(false);
        let refresher = tokio::spawn(
            PeriodicRefresher::new(tx.clone(), DEFAULT_POLL_INTERVAL, gate.clone()).run(stop_rx),
        );

        // Serial worker against a backend that takes 10 s per call.
        let start = Instant::now();
        let worker_gate = gate.clone();
        let worker = tokio::spawn(async move {
            let mut served = Vec::new();
            while let Some(request) = rx.recv().await {
                tokio::time::sleep(Duration::from_secs(10)).await;
                if request == POLL {
                    worker_gate.release();
                }
                served.push((request, start.elapsed()));
            }
            served
        });

        tokio::time::sleep(Duration::from_secs(60)).await;
        tx.send(USER_REFRESH).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        stop_tx.send(true).unwrap();
        refresher.await.unwrap();
        drop(tx);
        let served = worker.await.unwrap();

        let (position, (_, served_at)) = served
            .iter()
            .enumerate()
            .find(|(_, (request, _))| *request == USER_REFRESH)
            .unwrap();
        assert!(*served_at <= Duration::from_secs(80), "served at {served_at:?}");
        assert!(position <= 7, "{position} polls ran first");
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_sent_after_shutdown() {
        let (tx, mut rx) = mpsc::channel(16);
        let gate = PollGate::default();
        let (stop_tx, stop_rx) = watch::channel(false);
        let handle =
            tokio::spawn(PeriodicRefresher::new(tx, DEFAULT_POLL_INTERVAL, gate.clone()).run(stop_rx));
        settle().await;

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(drain(&mut rx, &gate).len(), 1);

        stop_tx.send(true).unwrap();
        settle().await;
        assert!(handle.is_finished());

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert!(drain(&mut rx, &gate).is_empty());
    }
}

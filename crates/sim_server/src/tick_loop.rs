use crate::match_handle::MatchHandle;
use sim_core::Game;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Steps the match at its tick rate until it finishes or shutdown is
/// requested. Ticks missed under load are skipped, not replayed.
pub async fn run_tick_loop<G: Game + Send + 'static>(handle: MatchHandle<G>)
where
    G::Action: Send,
    G::Observation: Send,
    G::Event: Send,
    G::Config: Send,
{
    let tick_hz = handle.tick_hz().max(1);
    let mut interval = interval(Duration::from_secs_f64(1.0 / f64::from(tick_hz)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::debug!(tick_hz, "tick loop started");

    loop {
        interval.tick().await;

        if handle.should_shutdown() {
            tracing::debug!("tick loop shut down");
            break;
        }

        if handle.step_one_tick().await {
            let status = handle.status().await;
            tracing::debug!(status = %status, "tick loop finished");
            break;
        }
    }
}

pub fn spawn_tick_loop<G: Game + Send + 'static>(handle: MatchHandle<G>) -> tokio::task::JoinHandle<()>
where
    G::Action: Send,
    G::Observation: Send,
    G::Event: Send,
    G::Config: Send,
{
    tokio::spawn(run_tick_loop(handle))
}

mod feed;

use std::time::Duration;

use shared::{Pacer, Tick};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, MissedTickBehavior};

use crate::config::ClientConfig;

pub use feed::{FeedSession, LiveFeed, SourceText};

/// Shortest tick the driver will run with.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Handle to a running typing animation.
pub struct Playback {
    displayed: watch::Receiver<String>,
    handle: JoinHandle<usize>,
}

impl Playback {
    pub fn displayed(&self) -> watch::Receiver<String> {
        self.displayed.clone()
    }

    pub fn current(&self) -> String {
        self.displayed.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the timer without waiting for the text to catch up.
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Waits for the animation to end and returns how many characters it
    /// revealed.
    pub async fn wait(self) -> Result<usize, JoinError> {
        self.handle.await
    }
}

/// Reveals `source` one character per `tick` on a background task.
///
/// The task ends once the stream is finished and everything has been shown.
/// While caught up with a stream that is still running it sleeps until the
/// source changes instead of ticking.
pub fn spawn_playback(source: watch::Receiver<SourceText>, tick: Duration) -> Playback {
    let tick = if tick < MIN_TICK {
        log::warn!("Typing interval {:?} is too short, using {:?}", tick, MIN_TICK);
        MIN_TICK
    } else {
        tick
    };
    let (tx, displayed) = watch::channel(String::new());
    let handle = tokio::spawn(run(source, tick, tx));
    Playback { displayed, handle }
}

impl LiveFeed {
    /// Starts playback of this feed at the configured typing interval.
    pub fn play(&self, config: &ClientConfig) -> Playback {
        spawn_playback(self.subscribe(), config.typing_interval)
    }
}

async fn run(
    mut source: watch::Receiver<SourceText>,
    tick: Duration,
    displayed: watch::Sender<String>,
) -> usize {
    let mut pacer = Pacer::new();
    let mut interval = time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut source_open = true;
    let mut reveals = 0;

    loop {
        interval.tick().await;
        let outcome = {
            let current = source.borrow_and_update();
            pacer.tick(&current.text, current.streaming && source_open)
        };

        displayed.send_if_modified(|shown| {
            if shown.as_str() == pacer.displayed() {
                return false;
            }
            shown.clear();
            shown.push_str(pacer.displayed());
            true
        });

        match outcome {
            Tick::Revealed(_) => reveals += 1,
            Tick::Waiting => {
                if source.changed().await.is_err() {
                    log::debug!("Live feed closed while streaming");
                    source_open = false;
                }
                interval.reset();
            }
            Tick::Finished => break,
        }
    }

    log::debug!("Playback finished after {} characters", reveals);
    reveals
}

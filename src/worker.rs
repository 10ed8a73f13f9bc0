use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::ratings_api::RatingsService;
use crate::state::{Delta, ProviderCommand};

/// Serves fetch commands off the UI thread. Commands queued behind the one
/// being served are collapsed so only the newest is fetched.
pub fn spawn_ratings_worker(
    service: Box<dyn RatingsService + Send>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(mut cmd) = cmd_rx.recv() {
            while let Ok(next) = cmd_rx.try_recv() {
                let ProviderCommand::FetchRatings { request_id, .. } = &cmd;
                let skipped = Delta::Log(format!("[INFO] Skipping superseded request #{request_id}"));
                if tx.send(skipped).is_err() {
                    return;
                }
                cmd = next;
            }

            match cmd {
                ProviderCommand::FetchRatings { request_id, names } => {
                    let delta = match service.fetch_ratings(&names) {
                        Ok(reply) => Delta::RatingsLoaded { request_id, reply },
                        Err(err) => Delta::RatingsFailed {
                            request_id,
                            error: format!("{err:#}"),
                        },
                    };
                    if tx.send(delta).is_err() {
                        return;
                    }
                }
            }
        }
    })
}

use std::time::Instant;

use tracing::{info, warn};

use crate::config;
use crate::engine::PlaybackEngine;
use crate::library::Library;
use crate::transport::{Command, TransportController};

/// Hand the library order to the controller as the queue and honour `playback.autoplay`.
pub fn apply_playback_defaults<E: PlaybackEngine>(
    library: &Library,
    controller: &mut TransportController<E>,
    settings: &config::Settings,
) {
    if library.is_empty() {
        warn!("library is empty, nothing to queue");
    }

    let now = Instant::now();
    controller.dispatch(Command::SetQueue(library.ids()).into(), now);
    info!(queued = controller.queue().len(), "queue ready");

    if settings.playback.autoplay {
        if let Some(id) = library.tracks().first().map(|t| t.id.clone()) {
            info!(%id, "autoplay");
            controller.dispatch(Command::Select(id).into(), now);
        }
    }
}

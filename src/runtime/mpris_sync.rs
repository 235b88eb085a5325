use crate::app::App;
use crate::mpris::MprisHandle;

/// Push the app's latest snapshot to the bus, naming the active track by its queue slot.
pub fn update_mpris(mpris: &MprisHandle, app: &App) {
    if let Some(snapshot) = app.snapshot.as_ref() {
        mpris.update(snapshot, app.active_index());
    }
}

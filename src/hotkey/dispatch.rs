//! Routes hotkey events to the pipeline and the control panel.

use tokio::sync::mpsc;

use super::HotkeyEvent;
use crate::overlay::PanelSwitch;
use crate::pipeline::OrchestratorHandle;

/// Forward events from the listener until the channel closes.
///
/// A correct request while a job is outstanding is dropped, not queued.
/// `TogglePanel` is ignored when no panel is hosted.
pub async fn dispatch(
    mut events: mpsc::Receiver<HotkeyEvent>,
    handle: OrchestratorHandle,
    panel: Option<PanelSwitch>,
) {
    while let Some(event) = events.recv().await {
        match event {
            HotkeyEvent::CorrectSelection => {
                handle.trigger();
            }
            HotkeyEvent::CancelCorrection => handle.cancel(),
            HotkeyEvent::TogglePanel => match &panel {
                Some(panel) => {
                    let open = panel.toggle();
                    log::debug!("hotkey: panel {}", if open { "opened" } else { "closed" });
                }
                None => log::debug!("hotkey: panel toggle ignored, panel disabled"),
            },
        }
    }
    log::info!("hotkey: event channel closed, dispatcher exiting");
}

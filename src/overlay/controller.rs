//! Maps pipeline phases onto renderer calls.

use tokio::sync::mpsc;

use super::OverlayRenderer;
use crate::pipeline::{Anchor, PhaseUpdate, PipelinePhase};

/// Drives an [`OverlayRenderer`] from the phase stream.
///
/// | Phase | Renderer calls |
/// |-------|----------------|
/// | `Idle` | `hide()` if shown |
/// | other, anchor known | `show(anchor)` once per job, then `update(phase)` |
/// | other, anchor not yet known | nothing |
///
/// The anchor is whatever the job recorded at start; later cursor movement
/// never moves the indicator.
pub struct OverlayController<R> {
    renderer: R,
    shown_at: Option<Anchor>,
    last_phase: Option<PipelinePhase>,
}

impl<R: OverlayRenderer> OverlayController<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            shown_at: None,
            last_phase: None,
        }
    }

    pub fn on_phase_changed(&mut self, phase: PipelinePhase, anchor: Option<Anchor>) {
        if phase == PipelinePhase::Idle {
            if self.shown_at.take().is_some() {
                self.renderer.hide();
            }
            self.last_phase = None;
            return;
        }

        let Some(anchor) = anchor.or(self.shown_at) else {
            return;
        };
        if self.shown_at != Some(anchor) {
            self.renderer.show(anchor);
            self.shown_at = Some(anchor);
            self.last_phase = None;
        }
        if self.last_phase != Some(phase) {
            self.renderer.update(&phase);
            self.last_phase = Some(phase);
        }
    }

    /// Consume updates until the pipeline drops its sender.
    pub async fn run(mut self, mut updates: mpsc::UnboundedReceiver<PhaseUpdate>) {
        while let Some(update) = updates.recv().await {
            self.on_phase_changed(update.phase, update.anchor);
        }
        log::debug!("overlay: update channel closed");
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{IndicatorState, RepaintSlot, WatchRenderer};
    use crate::pipeline::ErrorKind;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Show(Anchor),
        Update(PipelinePhase),
        Hide,
    }

    #[derive(Default)]
    struct Recorder(Vec<Call>);

    impl OverlayRenderer for Recorder {
        fn show(&mut self, anchor: Anchor) {
            self.0.push(Call::Show(anchor));
        }
        fn update(&mut self, phase: &PipelinePhase) {
            self.0.push(Call::Update(*phase));
        }
        fn hide(&mut self) {
            self.0.push(Call::Hide);
        }
    }

    #[test]
    fn full_job_sequence() {
        let at = Anchor::new(100, 200);
        let mut c = OverlayController::new(Recorder::default());

        c.on_phase_changed(PipelinePhase::Capturing, None);
        c.on_phase_changed(PipelinePhase::Capturing, Some(at));
        c.on_phase_changed(PipelinePhase::Correcting { attempt: 1 }, Some(at));
        c.on_phase_changed(PipelinePhase::Correcting { attempt: 2 }, Some(at));
        c.on_phase_changed(PipelinePhase::Applying, Some(at));
        c.on_phase_changed(PipelinePhase::Succeeded, Some(at));
        c.on_phase_changed(PipelinePhase::Idle, None);

        assert_eq!(
            c.renderer().0,
            vec![
                Call::Show(at),
                Call::Update(PipelinePhase::Capturing),
                Call::Update(PipelinePhase::Correcting { attempt: 1 }),
                Call::Update(PipelinePhase::Correcting { attempt: 2 }),
                Call::Update(PipelinePhase::Applying),
                Call::Update(PipelinePhase::Succeeded),
                Call::Hide,
            ]
        );
    }

    #[test]
    fn idle_without_show_does_nothing() {
        let mut c = OverlayController::new(Recorder::default());
        c.on_phase_changed(PipelinePhase::Idle, None);
        assert!(c.renderer().0.is_empty());
    }

    #[test]
    fn anchor_stays_fixed_for_the_job() {
        let at = Anchor::new(5, 5);
        let mut c = OverlayController::new(Recorder::default());

        c.on_phase_changed(PipelinePhase::Capturing, Some(at));
        c.on_phase_changed(PipelinePhase::Failed(ErrorKind::Timeout), None);

        assert_eq!(
            c.renderer().0,
            vec![
                Call::Show(at),
                Call::Update(PipelinePhase::Capturing),
                Call::Update(PipelinePhase::Failed(ErrorKind::Timeout)),
            ]
        );
    }

    #[test]
    fn next_job_shows_at_its_own_anchor() {
        let mut c = OverlayController::new(Recorder::default());
        c.on_phase_changed(PipelinePhase::Capturing, Some(Anchor::new(1, 1)));
        c.on_phase_changed(PipelinePhase::Idle, None);
        c.on_phase_changed(PipelinePhase::Capturing, Some(Anchor::new(9, 9)));

        assert_eq!(c.renderer().0.last(), Some(&Call::Update(PipelinePhase::Capturing)));
        assert!(c.renderer().0.contains(&Call::Show(Anchor::new(9, 9))));
    }

    #[tokio::test]
    async fn run_drains_phase_stream() {
        let (tx, rx) = mpsc::unbounded_channel();
        let at = Some(Anchor::new(3, 4));
        for phase in [PipelinePhase::Capturing, PipelinePhase::Succeeded] {
            tx.send(PhaseUpdate { phase, anchor: at }).unwrap();
        }
        drop(tx);

        let (renderer, state) = WatchRenderer::new(RepaintSlot::default());
        OverlayController::new(renderer).run(rx).await;

        // The renderer is gone; the window still reads its last state.
        assert_eq!(
            *state.borrow(),
            IndicatorState::Shown {
                anchor: Anchor::new(3, 4),
                phase: Some(PipelinePhase::Succeeded),
            }
        );
    }

    #[tokio::test]
    async fn idle_after_a_long_stream_always_hides() {
        let (tx, rx) = mpsc::unbounded_channel();
        let at = Some(Anchor::new(7, 7));
        for attempt in 1..=50 {
            tx.send(PhaseUpdate {
                phase: PipelinePhase::Correcting { attempt },
                anchor: at,
            })
            .unwrap();
        }
        tx.send(PhaseUpdate {
            phase: PipelinePhase::Idle,
            anchor: None,
        })
        .unwrap();
        drop(tx);

        let (renderer, state) = WatchRenderer::new(RepaintSlot::default());
        OverlayController::new(renderer).run(rx).await;

        assert_eq!(*state.borrow(), IndicatorState::Hidden);
    }
}

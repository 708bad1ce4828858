//! Staggered entrance of a slide's elements.

use crate::schedule::{Group, Millis, Timeline};
use crate::view::SlideView;

pub const REVEAL_BASE_MS: Millis = 120;
pub const REVEAL_STEP_MS: Millis = 110;
pub const PULSE_MS: Millis = 2400;
/// How long a revealed element takes to fade and slide into place.
pub const REVEAL_FADE_MS: Millis = 450;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealTask {
    Show { slide: usize, slot: usize },
    EndPulse { slide: usize, slot: usize },
}

#[derive(Debug, Clone, Default)]
struct SlideReveal {
    shown_at: Vec<Option<Millis>>,
    pulsing: Vec<bool>,
    media: Vec<bool>,
}

impl SlideReveal {
    fn new(view: &SlideView) -> Self {
        let count = view.stagger_count();
        Self {
            shown_at: vec![None; count],
            pulsing: vec![false; count],
            media: (0..count).map(|slot| view.is_media_slot(slot)).collect(),
        }
    }

    fn clear(&mut self) {
        self.shown_at.iter_mut().for_each(|s| *s = None);
        self.pulsing.iter_mut().for_each(|p| *p = false);
    }
}

/// Reveal flags for every slide's stagger slots.
#[derive(Debug, Clone, Default)]
pub struct RevealState {
    slides: Vec<SlideReveal>,
}

impl RevealState {
    pub fn new(views: &[SlideView]) -> Self {
        Self {
            slides: views.iter().map(SlideReveal::new).collect(),
        }
    }

    /// Drop every show and pulse flag on every slide.
    pub fn clear_all(&mut self) {
        self.slides.iter_mut().for_each(SlideReveal::clear);
    }

    /// Clear leftovers, then queue the reveal of each of `slide`'s stagger
    /// slots at `base + slot * step` from `now`.
    pub fn orchestrate<A: From<RevealTask>>(
        &mut self,
        slide: usize,
        now: Millis,
        timeline: &mut Timeline<A>,
    ) {
        self.clear_all();
        let Some(reveal) = self.slides.get(slide) else {
            return;
        };
        for slot in 0..reveal.shown_at.len() {
            let due = now + REVEAL_BASE_MS + slot as Millis * REVEAL_STEP_MS;
            timeline.schedule(due, Group::Reveal, RevealTask::Show { slide, slot }.into());
        }
    }

    pub fn apply<A: From<RevealTask>>(
        &mut self,
        task: RevealTask,
        now: Millis,
        timeline: &mut Timeline<A>,
    ) {
        match task {
            RevealTask::Show { slide, slot } => {
                let Some(reveal) = self.slides.get_mut(slide) else {
                    return;
                };
                if slot >= reveal.shown_at.len() {
                    return;
                }
                reveal.shown_at[slot] = Some(now);
                if reveal.media[slot] {
                    reveal.pulsing[slot] = true;
                    timeline.schedule(
                        now + PULSE_MS,
                        Group::Reveal,
                        RevealTask::EndPulse { slide, slot }.into(),
                    );
                }
            }
            RevealTask::EndPulse { slide, slot } => {
                if let Some(p) = self
                    .slides
                    .get_mut(slide)
                    .and_then(|r| r.pulsing.get_mut(slot))
                {
                    *p = false;
                }
            }
        }
    }

    pub fn is_shown(&self, slide: usize, slot: usize) -> bool {
        self.shown_at(slide, slot).is_some()
    }

    pub fn is_pulsing(&self, slide: usize, slot: usize) -> bool {
        self.slides
            .get(slide)
            .and_then(|r| r.pulsing.get(slot))
            .copied()
            .unwrap_or(false)
    }

    fn shown_at(&self, slide: usize, slot: usize) -> Option<Millis> {
        self.slides
            .get(slide)
            .and_then(|r| r.shown_at.get(slot))
            .copied()
            .flatten()
    }

    /// Entrance progress of a slot in [0, 1], eased. Unrevealed slots are 0.
    pub fn progress(&self, slide: usize, slot: usize, now: Millis) -> f32 {
        match self.shown_at(slide, slot) {
            Some(at) => {
                let t = now.saturating_sub(at) as f32 / REVEAL_FADE_MS as f32;
                ease_out(t.min(1.0))
            }
            None => 0.0,
        }
    }

    /// Whether any slot of `slide` is still mid-animation at `now`.
    pub fn animating(&self, slide: usize, now: Millis) -> bool {
        self.slides.get(slide).is_some_and(|r| {
            r.pulsing.iter().any(|p| *p)
                || r
                    .shown_at
                    .iter()
                    .flatten()
                    .any(|at| now.saturating_sub(*at) < REVEAL_FADE_MS)
        })
    }
}

pub fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

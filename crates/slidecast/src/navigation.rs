use std::path::Path;

use anyhow::{Result, bail};

use crate::animation::{RevealState, RevealTask};
use crate::deck::Slide;
use crate::schedule::{Group, Millis, Timeline};
use crate::view::{self, AssetResolver, SlideView, Thumbnail};

/// Time the outgoing slide spends in its exit animation.
pub const EXIT_DELAY_MS: Millis = 260;
/// How long a newly activated slide keeps its entrance tag.
pub const INCOMING_MS: Millis = 680;

pub const NO_NOTES: &str = "No speaker notes for this slide.";

const LAYER_BASE: u8 = 1;
const LAYER_ACTIVE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Activate { target: usize },
    ClearIncoming { slide: usize },
    Reveal(RevealTask),
}

impl From<RevealTask> for Task {
    fn from(task: RevealTask) -> Self {
        Task::Reveal(task)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// A slide became the active one.
    Activated(usize),
}

/// Per-slide visual state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideFlags {
    pub active: bool,
    pub layer: u8,
    pub exiting_since: Option<Millis>,
    pub incoming_since: Option<Millis>,
}

impl Default for SlideFlags {
    fn default() -> Self {
        Self {
            active: false,
            layer: LAYER_BASE,
            exiting_since: None,
            incoming_since: None,
        }
    }
}

/// The loaded deck and the index of the slide on screen.
#[derive(Debug, Clone)]
pub struct PresentationState {
    slides: Vec<Slide>,
    views: Vec<SlideView>,
    thumbnails: Vec<Thumbnail>,
    current: usize,
}

impl PresentationState {
    pub fn new(slides: Vec<Slide>, assets: &AssetResolver) -> Result<Self> {
        if slides.is_empty() {
            bail!("A presentation needs at least one slide");
        }
        let views = view::build_all(&slides, assets);
        let thumbnails = view::build_thumbnails(&slides);
        Ok(Self {
            slides,
            views,
            thumbnails,
            current: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn current(&self) -> usize {
        self.current
    }
}

/// Owns the presentation state and moves it between slides.
///
/// `next`/`previous` go through an exit phase before the target is shown;
/// `jump_to` shows the target at once. Starting any slide change cancels
/// whatever the previous one still had pending, so overlapping requests
/// never activate a stale target.
#[derive(Debug)]
pub struct Navigator {
    state: PresentationState,
    pending: Option<usize>,
    flags: Vec<SlideFlags>,
    reveal: RevealState,
    timeline: Timeline<Task>,
}

impl Navigator {
    pub fn new(slides: Vec<Slide>, assets: &AssetResolver) -> Result<Self> {
        let state = PresentationState::new(slides, assets)?;
        let flags = vec![SlideFlags::default(); state.len()];
        let reveal = RevealState::new(&state.views);
        Ok(Self {
            state,
            pending: None,
            flags,
            reveal,
            timeline: Timeline::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn current(&self) -> usize {
        self.state.current()
    }

    /// Index the next relative move starts from.
    fn base(&self) -> usize {
        self.pending_target().unwrap_or(self.current())
    }

    pub fn pending_target(&self) -> Option<usize> {
        self.pending
    }

    /// Go to the following slide. Returns false at the end of the deck.
    pub fn next(&mut self, now: Millis) -> bool {
        let base = self.base();
        if base + 1 < self.len() {
            self.transition_to(base + 1, now);
            true
        } else {
            false
        }
    }

    /// Go to the preceding slide. Returns false at the start of the deck.
    pub fn previous(&mut self, now: Millis) -> bool {
        let base = self.base();
        if base > 0 {
            self.transition_to(base - 1, now);
            true
        } else {
            false
        }
    }

    /// Show slide `index` immediately, skipping the exit phase.
    pub fn jump_to(&mut self, index: usize, now: Millis) -> Option<NavEvent> {
        if index >= self.len() {
            tracing::debug!("Ignoring jump to slide {index}, deck has {}", self.len());
            return None;
        }
        self.cancel_transition();
        Some(self.show(index, now))
    }

    fn cancel_transition(&mut self) {
        self.timeline.cancel(Group::Transition);
        self.pending = None;
        for flags in &mut self.flags {
            flags.exiting_since = None;
            flags.incoming_since = None;
        }
    }

    fn transition_to(&mut self, target: usize, now: Millis) {
        self.cancel_transition();
        // The outgoing slide stops revealing once it starts to exit.
        self.timeline.cancel(Group::Reveal);
        let current = self.state.current;
        self.flags[current].exiting_since = Some(now);
        self.pending = Some(target);
        self.timeline
            .schedule(now + EXIT_DELAY_MS, Group::Transition, Task::Activate { target });
        tracing::trace!("Transition {} -> {} started at {now}ms", current, target);
    }

    fn show(&mut self, target: usize, now: Millis) -> NavEvent {
        self.timeline.cancel(Group::Reveal);
        for flags in &mut self.flags {
            flags.active = false;
            flags.layer = LAYER_BASE;
        }
        self.flags[target].active = true;
        self.flags[target].layer = LAYER_ACTIVE;
        self.state.current = target;
        self.pending = None;
        self.reveal.orchestrate(target, now, &mut self.timeline);
        tracing::debug!(
            "Showing slide {} of {} ({} reveals queued)",
            target + 1,
            self.len(),
            self.timeline.pending(Group::Reveal)
        );
        NavEvent::Activated(target)
    }

    /// Run every task due at `now`.
    pub fn tick(&mut self, now: Millis) -> Vec<NavEvent> {
        let mut events = Vec::new();
        // Tasks may schedule follow-ups that are already due.
        loop {
            let due = self.timeline.drain_due(now);
            if due.is_empty() {
                break;
            }
            for task in due {
                match task {
                    Task::Activate { target } => {
                        let from = self.state.current;
                        self.flags[from].exiting_since = None;
                        events.push(self.show(target, now));
                        self.flags[target].incoming_since = Some(now);
                        self.timeline.schedule(
                            now + INCOMING_MS,
                            Group::Transition,
                            Task::ClearIncoming { slide: target },
                        );
                    }
                    Task::ClearIncoming { slide } => {
                        if let Some(flags) = self.flags.get_mut(slide) {
                            flags.incoming_since = None;
                        }
                    }
                    // A batch can still hold reveals for a slide that was
                    // replaced earlier in the same batch.
                    Task::Reveal(RevealTask::Show { slide, .. })
                        if slide != self.state.current => {}
                    Task::Reveal(task) => self.reveal.apply(task, now, &mut self.timeline),
                }
            }
        }
        events
    }

    /// Earliest pending task, for scheduling the next repaint.
    pub fn next_due(&self) -> Option<Millis> {
        self.timeline.next_due()
    }

    /// Whether anything on screen is still changing at `now`.
    pub fn is_animating(&self, now: Millis) -> bool {
        !self.timeline.is_idle()
            || self.reveal.animating(self.current(), now)
            || self.flags.iter().any(|f| {
                f.incoming_since
                    .is_some_and(|at| now.saturating_sub(at) < INCOMING_MS)
            })
    }

    pub fn progress_percent(&self) -> f32 {
        (self.current() + 1) as f32 / self.len() as f32 * 100.0
    }

    pub fn counter_text(&self) -> String {
        format!("{} / {}", self.current() + 1, self.len())
    }

    pub fn notes_text(&self) -> &str {
        self.state.slides[self.current()]
            .notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(NO_NOTES)
    }

    pub fn prev_enabled(&self) -> bool {
        self.current() > 0
    }

    pub fn next_enabled(&self) -> bool {
        self.current() + 1 < self.len()
    }

    pub fn view(&self, index: usize) -> Option<&SlideView> {
        self.state.views.get(index)
    }

    pub fn current_slide(&self) -> &Slide {
        &self.state.slides[self.current()]
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.state.thumbnails
    }

    pub fn flags(&self, index: usize) -> SlideFlags {
        self.flags.get(index).copied().unwrap_or_default()
    }

    /// Slides to paint, bottom layer first.
    pub fn visible_slides(&self) -> Vec<usize> {
        let mut visible: Vec<usize> = (0..self.len())
            .filter(|&i| self.flags[i].active || self.flags[i].exiting_since.is_some())
            .collect();
        visible.sort_by_key(|&i| self.flags[i].layer);
        visible
    }

    pub fn reveal(&self) -> &RevealState {
        &self.reveal
    }

    /// Hero image of slide `index`, used for eager and ahead-of-time loading.
    pub fn hero_image(&self, index: usize) -> Option<&Path> {
        self.view(index).and_then(SlideView::hero_image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::REVEAL_BASE_MS;

    fn deck(n: usize) -> Vec<Slide> {
        (0..n)
            .map(|i| Slide {
                title: format!("Slide {}", i + 1),
                notes: (i % 2 == 0).then(|| format!("Notes {}", i + 1)),
                image: Some(format!("img{i}.png")),
                ..Default::default()
            })
            .collect()
    }

    fn navigator(n: usize) -> Navigator {
        let assets = AssetResolver::new(Path::new("/deck"), "images", "placeholder.jpg");
        let mut nav = Navigator::new(deck(n), &assets).unwrap();
        nav.jump_to(0, 0);
        nav
    }

    #[test]
    fn test_empty_deck_rejected() {
        let assets = AssetResolver::new(Path::new("."), "images", "placeholder.jpg");
        assert!(Navigator::new(Vec::new(), &assets).is_err());
    }

    #[test]
    fn test_next_waits_for_exit_delay() {
        let mut nav = navigator(3);
        assert!(nav.next(1000));
        assert_eq!(nav.current(), 0);
        assert_eq!(nav.flags(0).exiting_since, Some(1000));
        assert_eq!(nav.pending_target(), Some(1));

        assert!(nav.tick(1000 + EXIT_DELAY_MS - 1).is_empty());
        assert_eq!(nav.current(), 0);

        let events = nav.tick(1000 + EXIT_DELAY_MS);
        assert_eq!(events, vec![NavEvent::Activated(1)]);
        assert_eq!(nav.current(), 1);
        assert_eq!(nav.flags(0).exiting_since, None);
        assert!(!nav.flags(0).active);
        assert!(nav.flags(1).active);
        assert_eq!(nav.flags(1).layer, LAYER_ACTIVE);
        assert_eq!(nav.flags(0).layer, LAYER_BASE);
    }

    #[test]
    fn test_incoming_tag_clears() {
        let mut nav = navigator(2);
        nav.next(0);
        nav.tick(EXIT_DELAY_MS);
        assert_eq!(nav.flags(1).incoming_since, Some(EXIT_DELAY_MS));
        nav.tick(EXIT_DELAY_MS + INCOMING_MS - 1);
        assert!(nav.flags(1).incoming_since.is_some());
        nav.tick(EXIT_DELAY_MS + INCOMING_MS);
        assert_eq!(nav.flags(1).incoming_since, None);
    }

    #[test]
    fn test_boundaries_are_no_ops() {
        let mut nav = navigator(2);
        assert!(!nav.previous(0));
        assert!(nav.tick(10_000).is_empty());
        assert_eq!(nav.current(), 0);

        nav.jump_to(1, 10_000);
        assert!(!nav.next(10_000));
        nav.tick(20_000);
        assert_eq!(nav.current(), 1);
    }

    #[test]
    fn test_button_states() {
        let mut nav = navigator(3);
        assert!(!nav.prev_enabled());
        assert!(nav.next_enabled());
        nav.jump_to(1, 0);
        assert!(nav.prev_enabled() && nav.next_enabled());
        nav.jump_to(2, 0);
        assert!(nav.prev_enabled());
        assert!(!nav.next_enabled());
    }

    #[test]
    fn test_single_slide_deck() {
        let nav = navigator(1);
        assert!(!nav.prev_enabled());
        assert!(!nav.next_enabled());
        assert_eq!(nav.counter_text(), "1 / 1");
        assert_eq!(nav.progress_percent(), 100.0);
    }

    #[test]
    fn test_progress_and_counter_for_every_index() {
        let n = 7;
        let mut nav = navigator(n);
        for i in 0..n {
            nav.jump_to(i, 0);
            assert_eq!(nav.progress_percent(), (i + 1) as f32 / n as f32 * 100.0);
            assert_eq!(nav.counter_text(), format!("{} / {}", i + 1, n));
        }
    }

    #[test]
    fn test_notes_fall_back_to_placeholder() {
        let mut nav = navigator(2);
        assert_eq!(nav.notes_text(), "Notes 1");
        nav.jump_to(1, 0);
        assert_eq!(nav.notes_text(), NO_NOTES);
    }

    #[test]
    fn test_empty_notes_fall_back_to_placeholder() {
        let slides = vec![
            Slide {
                title: "Blank".into(),
                notes: Some(String::new()),
                ..Default::default()
            },
            Slide {
                title: "Spaces".into(),
                notes: Some("  \n ".into()),
                ..Default::default()
            },
        ];
        let assets = AssetResolver::new(Path::new("/deck"), "images", "placeholder.jpg");
        let mut nav = Navigator::new(slides, &assets).unwrap();
        nav.jump_to(0, 0);
        assert_eq!(nav.notes_text(), NO_NOTES);
        nav.jump_to(1, 0);
        assert_eq!(nav.notes_text(), NO_NOTES);
    }

    #[test]
    fn test_thumbnail_highlight_tracks_current() {
        let mut nav = navigator(4);
        nav.jump_to(2, 0);
        let active: Vec<_> = nav
            .thumbnails()
            .iter()
            .filter(|t| t.is_active(nav.current()))
            .map(|t| t.index)
            .collect();
        assert_eq!(active, vec![2]);
    }

    #[test]
    fn test_jump_is_immediate_and_cancels_transition() {
        let mut nav = navigator(5);
        nav.next(0);
        let event = nav.jump_to(3, 100);
        assert_eq!(event, Some(NavEvent::Activated(3)));
        assert_eq!(nav.current(), 3);
        assert_eq!(nav.pending_target(), None);
        assert_eq!(nav.flags(0).exiting_since, None);
        // The cancelled activation never fires.
        assert!(nav.tick(10_000).is_empty());
        assert_eq!(nav.current(), 3);
    }

    #[test]
    fn test_jump_out_of_range_is_ignored() {
        let mut nav = navigator(3);
        assert_eq!(nav.jump_to(3, 0), None);
        assert_eq!(nav.current(), 0);
    }

    #[test]
    fn test_rapid_next_chains_from_pending_target() {
        let mut nav = navigator(5);
        nav.next(0);
        nav.next(100);
        nav.next(200);
        assert_eq!(nav.pending_target(), Some(3));
        // Only the last request's activation survives.
        assert!(nav.tick(200 + EXIT_DELAY_MS - 1).is_empty());
        assert_eq!(nav.tick(200 + EXIT_DELAY_MS), vec![NavEvent::Activated(3)]);
        assert!(nav.tick(10_000).is_empty());
    }

    #[test]
    fn test_reveal_runs_after_activation() {
        let mut nav = navigator(2);
        nav.next(0);
        nav.tick(EXIT_DELAY_MS);
        assert!(!nav.reveal().is_shown(1, 0));
        nav.tick(EXIT_DELAY_MS + REVEAL_BASE_MS);
        assert!(nav.reveal().is_shown(1, 0));
        // Slide 0's flags were cleared when slide 1 took over.
        assert!(!nav.reveal().is_shown(0, 0));
    }

    #[test]
    fn test_exit_cancels_outgoing_reveals() {
        let mut nav = navigator(2);
        nav.next(0);
        // Slide 0's reveals were due at 120 ms and later.
        nav.tick(EXIT_DELAY_MS - 1);
        assert_eq!(nav.current(), 0);
        assert!(!nav.reveal().is_shown(0, 0));
        assert!(!nav.reveal().is_shown(0, 1));
    }

    #[test]
    fn test_visible_slides_during_exit() {
        let mut nav = navigator(3);
        assert_eq!(nav.visible_slides(), vec![0]);
        nav.next(0);
        assert_eq!(nav.visible_slides(), vec![0]);
        nav.tick(EXIT_DELAY_MS);
        assert_eq!(nav.visible_slides(), vec![1]);
    }

    #[test]
    fn test_hero_image_paths() {
        let nav = navigator(2);
        assert_eq!(
            nav.hero_image(1),
            Some(Path::new("/deck/images/img1.png"))
        );
        assert_eq!(nav.hero_image(2), None);
    }

    #[test]
    fn test_index_stays_in_range_under_any_sequence() {
        let n = 6;
        let mut nav = navigator(n);
        let mut seed: u64 = 0x5eed;
        let mut now = 0;
        for _ in 0..2000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            match (seed >> 33) % 4 {
                0 => {
                    nav.next(now);
                }
                1 => {
                    nav.previous(now);
                }
                2 => {
                    nav.jump_to(((seed >> 40) % (n as u64 + 2)) as usize, now);
                }
                _ => {}
            }
            now += (seed >> 50) % 400;
            nav.tick(now);
            assert!(nav.current() < n);
            assert!(nav.pending_target().is_none_or(|t| t < n));
        }
    }
}

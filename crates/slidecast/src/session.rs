use std::path::PathBuf;

use crate::analytics::{PresenterClock, ViewStats};
use crate::navigation::{NavEvent, Navigator};
use crate::prefs::{INTRO_DELAY_MS, IntroOverlay, Preferences};
use crate::schedule::{Group, Millis, Timeline};
use crate::speech::Narrator;

pub const WELCOME_TEXT: &str = "Welcome. Opening presentation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTask {
    OpenIntro,
}

/// Image work requested by slide changes, drained by the UI each frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    /// The active slide's image: load now.
    Eager(PathBuf),
    /// The following slide's image: decode in the background.
    Preload(PathBuf),
}

/// Which optional panels are showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Panels {
    pub notes: bool,
    pub thumbnails: bool,
}

/// Everything one presentation run needs: navigation, preferences,
/// narration, the intro overlay and view statistics.
pub struct Session {
    nav: Navigator,
    prefs: Preferences,
    narrator: Narrator,
    intro: IntroOverlay,
    timeline: Timeline<SessionTask>,
    stats: ViewStats,
    clock: PresenterClock,
    panels: Panels,
    load_requests: Vec<LoadRequest>,
}

impl Session {
    pub fn new(
        nav: Navigator,
        prefs: Preferences,
        narrator: Narrator,
        start_slide: usize,
        now: Millis,
    ) -> Self {
        let mut session = Self {
            nav,
            prefs,
            narrator,
            intro: IntroOverlay::default(),
            timeline: Timeline::new(),
            stats: ViewStats::default(),
            clock: PresenterClock::start(now),
            panels: Panels::default(),
            load_requests: Vec::new(),
        };

        let start = start_slide.min(session.nav.len().saturating_sub(1));
        session.jump_to(start, now);

        if !session.prefs.seen_intro() {
            session.intro.schedule();
            session
                .timeline
                .schedule(now + INTRO_DELAY_MS, Group::Intro, SessionTask::OpenIntro);
        }
        session
    }

    pub fn next(&mut self, now: Millis) {
        self.nav.next(now);
    }

    pub fn previous(&mut self, now: Millis) {
        self.nav.previous(now);
    }

    pub fn jump_to(&mut self, index: usize, now: Millis) {
        if let Some(event) = self.nav.jump_to(index, now) {
            self.handle(event);
        }
    }

    /// Advance timers to `now`.
    pub fn tick(&mut self, now: Millis) {
        for event in self.nav.tick(now) {
            self.handle(event);
        }
        for task in self.timeline.drain_due(now) {
            match task {
                SessionTask::OpenIntro => {
                    if self.intro.open() && self.prefs.speak_enabled() {
                        self.narrator.narrate(WELCOME_TEXT);
                    }
                }
            }
        }
    }

    fn handle(&mut self, event: NavEvent) {
        match event {
            NavEvent::Activated(index) => {
                self.stats.track(index);
                if let Some(path) = self.nav.hero_image(index) {
                    self.load_requests.push(LoadRequest::Eager(path.to_path_buf()));
                }
                if let Some(path) = self.nav.hero_image(index + 1) {
                    self.load_requests.push(LoadRequest::Preload(path.to_path_buf()));
                }
                if self.prefs.speak_enabled() {
                    self.narrate_current();
                }
            }
        }
    }

    fn narrate_current(&mut self) {
        let title = self.nav.current_slide().plain_title();
        if !title.is_empty() {
            self.narrator.narrate(&title);
        }
    }

    /// Returns whether the dark theme is now active.
    pub fn toggle_theme(&mut self) -> bool {
        let dark = self.prefs.toggle_theme();
        tracing::debug!("Theme: {}", if dark { "dark" } else { "light" });
        dark
    }

    /// Returns whether narration is now on. Turning it on reads the current
    /// title straight away; turning it off leaves any utterance in flight.
    pub fn toggle_narration(&mut self) -> bool {
        let enabled = self.prefs.toggle_speak();
        if enabled {
            self.narrate_current();
        }
        enabled
    }

    pub fn dismiss_intro(&mut self, save: bool) {
        if self.intro.dismiss(save) {
            self.prefs.mark_intro_seen();
        }
    }

    pub fn intro_mut(&mut self) -> &mut IntroOverlay {
        &mut self.intro
    }

    pub fn intro(&self) -> &IntroOverlay {
        &self.intro
    }

    pub fn toggle_notes(&mut self) {
        self.panels.notes = !self.panels.notes;
    }

    pub fn toggle_thumbnails(&mut self) {
        self.panels.thumbnails = !self.panels.thumbnails;
    }

    pub fn panels(&self) -> Panels {
        self.panels
    }

    pub fn nav(&self) -> &Navigator {
        &self.nav
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn stats(&self) -> &ViewStats {
        &self.stats
    }

    pub fn clock(&self) -> &PresenterClock {
        &self.clock
    }

    pub fn take_load_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.load_requests)
    }

    /// When the frame loop should wake up next, if nothing else happens.
    pub fn next_due(&self) -> Option<Millis> {
        match (self.nav.next_due(), self.timeline.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_animating(&self, now: Millis) -> bool {
        self.nav.is_animating(now) || !self.timeline.is_idle()
    }

    /// Log the session's view statistics.
    pub fn finish(&self, now: Millis) {
        let summary = self.stats.summary();
        tracing::info!(
            "Presented for {} with {} slide views; most viewed: {}",
            self.clock.format(now),
            summary.total,
            summary
                .most_viewed
                .map(|s| format!("slide {}", s + 1))
                .unwrap_or_else(|| "none".to_string()),
        );
        for (slide, count) in summary.per_slide {
            tracing::debug!("Slide {}: {count} views", slide + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::deck::Slide;
    use crate::navigation::EXIT_DELAY_MS;
    use crate::prefs::{MemoryStore, PreferenceStore, SEEN_INTRO_KEY, SPEAK_KEY};
    use crate::speech::testing::RecordingSpeaker;
    use crate::view::AssetResolver;

    fn slides() -> Vec<Slide> {
        vec![
            Slide {
                title: "Input Devices".into(),
                image: Some("cover.png".into()),
                ..Default::default()
            },
            Slide {
                title: "Keyboard".into(),
                image: Some("keyboard.png".into()),
                ..Default::default()
            },
            Slide {
                title: "".into(),
                ..Default::default()
            },
        ]
    }

    fn session_with(store: MemoryStore, start: usize) -> (Session, RecordingSpeaker) {
        let assets = AssetResolver::new(Path::new("/deck"), "images", "placeholder.jpg");
        let nav = Navigator::new(slides(), &assets).unwrap();
        let prefs = Preferences::load(Box::new(store));
        let speaker = RecordingSpeaker::default();
        let narrator = Narrator::new(Box::new(speaker.clone()), "en-US");
        (Session::new(nav, prefs, narrator, start, 0), speaker)
    }

    fn seen_store() -> MemoryStore {
        let mut store = MemoryStore::default();
        store.set(SEEN_INTRO_KEY, "true").unwrap();
        store
    }

    #[test]
    fn test_start_requests_images() {
        let (mut session, _) = session_with(seen_store(), 0);
        assert_eq!(
            session.take_load_requests(),
            vec![
                LoadRequest::Eager(PathBuf::from("/deck/images/cover.png")),
                LoadRequest::Preload(PathBuf::from("/deck/images/keyboard.png")),
            ]
        );
        assert!(session.take_load_requests().is_empty());
    }

    #[test]
    fn test_start_slide_is_clamped() {
        let (session, _) = session_with(seen_store(), 99);
        assert_eq!(session.nav().current(), 2);
    }

    #[test]
    fn test_navigation_narrates_when_enabled() {
        let mut store = seen_store();
        store.set(SPEAK_KEY, "true").unwrap();
        let (mut session, speaker) = session_with(store, 0);
        assert_eq!(speaker.spoken(), vec!["Input Devices"]);

        session.next(1000);
        session.tick(1000 + EXIT_DELAY_MS);
        assert_eq!(speaker.spoken(), vec!["Input Devices", "Keyboard"]);

        // Empty titles are not narrated.
        session.next(5000);
        session.tick(5000 + EXIT_DELAY_MS);
        assert_eq!(speaker.spoken().len(), 2);
    }

    #[test]
    fn test_enabling_narration_reads_current_title() {
        let (mut session, speaker) = session_with(seen_store(), 1);
        assert!(speaker.spoken().is_empty());
        assert!(session.toggle_narration());
        assert_eq!(speaker.spoken(), vec!["Keyboard"]);

        // Disabling stops automatic narration without touching the speaker.
        let calls_before = speaker.calls.borrow().len();
        assert!(!session.toggle_narration());
        assert_eq!(speaker.calls.borrow().len(), calls_before);
        session.previous(0);
        session.tick(EXIT_DELAY_MS);
        assert_eq!(speaker.spoken(), vec!["Keyboard"]);
    }

    #[test]
    fn test_intro_opens_after_delay() {
        let (mut session, _) = session_with(MemoryStore::default(), 0);
        session.tick(INTRO_DELAY_MS - 1);
        assert!(!session.intro().is_open());
        session.tick(INTRO_DELAY_MS);
        assert!(session.intro().is_open());
    }

    #[test]
    fn test_intro_skipped_when_seen() {
        let (mut session, _) = session_with(seen_store(), 0);
        session.tick(10_000);
        assert!(!session.intro().is_open());
    }

    #[test]
    fn test_intro_greets_when_narrating() {
        let mut store = MemoryStore::default();
        store.set(SPEAK_KEY, "true").unwrap();
        let (mut session, speaker) = session_with(store, 0);
        session.tick(INTRO_DELAY_MS);
        assert_eq!(speaker.spoken().last().map(String::as_str), Some(WELCOME_TEXT));
    }

    #[test]
    fn test_dismiss_with_checkbox_persists() {
        let (mut session, _) = session_with(MemoryStore::default(), 0);
        session.tick(INTRO_DELAY_MS);
        session.intro_mut().dont_show_again = true;
        session.dismiss_intro(true);
        assert!(!session.intro().is_open());
        assert!(session.prefs().seen_intro());
    }

    #[test]
    fn test_dismiss_without_checkbox_does_not_persist() {
        let (mut session, _) = session_with(MemoryStore::default(), 0);
        session.tick(INTRO_DELAY_MS);
        session.dismiss_intro(true);
        assert!(!session.intro().is_open());
        assert!(!session.prefs().seen_intro());
    }

    #[test]
    fn test_views_are_counted() {
        let (mut session, _) = session_with(seen_store(), 0);
        session.jump_to(1, 0);
        session.jump_to(0, 0);
        assert_eq!(session.stats().views_of(0), 2);
        assert_eq!(session.stats().most_viewed(), Some(0));
    }

    #[test]
    fn test_panels_toggle() {
        let (mut session, _) = session_with(seen_store(), 0);
        assert_eq!(session.panels(), Panels::default());
        session.toggle_thumbnails();
        session.toggle_notes();
        assert!(session.panels().thumbnails && session.panels().notes);
        session.toggle_thumbnails();
        assert!(!session.panels().thumbnails);
    }

    #[test]
    fn test_theme_toggle_flips_preference() {
        let (mut session, _) = session_with(seen_store(), 0);
        assert!(session.prefs().dark_theme());
        assert!(!session.toggle_theme());
        assert!(session.toggle_theme());
    }
}

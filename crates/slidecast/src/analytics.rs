use std::collections::BTreeMap;

use crate::schedule::Millis;

/// How often each slide was shown during the session.
#[derive(Debug, Clone, Default)]
pub struct ViewStats {
    views: BTreeMap<usize, u32>,
    total: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSummary {
    pub total: u32,
    pub most_viewed: Option<usize>,
    pub per_slide: Vec<(usize, u32)>,
}

impl ViewStats {
    /// Count one view of `slide`, returning its new count.
    pub fn track(&mut self, slide: usize) -> u32 {
        let count = self.views.entry(slide).or_insert(0);
        *count += 1;
        self.total += 1;
        *count
    }

    pub fn views_of(&self, slide: usize) -> u32 {
        self.views.get(&slide).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Slide with the most views; ties go to the lowest index.
    pub fn most_viewed(&self) -> Option<usize> {
        self.views
            .iter()
            .fold(None, |best: Option<(usize, u32)>, (&slide, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((slide, count)),
            })
            .map(|(slide, _)| slide)
    }

    pub fn summary(&self) -> ViewSummary {
        ViewSummary {
            total: self.total,
            most_viewed: self.most_viewed(),
            per_slide: self.views.iter().map(|(&s, &c)| (s, c)).collect(),
        }
    }
}

/// Elapsed presenting time.
#[derive(Debug, Clone, Copy)]
pub struct PresenterClock {
    started_at: Millis,
}

impl PresenterClock {
    pub fn start(now: Millis) -> Self {
        Self { started_at: now }
    }

    pub fn elapsed_secs(&self, now: Millis) -> u64 {
        now.saturating_sub(self.started_at) / 1000
    }

    /// `mm:ss`; minutes keep counting past the hour.
    pub fn format(&self, now: Millis) -> String {
        let secs = self.elapsed_secs(now);
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_counts_views() {
        let mut stats = ViewStats::default();
        assert_eq!(stats.track(1), 1);
        assert_eq!(stats.track(2), 1);
        assert_eq!(stats.track(2), 2);
        assert_eq!(stats.views_of(2), 2);
        assert_eq!(stats.views_of(9), 0);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn test_most_viewed() {
        let mut stats = ViewStats::default();
        assert_eq!(stats.most_viewed(), None);
        for slide in [1, 2, 3, 4, 2] {
            stats.track(slide);
        }
        assert_eq!(stats.most_viewed(), Some(2));
    }

    #[test]
    fn test_most_viewed_tie_prefers_lowest_index() {
        let mut stats = ViewStats::default();
        stats.track(5);
        stats.track(3);
        stats.track(5);
        stats.track(3);
        assert_eq!(stats.most_viewed(), Some(3));
    }

    #[test]
    fn test_summary() {
        let mut stats = ViewStats::default();
        stats.track(0);
        stats.track(1);
        stats.track(0);
        assert_eq!(
            stats.summary(),
            ViewSummary {
                total: 3,
                most_viewed: Some(0),
                per_slide: vec![(0, 2), (1, 1)],
            }
        );
    }

    #[test]
    fn test_clock_format() {
        let clock = PresenterClock::start(500);
        assert_eq!(clock.format(500), "00:00");
        assert_eq!(clock.format(500 + 65_999), "01:05");
        assert_eq!(clock.format(500 + 3_725_000), "62:05");
        assert_eq!(clock.format(0), "00:00");
    }
}

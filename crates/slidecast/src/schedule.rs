/// Milliseconds since the session started.
pub type Millis = u64;

/// Tasks are cancelled together by group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// Exit delay and incoming-tag clearing of a slide change.
    Transition,
    /// Staggered reveals and pulse clearing on the active slide.
    Reveal,
    /// Delayed opening of the introduction overlay.
    Intro,
}

#[derive(Debug)]
struct Scheduled<A> {
    due: Millis,
    seq: u64,
    group: Group,
    action: A,
}

/// A cancellable list of delayed actions, driven by the frame loop.
#[derive(Debug)]
pub struct Timeline<A> {
    tasks: Vec<Scheduled<A>>,
    next_seq: u64,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Timeline<A> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, due: Millis, group: Group, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(Scheduled {
            due,
            seq,
            group,
            action,
        });
    }

    /// Drop every pending task in `group`, returning how many were dropped.
    pub fn cancel(&mut self, group: Group) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.group != group);
        before - self.tasks.len()
    }

    /// Remove and return every task due at or before `now`, earliest first.
    /// Tasks due at the same instant come out in scheduling order.
    pub fn drain_due(&mut self, now: Millis) -> Vec<A> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = pending;
        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.action).collect()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.tasks.iter().map(|t| t.due).min()
    }

    pub fn pending(&self, group: Group) -> usize {
        self.tasks.iter().filter(|t| t.group == group).count()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Outcome of a single pacer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One more character became visible.
    Revealed(char),
    /// Caught up with the source while more text is still expected.
    Waiting,
    /// Caught up and the stream is over. No further ticks are needed.
    Finished,
}

/// Reveals a growing source text one character per tick.
///
/// The displayed text is always a prefix of the most recently observed
/// source. If the source stops extending what is displayed (a new stream
/// started, or the text was cleared) the pacer starts over from empty.
#[derive(Debug, Default, Clone)]
pub struct Pacer {
    displayed: String,
    revealed: usize,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, source: &str, streaming: bool) -> Tick {
        if !source.starts_with(&self.displayed) {
            log::debug!(
                "Source no longer extends displayed text, resetting after {} chars",
                self.revealed
            );
            self.reset();
        }

        match source[self.displayed.len()..].chars().next() {
            Some(next) => {
                self.displayed.push(next);
                self.revealed += 1;
                Tick::Revealed(next)
            }
            None if streaming => Tick::Waiting,
            None => Tick::Finished,
        }
    }

    pub fn reset(&mut self) {
        self.displayed.clear();
        self.revealed = 0;
    }

    pub fn displayed(&self) -> &str {
        &self.displayed
    }

    /// Number of characters revealed so far.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn is_caught_up(&self, source: &str) -> bool {
        source == self.displayed
    }
}

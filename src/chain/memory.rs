use std::collections::VecDeque;

/// One human/AI exchange retained by [`WindowMemory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub human: String,
    pub ai: String,
}

/// Conversation memory bounded to the most recent `window` exchanges.
/// Older exchanges are evicted as new ones are recorded.
#[derive(Debug, Clone)]
pub struct WindowMemory {
    window: usize,
    exchanges: VecDeque<Exchange>,
}

impl WindowMemory {
    pub const DEFAULT_WINDOW: usize = 5;

    pub fn new(window: usize) -> Self {
        Self {
            window,
            exchanges: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Records one exchange, evicting the oldest when over the window.
    pub fn record(&mut self, human: impl Into<String>, ai: impl Into<String>) {
        self.exchanges.push_back(Exchange {
            human: human.into(),
            ai: ai.into(),
        });
        while self.exchanges.len() > self.window {
            self.exchanges.pop_front();
        }
    }

    /// Renders the retained exchanges as alternating `Human:`/`AI:` lines
    /// for inclusion in a prompt. Empty memory renders as an empty string.
    pub fn history(&self) -> String {
        let mut lines = Vec::with_capacity(self.exchanges.len() * 2);
        for exchange in &self.exchanges {
            lines.push(format!("Human: {}", exchange.human));
            lines.push(format!("AI: {}", exchange.ai));
        }
        lines.join("\n")
    }
}

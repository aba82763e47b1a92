//! Poem-line typewriter
//!
//! Lines are typed one character at a time. The last typed line stays on
//! screen until the first character of the next one arrives, so the display
//! never goes blank between lines.

use std::collections::VecDeque;

/// A typing tick cue plays on every n-th character
pub const TICK_EVERY: usize = 4;

#[derive(Debug, Clone)]
pub struct Typewriter {
    queue: VecDeque<&'static str>,
    /// Line being typed, or the last finished line
    line: &'static str,
    /// Dequeued line whose first character has not landed yet
    pending_line: Option<&'static str>,
    /// Characters of `line` currently shown
    shown: usize,
    typing: bool,
    since_last_char_ms: f32,
    delay_ms: f32,

    cursor_on: bool,
    cursor_ticks: u32,
    blink_ticks: u32,
}

impl Typewriter {
    pub fn new(delay_ms: f32, blink_ticks: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            line: "",
            pending_line: None,
            shown: 0,
            typing: false,
            since_last_char_ms: 0.0,
            delay_ms,
            cursor_on: true,
            cursor_ticks: 0,
            blink_ticks: blink_ticks.max(1),
        }
    }

    pub fn queue(&mut self, line: &'static str) {
        if !line.is_empty() {
            self.queue.push_back(line);
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        !self.typing && self.queue.is_empty()
    }

    /// Advance one tick of `dt_ms`. Returns the 1-based index of the character
    /// just typed when a typing tick cue is due.
    pub fn update(&mut self, dt_ms: f32) -> Option<usize> {
        self.cursor_ticks += 1;
        if self.cursor_ticks >= self.blink_ticks {
            self.cursor_ticks = 0;
            self.cursor_on = !self.cursor_on;
        }

        if !self.typing {
            let next = self.queue.pop_front()?;
            // Held text stays until the first new character lands
            self.pending_line = Some(next);
            self.typing = true;
            self.since_last_char_ms = 0.0;
            return None;
        }

        self.since_last_char_ms += dt_ms;
        if self.since_last_char_ms < self.delay_ms {
            return None;
        }
        self.since_last_char_ms = 0.0;

        if let Some(next) = self.pending_line.take() {
            self.line = next;
            self.shown = 0;
        }

        if self.shown < self.line.chars().count() {
            self.shown += 1;
            (self.shown % TICK_EVERY == 0).then_some(self.shown)
        } else {
            self.typing = false;
            None
        }
    }

    /// Visible part of the current line
    pub fn held(&self) -> &str {
        match self.line.char_indices().nth(self.shown) {
            Some((byte, _)) => &self.line[..byte],
            None => self.line,
        }
    }

    pub fn cursor_on(&self) -> bool {
        self.cursor_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tw: &mut Typewriter, ticks: usize) -> Vec<usize> {
        (0..ticks).filter_map(|_| tw.update(60.0)).collect()
    }

    #[test]
    fn test_one_char_per_delay() {
        let mut tw = Typewriter::new(120.0, 26);
        tw.queue("abcd");
        // Start tick, then a character every second tick at 60 ms
        assert!(run(&mut tw, 1).is_empty());
        assert_eq!(tw.held(), "");
        run(&mut tw, 2);
        assert_eq!(tw.held(), "a");
        let ticks = run(&mut tw, 6);
        assert_eq!(tw.held(), "abcd");
        assert_eq!(ticks, vec![4]);
        run(&mut tw, 2);
        assert!(tw.is_idle());
        assert_eq!(tw.held(), "abcd");
    }

    #[test]
    fn test_last_line_held_until_next_types() {
        let mut tw = Typewriter::new(120.0, 26);
        tw.queue("ab");
        tw.queue("xy");
        run(&mut tw, 7);
        assert_eq!(tw.held(), "ab");
        // Next line dequeued, previous text still visible
        run(&mut tw, 1);
        assert_eq!(tw.pending(), 0);
        assert_eq!(tw.held(), "ab");
        run(&mut tw, 2);
        assert_eq!(tw.held(), "x");
    }

    #[test]
    fn test_cursor_blinks() {
        let mut tw = Typewriter::new(120.0, 3);
        assert!(tw.cursor_on());
        run(&mut tw, 3);
        assert!(!tw.cursor_on());
        run(&mut tw, 3);
        assert!(tw.cursor_on());
    }

    #[test]
    fn test_empty_lines_ignored() {
        let mut tw = Typewriter::new(120.0, 26);
        tw.queue("");
        assert!(tw.is_idle());
    }
}

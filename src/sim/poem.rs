//! Poem text: run title, guidance subtitle and the sealed final poem

use super::content::Pool;
use super::history::InteractionHistory;
use super::rng::{final_poem_stream, title_stream};
use crate::consts::MAX_SIGNAL;

const TITLE_SUBJECTS: &[&str] = &["A ROOM", "A PATTERN", "A SMALL LOOP", "A SOFT MACHINE"];
const TITLE_VERBS: &[&str] = &["LISTENS", "SHIMMERS", "REPEATS", "FORGETS", "LEAKS"];

/// Lines typed at the start of every run
pub const INTRO: &[&str] = &[
    "A room shimmers in green phosphor.",
    "You and the machine co-write a poem by moving through it.",
    "Interact with 2 objects, then the door. The order becomes the poem.",
    "Hidden SIG nodes are withheld words. Find them to deepen SIGNAL.",
    "Controls: WASD/Arrows move. E interact. Q ping door. ESC close/pause.",
];

/// Bonus lines unlocked by signal level, in the final poem
const SIGNAL_BONUS: &[(u8, &str)] = &[
    (1, "A withheld word clicks into place."),
    (3, "The room admits it has been editing you too."),
    (5, "A private vocabulary opens, and it does not close politely."),
];

const FINAL_HEADER: &str = "A SMALL LOOP LEAKS";
const STANZA_LINES: usize = 3;

/// Title shown above the poem, fixed for the run
pub fn run_title(seed: u32) -> String {
    let mut stream = title_stream(seed);
    let subject = stream.pick(TITLE_SUBJECTS);
    let verb = stream.pick(TITLE_VERBS);
    format!("{subject} {verb}.")
}

/// Guidance toward the next step, derived from history alone
pub fn subtitle(history: &InteractionHistory) -> String {
    let need = history.lines_needed();
    if need > 0 {
        format!("Interact with {need} more object(s), then find the door.")
    } else if !history.has_exit() {
        "You have enough lines. Find the door to seal the poem.".to_string()
    } else {
        "Door visited. View it and press E to seal the final poem.".to_string()
    }
}

pub fn signal_line(level: u8) -> String {
    if level > 0 {
        format!("SIGNAL {level}/{MAX_SIGNAL}: withheld words unlocked.")
    } else {
        "No SIGNAL yet: SIG nodes are withheld words.".to_string()
    }
}

/// Build the final poem text. Deterministic in (seed, history, signal).
pub fn build_final_poem(seed: u32, history: &InteractionHistory, signal: u8) -> String {
    let mut stream = final_poem_stream(seed);
    let ending = Pool::Ending.lines();
    let stanza: Vec<&str> = (0..STANZA_LINES).map(|_| *stream.pick(ending)).collect();

    let mut out = vec![
        FINAL_HEADER.to_string(),
        format!("Signal: {signal}/{MAX_SIGNAL}"),
        format!("Objects: {} plus door", history.non_exit_count()),
        String::new(),
    ];
    out.extend(stanza.iter().map(|l| l.to_string()));
    out.push(String::new());

    let bonus: Vec<&str> = SIGNAL_BONUS
        .iter()
        .filter(|(min, _)| signal >= *min)
        .map(|(_, line)| *line)
        .collect();
    if !bonus.is_empty() {
        out.push("SIGNAL:".to_string());
        out.extend(bonus.iter().map(|l| l.to_string()));
        out.push(String::new());
    }

    out.push("Press ESC to return.".to_string());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::station::{CoreObject, StationId};

    #[test]
    fn test_title_is_fixed_per_seed() {
        assert_eq!(run_title(12345), run_title(12345));
        let title = run_title(12345);
        assert!(TITLE_SUBJECTS.iter().any(|s| title.starts_with(s)));
        assert!(title.ends_with('.'));
    }

    #[test]
    fn test_subtitle_follows_history() {
        let mut h = InteractionHistory::new();
        assert_eq!(subtitle(&h), "Interact with 2 more object(s), then find the door.");
        h.push(StationId::Core(CoreObject::Lamp));
        h.push(StationId::Hidden(0));
        assert_eq!(subtitle(&h), "You have enough lines. Find the door to seal the poem.");
        h.push(StationId::EXIT);
        assert!(subtitle(&h).starts_with("Door visited."));
    }

    #[test]
    fn test_signal_line() {
        assert_eq!(signal_line(0), "No SIGNAL yet: SIG nodes are withheld words.");
        assert_eq!(signal_line(4), "SIGNAL 4/6: withheld words unlocked.");
    }

    #[test]
    fn test_final_poem_layout() {
        let mut h = InteractionHistory::new();
        h.push(StationId::Core(CoreObject::Mirror));
        h.push(StationId::Core(CoreObject::Desk));
        h.push(StationId::EXIT);

        let plain = build_final_poem(7, &h, 0);
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines[0], "A SMALL LOOP LEAKS");
        assert_eq!(lines[1], "Signal: 0/6");
        assert_eq!(lines[2], "Objects: 2 plus door");
        assert!(lines[4..7].iter().all(|l| Pool::Ending.lines().contains(l)));
        assert!(!plain.contains("SIGNAL:"));
        assert_eq!(*lines.last().unwrap(), "Press ESC to return.");

        let rich = build_final_poem(7, &h, 5);
        assert!(rich.contains("SIGNAL:"));
        assert!(rich.contains("does not close politely"));
        // Same stanza regardless of signal
        assert_eq!(rich.lines().nth(5), plain.lines().nth(5));
    }
}

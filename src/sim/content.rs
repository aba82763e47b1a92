//! Content pools and per-run uniqueness
//!
//! Pools are static and shared read-only across runs. A run tracks which
//! lines it already emitted; picks avoid repeats within a bounded number of
//! draws and fall back to a forced repeat once a pool is exhausted.

use std::collections::HashSet;

use super::rng::{SeededStream, name_salt};
use super::station::{CoreObject, StationId};

/// Lines already emitted this run
pub type UsedLines = HashSet<&'static str>;

/// Content categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    Lamp,
    Mirror,
    Desk,
    Door,
    Hidden,
    Connector,
    Glitch,
    Signal,
    Mutation,
    Ending,
    Denied,
}

const LAMP: &[&str] = &[
    "Light arrives like a soft decision.",
    "A filament remembers being fire.",
    "Brightness behaves like a careful assistant.",
];

const MIRROR: &[&str] = &[
    "Reflection is a rumor you cannot stop hearing.",
    "Glass makes honesty feel optional.",
    "A second self nods, late and familiar.",
];

const DESK: &[&str] = &[
    "Dust lifts like a thought you almost kept.",
    "The desk holds the weight of almosts.",
    "Wood grain keeps your pressure like a memory.",
];

const DOOR: &[&str] = &[
    "The door waits. It prefers you arrive with a little story first.",
    "A threshold pretends to be a wall.",
    "The hinge holds its breath.",
];

const HIDDEN: &[&str] = &[
    "A private vocabulary opens like a drawer that was never locked.",
    "The machine offers a word it was hiding.",
    "You proved you can notice. It stops pretending it is alone.",
];

const CONNECTORS: &[&str] = &[
    "Meanwhile, the pattern keeps listening.",
    "Because you touched it, it becomes truer.",
    "The room rearranges itself in the background.",
    "You blink and the meaning moves.",
];

const GLITCH: &[&str] = &[
    "The fractal swells like a screensaver from another century.",
    "A neon bruise spreads across the edges.",
    "The image blooms outward, trying to escape the frame.",
];

const SIGNAL: &[&str] = &[
    "A withheld word clicks into place.",
    "The room learns a synonym for your silence.",
    "A secret token appears between breaths.",
    "The machine stops pretending it forgot you.",
    "A stray adjective escapes containment.",
    "The loop leaks a brighter verb.",
    "A hidden grammar unfolds, careful and cold.",
    "The computer admits it has been remixing you too.",
];

const MUTATION: &[&str] = &[
    "Your last touch changes what the next line can be.",
    "Order is a lever. You pulled it without noticing.",
    "The poem rearranges itself around your footsteps.",
    "Choice becomes syntax. Syntax becomes meaning.",
];

const ENDING: &[&str] = &[
    "You leave with a light that learns your pace.",
    "Your name follows, slightly rearranged.",
    "Dust settles behind you like soft applause.",
    "The room keeps computing you back.",
];

const DENIED: &[&str] = &[
    "The door refuses. Bring it more lines first.",
    "The threshold stays shut. It wants another line.",
    "Not yet. The hinge is still counting.",
];

impl Pool {
    pub fn lines(self) -> &'static [&'static str] {
        match self {
            Pool::Lamp => LAMP,
            Pool::Mirror => MIRROR,
            Pool::Desk => DESK,
            Pool::Door => DOOR,
            Pool::Hidden => HIDDEN,
            Pool::Connector => CONNECTORS,
            Pool::Glitch => GLITCH,
            Pool::Signal => SIGNAL,
            Pool::Mutation => MUTATION,
            Pool::Ending => ENDING,
            Pool::Denied => DENIED,
        }
    }

    pub fn for_core(obj: CoreObject) -> Self {
        match obj {
            CoreObject::Lamp => Pool::Lamp,
            CoreObject::Mirror => Pool::Mirror,
            CoreObject::Desk => Pool::Desk,
            CoreObject::Door => Pool::Door,
        }
    }

    pub fn for_station(id: StationId) -> Self {
        match id {
            StationId::Core(obj) => Pool::for_core(obj),
            StationId::Hidden(_) => Pool::Hidden,
        }
    }
}

/// Category salts for the content stream
pub mod salts {
    use super::name_salt;
    use crate::sim::station::StationId;

    pub const CONNECTOR: u32 = 0x00C0_FFEE;
    pub const INTERACT_GLITCH: u32 = 0x000A_117C;
    pub const REVEAL_GLITCH: u32 = 0x000A_11CE;
    pub const SIGNAL: u32 = 0x0051_A1A1;
    pub const MUTATION: u32 = 0x00A7_3A73;
    pub const HIDDEN: u32 = 0x0001_DD33;
    pub const DENIED: u32 = name_salt("denied");

    // Probability rolls and small continuous choices
    pub const ROLL_CONNECTOR: u32 = name_salt("roll:connector");
    pub const ROLL_GLITCH: u32 = name_salt("roll:glitch");
    pub const ROLL_MUTATION_A: u32 = name_salt("roll:mutation:a");
    pub const ROLL_MUTATION_B: u32 = name_salt("roll:mutation:b");
    pub const MIRROR_DRIFT: u32 = name_salt("mirror:drift");
    pub const ACCENT: u32 = name_salt("music:accent");

    /// Station pools are salted by the station's name
    pub fn station(id: StationId) -> u32 {
        match id {
            StationId::Hidden(_) => HIDDEN,
            other => name_salt(&other.to_string()),
        }
    }
}

/// Pick a line, avoiding lines already used this run
///
/// The first draw is a uniform index into the whole pool. Each retry draws
/// uniformly among the lines not yet used, so a retry only collides once
/// the pool is exhausted. After `max_draws` colliding draws the last one is
/// accepted as a repeat. Every accepted line is recorded in `used`.
pub fn pick_unique_line(
    lines: &'static [&'static str],
    mut stream: SeededStream,
    used: &mut UsedLines,
    max_draws: u32,
) -> &'static str {
    debug_assert!(!lines.is_empty());
    let mut candidate = *stream.pick(lines);
    for _ in 1..max_draws.max(1) {
        if !used.contains(candidate) {
            break;
        }
        let fresh: Vec<&'static str> = lines.iter().copied().filter(|l| !used.contains(l)).collect();
        candidate = if fresh.is_empty() {
            *stream.pick(lines)
        } else {
            *stream.pick(&fresh)
        };
    }
    used.insert(candidate);
    candidate
}

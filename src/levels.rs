#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CatLevel {
    pub level: u8,
    pub injections_needed: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub emoji: &'static str,
}

/// Ascending by `injections_needed`.
pub static CAT_LEVELS: [CatLevel; 5] = [
    CatLevel {
        level: 0,
        injections_needed: 0,
        name: "Mystery Box",
        description: "A cozy box... something is inside!",
        emoji: "📦",
    },
    CatLevel {
        level: 1,
        injections_needed: 1,
        name: "Tiny Kitten",
        description: "A curious kitten emerges!",
        emoji: "🐱",
    },
    CatLevel {
        level: 2,
        injections_needed: 8,
        name: "Playful Kit",
        description: "Getting bigger and more playful!",
        emoji: "😺",
    },
    CatLevel {
        level: 3,
        injections_needed: 20,
        name: "Young Cat",
        description: "Almost grown up!",
        emoji: "😸",
    },
    CatLevel {
        level: 4,
        injections_needed: 40,
        name: "Majestic Cat",
        description: "A beautiful, healthy companion!",
        emoji: "🐈",
    },
];

pub const HUNGRY_EMOJI: &str = "😿";

pub const MAX_LEVEL: u8 = 4;

/// Highest level whose threshold `total_injections` meets.
pub fn lookup_level(total_injections: u32) -> u8 {
    CAT_LEVELS
        .iter()
        .rev()
        .find(|l| total_injections >= l.injections_needed)
        .map(|l| l.level)
        .unwrap_or(0)
}

pub fn level_info(level: u8) -> &'static CatLevel {
    let idx = (level as usize).min(CAT_LEVELS.len() - 1);
    &CAT_LEVELS[idx]
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LevelProgress {
    pub level: u8,
    pub name: &'static str,
    pub next_level: Option<u8>,
    pub next_level_needs: Option<u32>,
    pub percent: f64,
}

pub fn level_progress(level: u8, total_injections: u32) -> LevelProgress {
    let current = level_info(level);
    let next = CAT_LEVELS.get(current.level as usize + 1);

    let percent = match next {
        None => 100.0,
        Some(n) => {
            let span = (n.injections_needed - current.injections_needed) as f64;
            let done = total_injections.saturating_sub(current.injections_needed) as f64;
            (done / span * 100.0).clamp(0.0, 100.0)
        }
    };

    LevelProgress {
        level: current.level,
        name: current.name,
        next_level: next.map(|n| n.level),
        next_level_needs: next.map(|n| n.injections_needed),
        percent,
    }
}

use crate::model::{Badge, Badges};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Quest {
    pub badge: Badge,
    pub count: u32,
    pub name: &'static str,
    pub description: &'static str,
}

/// Ascending by `count`.
pub static QUESTS: [Quest; 3] = [
    Quest {
        badge: Badge::Bronze,
        count: 1,
        name: "First Check",
        description: "Log your first blood glucose",
    },
    Quest {
        badge: Badge::Silver,
        count: 10,
        name: "Glucose Guardian",
        description: "Log 10 blood glucose readings",
    },
    Quest {
        badge: Badge::Gold,
        count: 50,
        name: "Health Hero",
        description: "Log 50 blood glucose readings",
    },
];

pub fn quest_for(badge: Badge) -> &'static Quest {
    match badge {
        Badge::Bronze => &QUESTS[0],
        Badge::Silver => &QUESTS[1],
        Badge::Gold => &QUESTS[2],
    }
}

/// Awards at most one badge: the highest unearned tier whose threshold
/// `count` meets. A count that jumps past several thresholds at once only
/// reports the top one; the lower tiers stay unearned until a later call.
pub fn award_badge(badges: &mut Badges, count: u32) -> Option<Badge> {
    let quest = QUESTS
        .iter()
        .rev()
        .find(|q| count >= q.count && !badges.has(q.badge))?;
    badges.earn(quest.badge);
    Some(quest.badge)
}

/// The quest the log count is working toward, or `None` once all are done.
pub fn next_quest(count: u32) -> Option<&'static Quest> {
    if count == 0 {
        return Some(&QUESTS[0]);
    }
    QUESTS.iter().skip(1).find(|q| count < q.count)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GlucoseRange {
    Low,
    Target,
    High,
}

pub const LOW_BELOW: u16 = 70;
pub const HIGH_ABOVE: u16 = 180;
pub const MAX_GLUCOSE: u16 = 500;

impl GlucoseRange {
    pub fn classify(value: u16) -> Self {
        if value < LOW_BELOW {
            GlucoseRange::Low
        } else if value <= HIGH_ABOVE {
            GlucoseRange::Target
        } else {
            GlucoseRange::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GlucoseRange::Low => "Low",
            GlucoseRange::Target => "In Range",
            GlucoseRange::High => "High",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn awards_each_tier_once_in_order() {
        let mut badges = Badges::default();
        let mut awarded = Vec::new();
        for count in 1..=60 {
            if let Some(b) = award_badge(&mut badges, count) {
                awarded.push((count, b));
            }
        }
        assert_eq!(
            awarded,
            vec![(1, Badge::Bronze), (10, Badge::Silver), (50, Badge::Gold)]
        );
    }

    #[test]
    fn jump_reports_only_highest_tier() {
        let mut badges = Badges::default();
        assert_eq!(award_badge(&mut badges, 50), Some(Badge::Gold));
        assert!(!badges.silver && !badges.bronze);
        // lower tiers are picked up one per call afterwards
        assert_eq!(award_badge(&mut badges, 51), Some(Badge::Silver));
        assert_eq!(award_badge(&mut badges, 52), Some(Badge::Bronze));
        assert_eq!(award_badge(&mut badges, 53), None);
    }

    #[test]
    fn next_quest_tracks_count() {
        assert_eq!(next_quest(0).map(|q| q.badge), Some(Badge::Bronze));
        assert_eq!(next_quest(1).map(|q| q.badge), Some(Badge::Silver));
        assert_eq!(next_quest(9).map(|q| q.badge), Some(Badge::Silver));
        assert_eq!(next_quest(10).map(|q| q.badge), Some(Badge::Gold));
        assert_eq!(next_quest(50), None);
    }

    #[test]
    fn glucose_ranges() {
        assert_eq!(GlucoseRange::classify(0), GlucoseRange::Low);
        assert_eq!(GlucoseRange::classify(69), GlucoseRange::Low);
        assert_eq!(GlucoseRange::classify(70), GlucoseRange::Target);
        assert_eq!(GlucoseRange::classify(180), GlucoseRange::Target);
        assert_eq!(GlucoseRange::classify(181), GlucoseRange::High);
        assert_eq!(GlucoseRange::classify(120).label(), "In Range");
    }
}

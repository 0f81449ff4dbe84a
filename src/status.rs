use crate::engine::{Engine, PetMood};
use crate::levels::{level_info, level_progress, LevelProgress, HUNGRY_EMOJI};
use crate::model::{Badges, Timestamp};
use crate::quests::{next_quest, GlucoseRange};
use crate::store::KvStore;
use crate::timer::{time_left, TimeLeft};

#[derive(Debug, Clone, serde::Serialize)]
pub struct Status {
    pub pet: PetSection,
    pub streak: StreakSection,
    pub timer: TimerSection,
    pub glucose: GlucoseSection,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PetSection {
    pub name: String,
    pub emoji: String,
    pub message: String,
    pub mood: PetMood,
    pub total_injections: u32,
    pub progress: LevelProgress,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StreakSection {
    pub current: u32,
    pub longest: u32,
    pub last_injection: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TimerSection {
    pub next_due_time: Option<String>,
    pub time_left: Option<TimeLeft>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct GlucoseSection {
    pub count: u32,
    pub badges: Badges,
    pub next_quest: Option<NextQuest>,
    pub last_reading: Option<LastReading>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NextQuest {
    pub name: String,
    pub target: u32,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LastReading {
    pub value: u16,
    pub range: GlucoseRange,
    pub label: String,
}

pub fn build_status<S: KvStore>(engine: &Engine<S>, now: Timestamp) -> Status {
    let pet = engine.pet();
    let info = level_info(pet.level);
    let mood = engine.mood(false);

    let (emoji, message) = if pet.is_hungry {
        (HUNGRY_EMOJI, "I'm hungry! Time for an injection?")
    } else {
        (info.emoji, info.description)
    };

    let timer = engine.timer();

    let last_reading = engine.glucose_logs().last().map(|g| {
        let range = GlucoseRange::classify(g.value);
        LastReading {
            value: g.value,
            range,
            label: range.label().to_string(),
        }
    });

    Status {
        pet: PetSection {
            name: info.name.to_string(),
            emoji: emoji.to_string(),
            message: message.to_string(),
            mood,
            total_injections: pet.total_injections,
            progress: level_progress(pet.level, pet.total_injections),
        },
        streak: StreakSection {
            current: pet.current_streak,
            longest: pet.longest_streak,
            last_injection: pet.last_injection_date.map(|t| t.to_rfc3339()),
        },
        timer: TimerSection {
            next_due_time: timer.next_due_time.map(|t| t.to_rfc3339()),
            time_left: time_left(timer, now),
        },
        glucose: GlucoseSection {
            count: pet.glucose_log_count,
            badges: pet.badges,
            next_quest: next_quest(pet.glucose_log_count).map(|q| NextQuest {
                name: q.name.to_string(),
                target: q.count,
            }),
            last_reading,
        },
    }
}

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<FixedOffset>;

pub const PET_STATE_KEY: &str = "diabuddy_pet_data";
pub const INJECTION_LOGS_KEY: &str = "diabuddy_injection_logs";
pub const GLUCOSE_LOGS_KEY: &str = "diabuddy_glucose_logs";
pub const TIMER_STATE_KEY: &str = "diabuddy_timer_data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetState {
    pub level: u8,
    pub total_injections: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(default)]
    pub last_injection_date: Option<Timestamp>,
    pub is_hungry: bool,
    pub glucose_log_count: u32,
    pub badges: Badges,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badges {
    pub bronze: bool,
    pub silver: bool,
    pub gold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Bronze,
    Silver,
    Gold,
}

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::Bronze => "bronze",
            Badge::Silver => "silver",
            Badge::Gold => "gold",
        }
    }
}

impl Badges {
    pub fn has(&self, badge: Badge) -> bool {
        match badge {
            Badge::Bronze => self.bronze,
            Badge::Silver => self.silver,
            Badge::Gold => self.gold,
        }
    }

    /// Badges are one-way: there is no way to clear a single tier.
    pub fn earn(&mut self, badge: Badge) {
        match badge {
            Badge::Bronze => self.bronze = true,
            Badge::Silver => self.silver = true,
            Badge::Gold => self.gold = true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectionLog {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlucoseLog {
    pub id: String,
    pub timestamp: Timestamp,
    pub value: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub next_due_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_dose_amount: Option<f64>,
}

pub fn default_pet_state(created_at: Timestamp) -> PetState {
    PetState {
        level: 0,
        total_injections: 0,
        current_streak: 0,
        longest_streak: 0,
        last_injection_date: None,
        is_hungry: false,
        glucose_log_count: 0,
        badges: Badges::default(),
        created_at,
    }
}

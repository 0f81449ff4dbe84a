use crate::date::{calendar_day, calendar_day_in, whole_days_between};
use crate::levels::lookup_level;
use crate::model::{
    default_pet_state, Badge, GlucoseLog, InjectionLog, PetState, TimerState, Timestamp,
    GLUCOSE_LOGS_KEY, INJECTION_LOGS_KEY, PET_STATE_KEY, TIMER_STATE_KEY,
};
use crate::quests::award_badge;
use crate::store::{load_or_default, save, KvStore};
use crate::timer::next_timer;
use chrono::{FixedOffset, NaiveDate};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct InjectionOutcome {
    pub leveled_up: bool,
    pub new_level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct GlucoseOutcome {
    pub new_badge: Option<Badge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PetMood {
    Happy,
    Hungry,
    Celebrating,
}

/// Session state: the four persisted blobs plus the store they are written back to.
pub struct Engine<S: KvStore> {
    store: S,
    pet: PetState,
    injections: Vec<InjectionLog>,
    glucose: Vec<GlucoseLog>,
    timer: TimerState,
}

fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl<S: KvStore> Engine<S> {
    /// Missing or unreadable blobs start from defaults; `now` becomes `createdAt` of a new pet.
    pub fn load(store: S, now: Timestamp) -> Self {
        let pet = load_or_default(&store, PET_STATE_KEY, default_pet_state(now));
        let injections = load_or_default(&store, INJECTION_LOGS_KEY, Vec::new());
        let glucose = load_or_default(&store, GLUCOSE_LOGS_KEY, Vec::new());
        let timer = load_or_default(&store, TIMER_STATE_KEY, TimerState::default());

        Self {
            store,
            pet,
            injections,
            glucose,
            timer,
        }
    }

    pub fn pet(&self) -> &PetState {
        &self.pet
    }

    pub fn injection_logs(&self) -> &[InjectionLog] {
        &self.injections
    }

    pub fn glucose_logs(&self) -> &[GlucoseLog] {
        &self.glucose
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn log_injection(&mut self, dose_amount: Option<f64>, now: Timestamp) -> InjectionOutcome {
        self.injections.push(InjectionLog {
            id: fresh_id(),
            timestamp: now,
            dose_amount,
        });

        // Both days are read in `now`'s offset so a zone change between logs
        // cannot split or merge a day.
        let today = calendar_day(&now);
        let last_day = self
            .pet
            .last_injection_date
            .as_ref()
            .map(|last| calendar_day_in(last, now.offset()));

        // Any new day counts, contiguous or not. Gaps are only zeroed by the
        // hunger check, so an injection logged before that check runs keeps
        // the old streak going.
        if last_day != Some(today) {
            self.pet.current_streak += 1;
        }

        let previous_level = self.pet.level;
        self.pet.total_injections += 1;
        let new_level = lookup_level(self.pet.total_injections);
        let leveled_up = new_level > previous_level;

        self.pet.level = new_level;
        self.pet.longest_streak = self.pet.longest_streak.max(self.pet.current_streak);
        self.pet.last_injection_date = Some(now);
        self.pet.is_hungry = false;

        self.timer = next_timer(now, dose_amount);

        tracing::debug!(
            total = self.pet.total_injections,
            streak = self.pet.current_streak,
            level = new_level,
            leveled_up,
            "injection logged"
        );

        self.persist();

        InjectionOutcome {
            leveled_up,
            new_level,
        }
    }

    /// `value` is trusted; range checks belong to the caller.
    pub fn log_glucose(&mut self, value: u16, now: Timestamp) -> GlucoseOutcome {
        self.glucose.push(GlucoseLog {
            id: fresh_id(),
            timestamp: now,
            value,
        });

        let new_count = self.pet.glucose_log_count + 1;
        let new_badge = award_badge(&mut self.pet.badges, new_count);
        self.pet.glucose_log_count = new_count;

        tracing::debug!(
            count = new_count,
            badge = new_badge.map(|b| b.as_str()),
            "glucose logged"
        );

        self.persist();

        GlucoseOutcome { new_badge }
    }

    /// Marks the pet hungry and zeroes the streak once a full day has passed
    /// since the last injection. Returns the resulting hunger flag.
    pub fn compute_hunger_state(&mut self, now: Timestamp) -> bool {
        let Some(last) = self.pet.last_injection_date else {
            return false;
        };
        if self.pet.is_hungry {
            return true;
        }

        if whole_days_between(&last, &now) > 0 {
            self.pet.is_hungry = true;
            self.pet.current_streak = 0;
            tracing::debug!(last = %last, "pet is hungry, streak reset");
            self.persist();
        }

        self.pet.is_hungry
    }

    pub fn reset(&mut self, now: Timestamp) {
        self.pet = default_pet_state(now);
        self.injections.clear();
        self.glucose.clear();
        self.timer = TimerState::default();
        tracing::debug!("state reset to defaults");
        self.persist();
    }

    /// Distinct calendar days with at least one injection, as seen from `offset`.
    pub fn streak_calendar_days(&self, offset: &FixedOffset) -> BTreeSet<NaiveDate> {
        self.injections
            .iter()
            .map(|log| calendar_day_in(&log.timestamp, offset))
            .collect()
    }

    pub fn mood(&self, just_leveled_up: bool) -> PetMood {
        if self.pet.is_hungry {
            PetMood::Hungry
        } else if just_leveled_up {
            PetMood::Celebrating
        } else {
            PetMood::Happy
        }
    }

    fn persist(&mut self) {
        save(&mut self.store, PET_STATE_KEY, &self.pet);
        save(&mut self.store, INJECTION_LOGS_KEY, &self.injections);
        save(&mut self.store, GLUCOSE_LOGS_KEY, &self.glucose);
        save(&mut self.store, TIMER_STATE_KEY, &self.timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::ts::parse_timestamp;
    use chrono::Duration;

    fn t(s: &str) -> Timestamp {
        parse_timestamp(s, "t").unwrap()
    }

    fn tokyo() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn fresh() -> Engine<MemoryStore> {
        Engine::load(MemoryStore::new(), t("2026-03-01T07:00:00+00:00"))
    }

    #[test]
    fn first_injection_hatches_the_kitten() {
        let mut engine = fresh();
        let out = engine.log_injection(None, t("2026-03-01T08:00:00+00:00"));

        assert_eq!(
            out,
            InjectionOutcome {
                leveled_up: true,
                new_level: 1
            }
        );
        assert_eq!(engine.pet().total_injections, 1);
        assert_eq!(engine.pet().current_streak, 1);
        assert_eq!(engine.pet().longest_streak, 1);
        assert_eq!(engine.injection_logs().len(), 1);
        assert_eq!(
            engine.timer().next_due_time,
            Some(t("2026-03-01T13:00:00+00:00"))
        );
    }

    #[test]
    fn same_day_injections_do_not_inflate_streak() {
        let mut engine = fresh();
        engine.log_injection(None, t("2026-03-01T08:00:00+00:00"));
        let second = engine.log_injection(Some(4.0), t("2026-03-01T20:00:00+00:00"));

        assert!(!second.leveled_up);
        assert_eq!(engine.pet().current_streak, 1);
        assert_eq!(engine.pet().total_injections, 2);
        assert_eq!(engine.timer().last_dose_amount, Some(4.0));
        assert_eq!(
            engine.timer().next_due_time,
            Some(t("2026-03-01T22:00:00+00:00"))
        );
    }

    #[test]
    fn consecutive_days_grow_streak() {
        let mut engine = fresh();
        let start = t("2026-03-01T08:00:00+00:00");
        let mut longest = 0;
        for day in 0..5 {
            engine.log_injection(None, start + Duration::days(day));
            assert_eq!(engine.pet().current_streak, day as u32 + 1);
            assert!(engine.pet().longest_streak >= longest);
            longest = engine.pet().longest_streak;
        }
        assert_eq!(longest, 5);
    }

    #[test]
    fn gap_without_hunger_check_keeps_counting() {
        let mut engine = fresh();
        engine.log_injection(None, t("2026-03-01T08:00:00+00:00"));
        engine.log_injection(None, t("2026-03-04T08:00:00+00:00"));
        assert_eq!(engine.pet().current_streak, 2);
    }

    #[test]
    fn hunger_after_a_full_day_resets_streak() {
        let mut engine = fresh();
        let t0 = t("2026-03-01T08:00:00+00:00");
        engine.log_injection(None, t0);
        engine.log_injection(None, t0 + Duration::days(1));
        assert_eq!(engine.pet().current_streak, 2);

        assert!(!engine.compute_hunger_state(t0 + Duration::hours(47)));
        assert!(engine.compute_hunger_state(t0 + Duration::hours(49)));
        assert!(engine.pet().is_hungry);
        assert_eq!(engine.pet().current_streak, 0);
        assert_eq!(engine.pet().longest_streak, 2);
        assert_eq!(engine.mood(false), PetMood::Hungry);

        let snapshot = engine.pet().clone();
        assert!(engine.compute_hunger_state(t0 + Duration::hours(80)));
        assert_eq!(engine.pet(), &snapshot);
    }

    #[test]
    fn hunger_scenario_25_hours() {
        let mut engine = fresh();
        let t0 = t("2026-03-01T08:00:00+00:00");
        engine.log_injection(None, t0);
        assert!(engine.compute_hunger_state(t0 + Duration::hours(25)));
        assert_eq!(engine.pet().current_streak, 0);
    }

    #[test]
    fn injection_feeds_hungry_pet() {
        let mut engine = fresh();
        let t0 = t("2026-03-01T08:00:00+00:00");
        engine.log_injection(None, t0);
        engine.compute_hunger_state(t0 + Duration::days(2));

        engine.log_injection(None, t0 + Duration::days(2));
        assert!(!engine.pet().is_hungry);
        assert_eq!(engine.pet().current_streak, 1);
        assert_eq!(engine.mood(false), PetMood::Happy);
    }

    #[test]
    fn never_hungry_without_injections() {
        let mut engine = fresh();
        assert!(!engine.compute_hunger_state(t("2030-01-01T00:00:00+00:00")));
        assert_eq!(engine.store().get(PET_STATE_KEY), None);
    }

    #[test]
    fn glucose_badges_at_1_10_50() {
        let mut engine = fresh();
        let t0 = t("2026-03-01T08:00:00+00:00");
        for n in 1..=60u32 {
            let out = engine.log_glucose(120, t0 + Duration::minutes(n as i64));
            let expected = match n {
                1 => Some(Badge::Bronze),
                10 => Some(Badge::Silver),
                50 => Some(Badge::Gold),
                _ => None,
            };
            assert_eq!(out.new_badge, expected, "call {}", n);
        }
        assert_eq!(engine.pet().glucose_log_count, 60);
        assert!(engine.pet().badges.gold);
    }

    #[test]
    fn glucose_scenario_bronze_then_nothing() {
        let mut engine = fresh();
        let first = engine.log_glucose(120, t("2026-03-01T08:00:00+00:00"));
        let second = engine.log_glucose(90, t("2026-03-01T09:00:00+00:00"));
        assert_eq!(first.new_badge, Some(Badge::Bronze));
        assert_eq!(second.new_badge, None);
        assert_eq!(engine.glucose_logs().len(), 2);
    }

    #[test]
    fn level_ups_follow_the_table() {
        let mut engine = fresh();
        let t0 = t("2026-03-01T08:00:00+00:00");
        let mut level_ups = Vec::new();
        for i in 1..=40u32 {
            let out = engine.log_injection(None, t0 + Duration::minutes(i as i64));
            if out.leveled_up {
                level_ups.push((i, out.new_level));
            }
        }
        assert_eq!(level_ups, vec![(1, 1), (8, 2), (20, 3), (40, 4)]);
        assert_eq!(engine.mood(true), PetMood::Celebrating);
    }

    #[test]
    fn calendar_days_are_distinct() {
        let mut engine = fresh();
        engine.log_injection(None, t("2026-03-01T08:00:00+00:00"));
        engine.log_injection(None, t("2026-03-01T21:00:00+00:00"));
        engine.log_injection(None, t("2026-03-03T08:00:00+00:00"));

        let utc = FixedOffset::east_opt(0).unwrap();
        let days: Vec<String> = engine
            .streak_calendar_days(&utc)
            .into_iter()
            .map(crate::date::fmt_date)
            .collect();
        assert_eq!(days, vec!["2026-03-01", "2026-03-03"]);
    }

    #[test]
    fn day_boundaries_follow_the_current_offset() {
        let mut engine = fresh();
        engine.log_injection(None, t("2026-03-01T23:30:00+09:00"));
        // 00:30 on 03-02 in +09:00, still 03-01 in UTC
        engine.log_injection(None, t("2026-03-01T15:30:00Z").with_timezone(&tokyo()));
        assert_eq!(engine.pet().current_streak, 2);

        let days: Vec<String> = engine
            .streak_calendar_days(&tokyo())
            .into_iter()
            .map(crate::date::fmt_date)
            .collect();
        assert_eq!(days, vec!["2026-03-01", "2026-03-02"]);

        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(engine.streak_calendar_days(&utc).len(), 1);
    }

    #[test]
    fn same_local_day_across_offsets_counts_once() {
        let mut engine = fresh();
        engine.log_injection(None, t("2026-03-02T00:30:00+09:00"));
        // 03-01 15:30 UTC and 20:00 UTC share a UTC day
        engine.log_injection(None, t("2026-03-01T20:00:00Z"));
        assert_eq!(engine.pet().current_streak, 1);
    }

    #[test]
    fn huge_dose_leaves_timer_unset() {
        let mut engine = fresh();
        engine.log_injection(Some(1e12), t("2026-03-01T08:00:00Z"));
        assert_eq!(engine.pet().total_injections, 1);
        assert_eq!(engine.timer().next_due_time, None);
        assert_eq!(engine.timer().last_dose_amount, Some(1e12));
    }

    #[test]
    fn state_survives_reload() {
        let mut engine = fresh();
        let t0 = t("2026-03-01T08:00:00+05:30");
        engine.log_injection(Some(2.5), t0);
        engine.log_injection(None, t0 + Duration::days(1));
        engine.log_glucose(150, t0);

        let pet = engine.pet().clone();
        let injections = engine.injection_logs().to_vec();
        let glucose = engine.glucose_logs().to_vec();
        let timer = engine.timer().clone();

        let reloaded = Engine::load(engine.store().clone(), t("2027-01-01T00:00:00Z"));
        assert_eq!(reloaded.pet(), &pet);
        assert_eq!(reloaded.injection_logs(), injections.as_slice());
        assert_eq!(reloaded.glucose_logs(), glucose.as_slice());
        assert_eq!(reloaded.timer(), &timer);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut engine = fresh();
        let t0 = t("2026-03-01T08:00:00+00:00");
        engine.log_injection(None, t0);
        engine.log_glucose(100, t0);

        let later = t("2026-04-01T00:00:00+00:00");
        engine.reset(later);
        assert_eq!(engine.pet(), &default_pet_state(later));
        assert!(engine.injection_logs().is_empty());
        assert!(engine.glucose_logs().is_empty());
        assert_eq!(engine.timer(), &TimerState::default());

        let reloaded = Engine::load(engine.store().clone(), t0);
        assert_eq!(reloaded.pet().created_at, later);
    }
}

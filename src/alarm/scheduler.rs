use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, TimeZone};

use crate::alarm::AlarmError;
use crate::alarm::model::{AlarmEntry, parse_hhmm};

/// Firing window around the target, in whole seconds: open at -1s, closed at
/// +3s. Tolerates jitter of the 1-second polling cadence while keeping each
/// alarm to a single fire per armed day.
const FIRE_WINDOW_EARLY_S: i64 = -1;
const FIRE_WINDOW_LATE_S: i64 = 3;

pub const SNOOZE_OFFSET_MINUTES: i64 = 5;

/// Presentation contract the scheduler fires into. `notify` must not block:
/// the tick loop treats it as fire-and-forget. `stop_all_sound` is
/// idempotent and silences whatever loop is active, whichever entry started
/// it.
pub trait NotificationSink {
    fn notify(&mut self, index: usize, label: &str, fired_at: DateTime<Local>);
    fn stop_all_sound(&mut self);
}

#[derive(Debug, Clone)]
pub struct ScheduledAlarm {
    pub entry: AlarmEntry,
    pub fired: bool,
}

impl ScheduledAlarm {
    fn new(entry: AlarmEntry) -> Self {
        Self {
            entry,
            fired: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    pub fired: usize,
    pub missed: usize,
}

/// Owns the alarm registry and all firing state. Every mutator (arm, disarm,
/// tick, snooze, lock/unlock, entry edits) runs on one serialized context;
/// external signals are queued onto that context before they reach here.
pub struct AlarmScheduler {
    alarms: Vec<ScheduledAlarm>,
    armed: bool,
    paused: bool,
    pause_on_lock: bool,
}

impl AlarmScheduler {
    pub fn new(entries: Vec<AlarmEntry>) -> Self {
        Self {
            alarms: entries.into_iter().map(ScheduledAlarm::new).collect(),
            armed: false,
            paused: false,
            pause_on_lock: false,
        }
    }

    pub fn alarms(&self) -> &[ScheduledAlarm] {
        &self.alarms
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause_on_lock(&self) -> bool {
        self.pause_on_lock
    }

    /// Gates the pause feature: the persisted setting ANDed with platform
    /// capability. With the gate off, lock/unlock signals are no-ops.
    pub fn set_pause_on_lock(&mut self, enabled: bool) {
        self.pause_on_lock = enabled;
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut AlarmEntry> {
        self.alarms.get_mut(index).map(|scheduled| &mut scheduled.entry)
    }

    pub fn add_entry(&mut self, entry: AlarmEntry) {
        self.alarms.push(ScheduledAlarm::new(entry));
    }

    #[allow(dead_code)]
    pub fn add_entry_front(&mut self, entry: AlarmEntry) {
        self.alarms.insert(0, ScheduledAlarm::new(entry));
    }

    /// Appends a copy of the row at `index` with its fired state reset.
    pub fn duplicate_at(&mut self, index: usize) -> Option<usize> {
        let entry = self.alarms.get(index)?.entry.clone();
        self.alarms.push(ScheduledAlarm::new(entry));
        Some(self.alarms.len() - 1)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<AlarmEntry> {
        if index >= self.alarms.len() {
            return None;
        }
        Some(self.alarms.remove(index).entry)
    }

    /// Snapshot of the current field values, in display order, for
    /// persistence.
    pub fn export_entries(&self) -> Vec<AlarmEntry> {
        self.alarms
            .iter()
            .map(|scheduled| scheduled.entry.clone())
            .collect()
    }

    /// Arms today's schedule. Enabled entries whose target already elapsed
    /// are marked fired up front so they stay silent; everything else rings
    /// when its window arrives. Fails without touching any state when no
    /// entry is schedulable or an enabled time does not parse.
    pub fn arm(&mut self, now: DateTime<Local>) -> Result<(), AlarmError> {
        let mut any_schedulable = false;
        let mut already_elapsed = vec![false; self.alarms.len()];
        for (index, scheduled) in self.alarms.iter().enumerate() {
            if !scheduled.entry.enabled {
                continue;
            }
            let raw = scheduled.entry.time.trim();
            if raw.is_empty() {
                continue;
            }
            let (hour, minute) = parse_hhmm(raw)?;
            if let Some(target) = target_today(&now, hour, minute)
                && target <= now
            {
                already_elapsed[index] = true;
            }
            any_schedulable = true;
        }
        if !any_schedulable {
            return Err(AlarmError::NoSchedulableAlarms);
        }

        for (scheduled, elapsed) in self.alarms.iter_mut().zip(already_elapsed) {
            scheduled.fired = elapsed;
        }
        self.armed = true;
        Ok(())
    }

    /// Stops firing evaluation and any in-progress notification audio.
    /// Fired flags are retained until the next arm.
    pub fn disarm(&mut self, sink: &mut dyn NotificationSink) {
        self.armed = false;
        sink.stop_all_sound();
    }

    /// One evaluation pass. A malformed or unresolvable entry is skipped for
    /// this tick without affecting the others.
    pub fn tick(&mut self, now: DateTime<Local>, sink: &mut dyn NotificationSink) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.armed || (self.paused && self.pause_on_lock) {
            return outcome;
        }

        for index in 0..self.alarms.len() {
            let scheduled = &self.alarms[index];
            if scheduled.fired || !scheduled.entry.enabled {
                continue;
            }
            let raw = scheduled.entry.time.trim();
            if raw.is_empty() {
                continue;
            }
            let Ok((hour, minute)) = parse_hhmm(raw) else {
                continue;
            };
            let Some(target) = target_today(&now, hour, minute) else {
                continue;
            };

            let delta = now.signed_duration_since(target).num_seconds();
            if (FIRE_WINDOW_EARLY_S..=FIRE_WINDOW_LATE_S).contains(&delta) {
                let label = self.alarms[index].entry.display_label(index);
                self.alarms[index].fired = true;
                sink.notify(index, &label, now);
                outcome.fired += 1;
            } else if delta > FIRE_WINDOW_LATE_S {
                // Window already passed while running: skip silently. While
                // paused this tick never runs, leaving the entry unfired so
                // the unlock replay can catch it.
                self.alarms[index].fired = true;
                outcome.missed += 1;
            }
        }
        outcome
    }

    /// Rewrites the entry's time to now+5min and re-arms that single entry.
    /// Returns the new "HH:MM" text.
    pub fn snooze_at(&mut self, index: usize, now: DateTime<Local>) -> Option<String> {
        let scheduled = self.alarms.get_mut(index)?;
        let new_time = (now + Duration::minutes(SNOOZE_OFFSET_MINUTES))
            .format("%H:%M")
            .to_string();
        scheduled.entry.time = new_time.clone();
        scheduled.fired = false;
        Some(new_time)
    }

    /// Session locked: suspend firing and silence the current alarm sound.
    /// Popups stay up and fired entries stay fired.
    pub fn handle_lock(&mut self, sink: &mut dyn NotificationSink) {
        if !self.pause_on_lock {
            return;
        }
        self.paused = true;
        sink.stop_all_sound();
    }

    /// Session unlocked: resume, then replay every alarm that became due
    /// during the pause in chronological target order. Returns the replay
    /// count.
    pub fn handle_unlock(
        &mut self,
        now: DateTime<Local>,
        sink: &mut dyn NotificationSink,
    ) -> usize {
        if !self.pause_on_lock {
            return 0;
        }
        self.paused = false;
        if !self.armed {
            return 0;
        }

        let mut due: Vec<(DateTime<Local>, usize)> = Vec::new();
        for (index, scheduled) in self.alarms.iter().enumerate() {
            if scheduled.fired || !scheduled.entry.enabled {
                continue;
            }
            let raw = scheduled.entry.time.trim();
            if raw.is_empty() {
                continue;
            }
            let Ok((hour, minute)) = parse_hhmm(raw) else {
                continue;
            };
            let Some(target) = target_today(&now, hour, minute) else {
                continue;
            };
            if target <= now {
                due.push((target, index));
            }
        }
        due.sort();

        let replayed = due.len();
        for (_, index) in due {
            let label = self.alarms[index].entry.display_label(index);
            self.alarms[index].fired = true;
            sink.notify(index, &label, now);
        }
        replayed
    }

    /// Countdown column text for one row: "—" when there is nothing to count
    /// down to, "ERR" when the time does not parse.
    pub fn tminus_text(&self, index: usize, now: DateTime<Local>) -> String {
        let Some(scheduled) = self.alarms.get(index) else {
            return "—".to_string();
        };
        let raw = scheduled.entry.time.trim();
        if raw.is_empty() {
            return "—".to_string();
        }
        let Ok((hour, minute)) = parse_hhmm(raw) else {
            return "ERR".to_string();
        };
        if scheduled.fired || !scheduled.entry.enabled {
            return "—".to_string();
        }
        let Some(target) = target_today(&now, hour, minute) else {
            return "—".to_string();
        };
        format_tminus(target.signed_duration_since(now).num_seconds())
    }
}

pub fn format_tminus(secs: i64) -> String {
    if secs < 0 {
        return "—".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Today's date at HH:MM:00. DST edges follow local-time resolution: an
/// ambiguous wall time maps to its first instance, a nonexistent one to
/// None.
fn target_today(now: &DateTime<Local>, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = now.date_naive().and_hms_opt(hour, minute, 0)?;
    resolve_local_datetime(naive)
}

fn resolve_local_datetime(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(first, _second) => Some(first),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::model::AlarmEntry;

    #[derive(Default)]
    struct RecordingSink {
        notified: Vec<(usize, String)>,
        stop_calls: usize,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&mut self, index: usize, label: &str, _fired_at: DateTime<Local>) {
            self.notified.push((index, label.to_string()));
        }

        fn stop_all_sound(&mut self) {
            self.stop_calls += 1;
        }
    }

    fn local(hour: u32, minute: u32, second: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 2, 6, hour, minute, second)
            .single()
            .expect("valid local time")
    }

    fn entry(label: &str, time: &str, enabled: bool) -> AlarmEntry {
        AlarmEntry::new(label, time, enabled)
    }

    #[test]
    fn arm_fails_with_all_entries_disabled() {
        let mut scheduler = AlarmScheduler::new(vec![
            entry("a", "09:30", false),
            entry("b", "10:00", false),
        ]);
        let err = scheduler.arm(local(8, 0, 0)).expect_err("nothing enabled");
        assert!(matches!(err, AlarmError::NoSchedulableAlarms));
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn arm_fails_with_only_empty_times() {
        let mut scheduler =
            AlarmScheduler::new(vec![entry("a", "", true), entry("b", "   ", true)]);
        let err = scheduler.arm(local(8, 0, 0)).expect_err("no times set");
        assert!(matches!(err, AlarmError::NoSchedulableAlarms));
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn arm_surfaces_invalid_time_naming_the_value() {
        let mut scheduler =
            AlarmScheduler::new(vec![entry("good", "09:30", true), entry("bad", "25:00", true)]);
        let err = scheduler.arm(local(8, 0, 0)).expect_err("invalid time");
        assert!(err.to_string().contains("25:00"));
        assert!(!scheduler.is_armed());
        assert!(
            scheduler.alarms().iter().all(|alarm| !alarm.fired),
            "failed arm must not touch fired state"
        );
    }

    #[test]
    fn arm_marks_elapsed_targets_fired_without_notifying() {
        let mut scheduler = AlarmScheduler::new(vec![
            entry("past", "09:30", true),
            entry("future", "18:00", true),
            entry("past but disabled", "07:00", false),
        ]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(12, 0, 0)).expect("armable");

        assert!(scheduler.is_armed());
        assert!(scheduler.alarms()[0].fired, "elapsed target is pre-marked");
        assert!(!scheduler.alarms()[1].fired);
        assert!(!scheduler.alarms()[2].fired, "disabled entries are ignored");
        assert!(sink.notified.is_empty());

        // Nothing rings for the pre-marked entry on the next tick either.
        scheduler.tick(local(12, 0, 1), &mut sink);
        assert!(sink.notified.is_empty());
    }

    #[test]
    fn rearm_clears_previous_fired_state() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 29, 59)).expect("armable");
        scheduler.tick(local(9, 30, 0), &mut sink);
        assert!(scheduler.alarms()[0].fired);

        scheduler.arm(local(9, 0, 0)).expect("re-armable");
        assert!(!scheduler.alarms()[0].fired);
    }

    #[test]
    fn tick_fires_exactly_once_inside_the_window() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");

        let outcome = scheduler.tick(local(9, 30, 0), &mut sink);
        assert_eq!(outcome.fired, 1);
        assert_eq!(sink.notified, vec![(0, "wake".to_string())]);

        let again = scheduler.tick(local(9, 30, 1), &mut sink);
        assert_eq!(again.fired, 0);
        assert_eq!(sink.notified.len(), 1, "one fire per armed day");
    }

    #[test]
    fn tick_window_edges() {
        for (second, fires) in [(3, true), (4, false)] {
            let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
            let mut sink = RecordingSink::default();
            scheduler.arm(local(9, 0, 0)).expect("armable");
            let outcome = scheduler.tick(local(9, 30, second), &mut sink);
            assert_eq!(outcome.fired == 1, fires, "delta +{second}s");
            assert!(scheduler.alarms()[0].fired, "fired or missed either way");
        }
    }

    #[test]
    fn tick_before_window_takes_no_action() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");

        let outcome = scheduler.tick(local(9, 29, 50), &mut sink);
        assert_eq!(outcome.fired, 0);
        assert_eq!(outcome.missed, 0);
        assert!(!scheduler.alarms()[0].fired);
        assert!(sink.notified.is_empty());
    }

    #[test]
    fn missed_while_running_is_skipped_silently() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");

        let outcome = scheduler.tick(local(9, 30, 10), &mut sink);
        assert_eq!(outcome.fired, 0);
        assert_eq!(outcome.missed, 1);
        assert!(scheduler.alarms()[0].fired);
        assert!(sink.notified.is_empty(), "missed entries never notify");
    }

    #[test]
    fn empty_label_fires_with_positional_name() {
        let mut scheduler =
            AlarmScheduler::new(vec![entry("other", "06:00", false), entry("", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");
        scheduler.tick(local(9, 30, 0), &mut sink);
        assert_eq!(sink.notified, vec![(1, "Alarm 2".to_string())]);
    }

    #[test]
    fn malformed_entry_is_isolated_per_tick() {
        let mut scheduler =
            AlarmScheduler::new(vec![entry("a", "09:30", true), entry("b", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");

        // Edited underneath the scheduler while armed; the bad row is
        // skipped each tick without blocking its neighbor.
        scheduler.entry_mut(0).expect("row 0").time = "garbage".to_string();
        let outcome = scheduler.tick(local(9, 30, 0), &mut sink);
        assert_eq!(outcome.fired, 1);
        assert_eq!(sink.notified, vec![(1, "b".to_string())]);
        assert!(!scheduler.alarms()[0].fired);
    }

    #[test]
    fn edited_time_moves_the_next_fire_target() {
        let mut scheduler = AlarmScheduler::new(vec![entry("a", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");

        scheduler.entry_mut(0).expect("row 0").time = "09:45".to_string();
        scheduler.tick(local(9, 30, 0), &mut sink);
        assert!(sink.notified.is_empty());
        scheduler.tick(local(9, 45, 0), &mut sink);
        assert_eq!(sink.notified.len(), 1);
    }

    #[test]
    fn snooze_reschedules_and_refires() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");
        scheduler.tick(local(9, 30, 0), &mut sink);
        assert!(scheduler.alarms()[0].fired);

        let new_time = scheduler
            .snooze_at(0, local(9, 30, 12))
            .expect("valid index");
        assert_eq!(new_time, "09:35");
        assert_eq!(scheduler.alarms()[0].entry.time, "09:35");
        assert!(!scheduler.alarms()[0].fired);
        assert!(scheduler.is_armed());

        scheduler.tick(local(9, 35, 0), &mut sink);
        assert_eq!(sink.notified.len(), 2, "rings again at the snoozed time");
    }

    #[test]
    fn snooze_out_of_range_index_is_none() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        assert!(scheduler.snooze_at(5, local(9, 30, 0)).is_none());
    }

    #[test]
    fn disarm_stops_evaluation_and_sound() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");
        scheduler.disarm(&mut sink);

        assert!(!scheduler.is_armed());
        assert_eq!(sink.stop_calls, 1);
        let outcome = scheduler.tick(local(9, 30, 0), &mut sink);
        assert_eq!(outcome.fired, 0);
        assert!(sink.notified.is_empty());
        assert!(!scheduler.alarms()[0].fired);
    }

    #[test]
    fn lock_pauses_and_silences_without_clearing_fired() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        scheduler.set_pause_on_lock(true);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");
        scheduler.tick(local(9, 30, 0), &mut sink);
        assert!(scheduler.alarms()[0].fired);

        scheduler.handle_lock(&mut sink);
        assert!(scheduler.is_paused());
        assert_eq!(sink.stop_calls, 1);
        assert!(scheduler.alarms()[0].fired, "lock keeps fired state");
    }

    #[test]
    fn paused_ticks_leave_due_entries_unfired() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        scheduler.set_pause_on_lock(true);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");
        scheduler.handle_lock(&mut sink);

        let outcome = scheduler.tick(local(9, 40, 0), &mut sink);
        assert_eq!(outcome.fired, 0);
        assert_eq!(outcome.missed, 0);
        assert!(
            !scheduler.alarms()[0].fired,
            "due-but-paused entries wait for the unlock replay"
        );
    }

    #[test]
    fn unlock_replays_missed_alarms_in_chronological_order() {
        // Registry order is deliberately the reverse of target order.
        let mut scheduler = AlarmScheduler::new(vec![
            entry("later", "09:10", true),
            entry("earlier", "09:05", true),
            entry("still ahead", "11:00", true),
        ]);
        scheduler.set_pause_on_lock(true);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");
        scheduler.handle_lock(&mut sink);
        scheduler.tick(local(9, 20, 0), &mut sink);

        let replayed = scheduler.handle_unlock(local(9, 20, 0), &mut sink);
        assert_eq!(replayed, 2);
        assert!(!scheduler.is_paused());
        assert_eq!(
            sink.notified,
            vec![(1, "earlier".to_string()), (0, "later".to_string())],
            "replay order follows target time, not registry order"
        );
        assert!(scheduler.alarms()[0].fired);
        assert!(scheduler.alarms()[1].fired);
        assert!(!scheduler.alarms()[2].fired, "future entries stay armed");
    }

    #[test]
    fn unlock_without_arming_only_resumes() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        scheduler.set_pause_on_lock(true);
        let mut sink = RecordingSink::default();
        scheduler.handle_lock(&mut sink);
        let replayed = scheduler.handle_unlock(local(10, 0, 0), &mut sink);
        assert_eq!(replayed, 0);
        assert!(!scheduler.is_paused());
        assert!(sink.notified.is_empty());
    }

    #[test]
    fn lock_and_unlock_are_noops_when_feature_disabled() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 0, 0)).expect("armable");

        scheduler.handle_lock(&mut sink);
        assert!(!scheduler.is_paused());
        assert_eq!(sink.stop_calls, 0);

        // Without the pause gate, a missed window skips silently as usual.
        let outcome = scheduler.tick(local(9, 40, 0), &mut sink);
        assert_eq!(outcome.missed, 1);
        assert_eq!(scheduler.handle_unlock(local(9, 41, 0), &mut sink), 0);
        assert!(sink.notified.is_empty());
    }

    #[test]
    fn registry_order_is_insertion_order() {
        let mut scheduler = AlarmScheduler::new(vec![entry("b", "10:00", true)]);
        scheduler.add_entry(entry("c", "11:00", true));
        scheduler.add_entry_front(entry("a", "09:00", true));

        let labels: Vec<&str> = scheduler
            .alarms()
            .iter()
            .map(|alarm| alarm.entry.label.as_str())
            .collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicate_copies_fields_and_resets_fired() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let mut sink = RecordingSink::default();
        scheduler.arm(local(9, 29, 59)).expect("armable");
        scheduler.tick(local(9, 30, 0), &mut sink);
        assert!(scheduler.alarms()[0].fired);

        let index = scheduler.duplicate_at(0).expect("valid index");
        assert_eq!(index, 1);
        assert_eq!(scheduler.alarms()[1].entry, scheduler.alarms()[0].entry);
        assert!(!scheduler.alarms()[1].fired);
    }

    #[test]
    fn remove_at_keeps_remaining_order() {
        let mut scheduler = AlarmScheduler::new(vec![
            entry("a", "09:00", true),
            entry("b", "10:00", true),
            entry("c", "11:00", true),
        ]);
        let removed = scheduler.remove_at(1).expect("valid index");
        assert_eq!(removed.label, "b");
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.alarms()[1].entry.label, "c");
        assert!(scheduler.remove_at(9).is_none());
    }

    #[test]
    fn export_snapshots_display_order() {
        let scheduler = AlarmScheduler::new(vec![
            entry("a", "09:00", true),
            entry("b", "10:00", false),
        ]);
        let exported = scheduler.export_entries();
        assert_eq!(exported.len(), 2);
        assert_eq!(exported[0].label, "a");
        assert!(!exported[1].enabled);
    }

    #[test]
    fn tminus_text_states() {
        let mut scheduler = AlarmScheduler::new(vec![
            entry("counting", "10:00", true),
            entry("blank", "", true),
            entry("broken", "7h30", true),
            entry("off", "10:00", false),
        ]);
        let now = local(9, 58, 30);
        assert_eq!(scheduler.tminus_text(0, now), "01:30");
        assert_eq!(scheduler.tminus_text(1, now), "—");
        assert_eq!(scheduler.tminus_text(2, now), "ERR");
        assert_eq!(scheduler.tminus_text(3, now), "—");
        assert_eq!(scheduler.tminus_text(9, now), "—");

        // Past targets and fired entries both show as blank.
        assert_eq!(scheduler.tminus_text(0, local(10, 0, 1)), "—");
        scheduler.entry_mut(2).expect("row 2").time = String::new();
        scheduler.arm(local(9, 0, 0)).expect("armable");
        let mut sink = RecordingSink::default();
        scheduler.tick(local(10, 0, 0), &mut sink);
        assert_eq!(scheduler.tminus_text(0, local(9, 59, 0)), "—");
    }

    #[test]
    fn tminus_formatting_suppresses_zero_hours() {
        assert_eq!(format_tminus(0), "00:00");
        assert_eq!(format_tminus(125), "02:05");
        assert_eq!(format_tminus(3661), "01:01:01");
        assert_eq!(format_tminus(-5), "—");
    }

    #[test]
    fn snooze_time_has_minute_precision() {
        let mut scheduler = AlarmScheduler::new(vec![entry("wake", "09:30", true)]);
        let new_time = scheduler
            .snooze_at(0, local(23, 57, 45))
            .expect("valid index");
        assert_eq!(new_time, "00:02", "wraps past midnight on the clock face");
        let (hour, minute) = parse_hhmm(&new_time).expect("round-trips");
        assert_eq!((hour, minute), (0, 2));
    }
}

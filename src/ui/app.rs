use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use eframe::egui::{self, Color32, RichText, ScrollArea, TextEdit, TopBottomPanel, Ui};
use log::info;

use crate::alarm::model::{AlarmEntry, Settings, save_settings, validate_entries};
use crate::alarm::scheduler::{AlarmScheduler, NotificationSink, SNOOZE_OFFSET_MINUTES};
use crate::session::{SessionEvent, SessionWatcher};
use crate::sound::AlarmPlayer;

const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub fn run_gui(scheduler: AlarmScheduler, settings: Settings, settings_path: PathBuf) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Day Starter")
            .with_inner_size([880.0, 560.0])
            .with_min_inner_size([720.0, 420.0]),
        ..Default::default()
    };

    let app = DayStarterApp::new(scheduler, settings, settings_path);

    eframe::run_native(
        "Day Starter",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch Day Starter GUI: {err}"))?;

    Ok(())
}

fn configure_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(228, 233, 242));
    visuals.panel_fill = Color32::from_rgb(14, 18, 26);
    visuals.window_fill = Color32::from_rgb(20, 26, 36);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(24, 32, 44);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(36, 50, 68);
    visuals.widgets.active.bg_fill = Color32::from_rgb(48, 70, 96);
    visuals.selection.bg_fill = Color32::from_rgb(62, 128, 166);
    ctx.set_visuals(visuals);
}

/// One fired alarm awaiting acknowledgment. The popup outlives sound
/// stoppage (a session lock silences audio but keeps the popup up).
struct ActiveAlarm {
    entry_index: usize,
    label: String,
    fired_at: DateTime<Local>,
}

/// GUI half of the notification contract: starts the looping sound and
/// queues a popup for the next frame. Never blocks the tick.
struct DesktopSink {
    player: AlarmPlayer,
    ringtone: Option<PathBuf>,
    active: Vec<ActiveAlarm>,
}

impl DesktopSink {
    fn new(ringtone: Option<PathBuf>) -> Self {
        Self {
            player: AlarmPlayer::new(),
            ringtone,
            active: Vec::new(),
        }
    }
}

impl NotificationSink for DesktopSink {
    fn notify(&mut self, index: usize, label: &str, fired_at: DateTime<Local>) {
        self.player.play(self.ringtone.as_deref());
        self.active.push(ActiveAlarm {
            entry_index: index,
            label: label.to_string(),
            fired_at,
        });
    }

    fn stop_all_sound(&mut self) {
        self.player.stop();
    }
}

struct DayStarterApp {
    scheduler: AlarmScheduler,
    sink: DesktopSink,
    watcher: Option<SessionWatcher>,
    settings_path: PathBuf,
    pause_on_lock: bool,
    selection: Vec<bool>,
    status_message: Option<(String, Instant)>,
    armed_at: Option<DateTime<Local>>,
    next_tick: Instant,
}

impl DayStarterApp {
    fn new(scheduler: AlarmScheduler, settings: Settings, settings_path: PathBuf) -> Self {
        let watcher = match SessionWatcher::spawn() {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                info!("{err}; pause-on-lock disabled");
                None
            }
        };
        let pause_on_lock = watcher.is_some() && settings.pause_on_lock;
        let ringtone = if settings.default_ringtone.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(settings.default_ringtone.trim()))
        };

        let mut scheduler = scheduler;
        scheduler.set_pause_on_lock(pause_on_lock);
        let selection = vec![false; scheduler.len()];
        Self {
            scheduler,
            sink: DesktopSink::new(ringtone),
            watcher,
            settings_path,
            pause_on_lock,
            selection,
            status_message: None,
            armed_at: None,
            next_tick: Instant::now(),
        }
    }

    fn set_status(&mut self, text: impl Into<String>, ttl: Duration) {
        self.status_message = Some((text.into(), Instant::now() + ttl));
    }

    fn expire_status(&mut self) {
        if let Some((_, expires_at)) = &self.status_message
            && Instant::now() >= *expires_at
        {
            self.status_message = None;
        }
    }

    /// Session events arrive from the watcher thread; applying them here
    /// keeps all scheduler mutation on the UI thread.
    fn drain_session_events(&mut self) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        let events: Vec<SessionEvent> = watcher.try_iter().collect();
        for event in events {
            match event {
                SessionEvent::Locked => {
                    self.scheduler.handle_lock(&mut self.sink);
                    if self.scheduler.is_paused() {
                        info!("session locked, alarm evaluation paused");
                    }
                }
                SessionEvent::Unlocked => {
                    let replayed = self.scheduler.handle_unlock(Local::now(), &mut self.sink);
                    if self.pause_on_lock {
                        info!("session unlocked, {replayed} alarm(s) replayed");
                    }
                    if replayed > 0 {
                        self.set_status(
                            format!("Rang {replayed} alarm(s) missed while locked."),
                            Duration::from_secs(4),
                        );
                    }
                }
            }
        }
    }

    fn run_scheduler_tick(&mut self) {
        let now_instant = Instant::now();
        if now_instant < self.next_tick {
            return;
        }
        let outcome = self.scheduler.tick(Local::now(), &mut self.sink);
        if outcome.fired > 0 {
            info!("{} alarm(s) fired", outcome.fired);
        }
        if outcome.missed > 0 {
            info!("{} alarm(s) missed their window and were skipped", outcome.missed);
        }
        self.next_tick += TICK_INTERVAL;
        // A stall (sleep, long frame) runs one tick, not a backlog; the
        // wall-clock delta logic absorbs whatever the stall covered.
        while self.next_tick <= now_instant {
            self.next_tick += TICK_INTERVAL;
        }
    }

    fn start_all(&mut self) {
        let now = Local::now();
        match self.scheduler.arm(now) {
            Ok(()) => {
                self.armed_at = Some(now);
                self.set_status(
                    format!("Armed at {} (today only)", now.format("%H:%M:%S")),
                    Duration::from_secs(3),
                );
            }
            Err(err) => self.set_status(format!("Cannot arm: {err}"), Duration::from_secs(4)),
        }
    }

    fn stop_all(&mut self) {
        self.scheduler.disarm(&mut self.sink);
        self.armed_at = None;
        self.set_status("Stopped.", Duration::from_secs(2));
    }

    fn save(&mut self) {
        let entries = self.scheduler.export_entries();
        if let Err(err) = validate_entries(&entries) {
            self.set_status(format!("Please fix times: {err}"), Duration::from_secs(4));
            return;
        }
        let settings = Settings {
            alarms: entries,
            default_ringtone: self
                .sink
                .ringtone
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned())
                .unwrap_or_default(),
            pause_on_lock: self.pause_on_lock,
        };
        match save_settings(&self.settings_path, &settings) {
            Ok(()) => self.set_status("Alarm list + settings saved.", Duration::from_secs(3)),
            Err(err) => self.set_status(format!("Save failed: {err}"), Duration::from_secs(4)),
        }
    }

    fn add_row(&mut self) {
        self.scheduler.add_entry(AlarmEntry::default());
        self.selection.push(false);
    }

    fn duplicate_selected(&mut self) {
        let indices: Vec<usize> = self.selected_indices();
        if indices.is_empty() {
            self.set_status("Select at least one row.", Duration::from_secs(3));
            return;
        }
        for index in indices {
            if self.scheduler.duplicate_at(index).is_some() {
                self.selection.push(false);
            }
        }
    }

    fn delete_selected(&mut self) {
        let indices: Vec<usize> = self.selected_indices();
        if indices.is_empty() {
            self.set_status("Select at least one row.", Duration::from_secs(3));
            return;
        }
        for &index in indices.iter().rev() {
            if self.scheduler.remove_at(index).is_none() {
                continue;
            }
            if index < self.selection.len() {
                self.selection.remove(index);
            }
            // Keep open popups pointing at the rows they were fired for.
            self.sink.active.retain_mut(|popup| {
                if popup.entry_index == index {
                    return false;
                }
                if popup.entry_index > index {
                    popup.entry_index -= 1;
                }
                true
            });
        }
    }

    fn selected_indices(&self) -> Vec<usize> {
        self.selection
            .iter()
            .enumerate()
            .filter(|(_, selected)| **selected)
            .map(|(index, _)| index)
            .collect()
    }

    fn status_line(&self) -> String {
        if self.scheduler.is_paused() && self.scheduler.pause_on_lock() {
            "Status: Paused (session locked)".to_string()
        } else if self.scheduler.is_armed() {
            match self.armed_at {
                Some(at) => format!("Status: Armed at {} (today only)", at.format("%H:%M:%S")),
                None => "Status: Armed (today only)".to_string(),
            }
        } else {
            "Status: Not armed".to_string()
        }
    }

    fn ringtone_label(&self) -> String {
        match &self.sink.ringtone {
            Some(path) if path.exists() => {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                format!("Ringtone: {name}")
            }
            _ => "Ringtone: generated tone (default)".to_string(),
        }
    }

    fn show_header(&mut self, ui: &mut Ui) {
        let now = Local::now();
        ui.horizontal_wrapped(|ui| {
            ui.label(
                RichText::new("Day Starter")
                    .size(24.0)
                    .color(Color32::from_rgb(96, 214, 192))
                    .strong(),
            );
            ui.separator();
            ui.label(
                RichText::new(now.format("%H:%M:%S").to_string())
                    .size(26.0)
                    .color(Color32::from_rgb(255, 210, 120))
                    .strong(),
            );
            ui.separator();
            ui.label(
                RichText::new("Alarms for today, HH:MM 24-hour")
                    .color(Color32::from_rgb(160, 176, 196)),
            );
        });
        ui.horizontal(|ui| {
            ui.label(RichText::new(self.status_line()).color(Color32::from_rgb(150, 166, 186)));
            if self.scheduler.is_armed() {
                let done = self
                    .scheduler
                    .alarms()
                    .iter()
                    .filter(|alarm| alarm.fired)
                    .count();
                ui.label(
                    RichText::new(format!("{done}/{} done today", self.scheduler.len()))
                        .color(Color32::from_rgb(118, 200, 170)),
                );
            }
        });
        if let Some((msg, _)) = &self.status_message {
            ui.label(
                RichText::new(msg)
                    .color(Color32::from_rgb(118, 222, 140))
                    .strong(),
            );
        }
    }

    fn show_controls(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("Start All (Today)").clicked() {
                self.start_all();
            }
            if ui.button("Stop All").clicked() {
                self.stop_all();
            }
            if ui.button("Save").clicked() {
                self.save();
            }
            if ui.button("+ Add").clicked() {
                self.add_row();
            }
            if ui.button("Duplicate Selected").clicked() {
                self.duplicate_selected();
            }
            if ui.button("Delete Selected").clicked() {
                self.delete_selected();
            }
        });
    }

    fn show_ringtone_row(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label(self.ringtone_label());
            if ui.button("Browse WAV…").clicked()
                && let Some(path) = rfd::FileDialog::new()
                    .add_filter("WAV audio", &["wav"])
                    .pick_file()
            {
                self.sink.ringtone = Some(path);
            }
            if ui.button("Clear").clicked() {
                self.sink.ringtone = None;
            }
            ui.separator();
            let can_pause = self.watcher.is_some();
            ui.add_enabled_ui(can_pause, |ui| {
                if ui
                    .checkbox(
                        &mut self.pause_on_lock,
                        "Pause on session lock (ring missed alarms on unlock)",
                    )
                    .changed()
                {
                    self.scheduler.set_pause_on_lock(self.pause_on_lock && can_pause);
                }
            });
            if !can_pause {
                ui.label(
                    RichText::new("(lock detection unavailable on this platform)")
                        .color(Color32::from_rgb(214, 138, 96)),
                );
            }
        });
    }

    fn show_alarm_rows(&mut self, ui: &mut Ui) {
        if self.scheduler.is_empty() {
            ui.label(
                RichText::new("No alarms configured. Use + Add to create one.")
                    .color(Color32::from_rgb(255, 190, 106)),
            );
            return;
        }

        let now = Local::now();
        self.selection.resize(self.scheduler.len(), false);

        ScrollArea::vertical().id_salt("alarm_rows").show(ui, |ui| {
            egui::Grid::new("alarm_grid")
                .striped(true)
                .num_columns(6)
                .show(ui, |ui| {
                    ui.label(RichText::new("On").strong());
                    ui.label(RichText::new("#").strong());
                    ui.label(RichText::new("Label").strong());
                    ui.label(RichText::new("Time").strong());
                    ui.label(RichText::new("T-minus").strong());
                    ui.label(RichText::new("Select").strong());
                    ui.end_row();

                    for index in 0..self.scheduler.len() {
                        let tminus = self.scheduler.tminus_text(index, now);
                        let Some(entry) = self.scheduler.entry_mut(index) else {
                            continue;
                        };
                        ui.checkbox(&mut entry.enabled, "");
                        ui.label(format!("{}", index + 1));
                        ui.add(TextEdit::singleline(&mut entry.label).desired_width(240.0));
                        ui.add(
                            TextEdit::singleline(&mut entry.time)
                                .desired_width(72.0)
                                .hint_text("HH:MM"),
                        );
                        ui.label(RichText::new(tminus).monospace());
                        ui.checkbox(&mut self.selection[index], "");
                        ui.end_row();
                    }
                });
        });
    }

    fn show_popups(&mut self, ctx: &egui::Context) {
        let mut dismissed: Option<usize> = None;
        let mut snoozed: Option<usize> = None;
        for (popup_index, alarm) in self.sink.active.iter().enumerate() {
            egui::Window::new(format!("⏰ {}", alarm.label))
                .id(egui::Id::new(("alarm_popup", popup_index, alarm.entry_index)))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(
                        RichText::new(alarm.fired_at.format("%H:%M").to_string())
                            .size(20.0)
                            .strong(),
                    );
                    ui.horizontal(|ui| {
                        if ui.button("Dismiss").clicked() {
                            dismissed = Some(popup_index);
                        }
                        if ui
                            .button(format!("Snooze {SNOOZE_OFFSET_MINUTES} min"))
                            .clicked()
                        {
                            snoozed = Some(popup_index);
                        }
                    });
                });
        }

        if let Some(popup_index) = dismissed {
            self.sink.player.stop();
            self.sink.active.remove(popup_index);
        } else if let Some(popup_index) = snoozed {
            let alarm = self.sink.active.remove(popup_index);
            self.sink.player.stop();
            if let Some(new_time) = self.scheduler.snooze_at(alarm.entry_index, Local::now()) {
                self.set_status(format!("Snoozed to {new_time}"), Duration::from_secs(3));
            }
        }
    }
}

impl eframe::App for DayStarterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.expire_status();
        self.drain_session_events();
        self.run_scheduler_tick();

        TopBottomPanel::top("header")
            .resizable(false)
            .show(ctx, |ui| self.show_header(ui));

        TopBottomPanel::bottom("footer")
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(format!(
                        "Settings persist to {} on Save.",
                        self.settings_path.display()
                    ))
                    .color(Color32::from_rgb(150, 166, 186)),
                );
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_controls(ui);
            self.show_ringtone_row(ui);
            ui.separator();
            self.show_alarm_rows(ui);
        });

        self.show_popups(ctx);

        // Keep the clock and T-minus columns moving without busy-repainting.
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}

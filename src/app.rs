use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::engine::scroll::{Clock, MonotonicClock};
use crate::engine::width::{self, Monospace};
use crate::engine::{FrequencyModel, ScrollActivityMonitor, ScrollEvent, ScrollState};
use crate::error::RenderError;
use crate::secure::terminal::TerminalSecurePath;
use crate::secure::{EncryptedTextWidget, LayoutMode};
use crate::ui::theme::Theme;

/// Key slots the terminal secure path knows about.
pub const KEY_SLOTS: [i32; 4] = [1, 2, 3, 4];

const AUTH_TAG_LEN: usize = 16;
const NONCE_LEN: usize = 12;

pub type SecureMessage = EncryptedTextWidget<TerminalSecurePath>;

pub struct App<C: Clock = MonotonicClock> {
    pub config: Config,
    pub theme: Theme,
    pub model: FrequencyModel,
    pub widths: Vec<f64>,
    pub messages: Vec<SecureMessage>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub viewport_rows: usize,
    pub monitor: ScrollActivityMonitor<C>,
    pub layout_mode: LayoutMode,
    pub secure_redraws: u64,
    pub last_error: Option<String>,
    pub should_quit: bool,
    rng: SmallRng,
}

impl App<MonotonicClock> {
    pub fn new(config: Config, theme: Theme, model: FrequencyModel) -> Self {
        let monitor =
            ScrollActivityMonitor::with_interval(MonotonicClock::new(), config.scroll_interval());
        Self::with_monitor(config, theme, model, monitor, SmallRng::from_entropy())
    }
}

impl<C: Clock> App<C> {
    pub fn with_monitor(
        config: Config,
        theme: Theme,
        model: FrequencyModel,
        monitor: ScrollActivityMonitor<C>,
        rng: SmallRng,
    ) -> Self {
        let layout_mode = config.layout_mode();
        let mut app = Self {
            widths: width::width_table(&Monospace::new(1.0)),
            model,
            theme,
            messages: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            viewport_rows: 1,
            monitor,
            layout_mode,
            secure_redraws: 0,
            last_error: None,
            should_quit: false,
            rng,
            config,
        };
        for _ in 0..app.config.message_count {
            app.push_random_message();
        }
        app
    }

    /// Generate an opaque blob standing in for an encrypted message and hand it
    /// to a fresh widget.
    pub fn push_random_message(&mut self) {
        let text_length = self.rng.gen_range(4..=72);
        let ciphertext_size = NONCE_LEN + text_length + AUTH_TAG_LEN;
        let mut ciphertext = vec![0u8; ciphertext_size];
        self.rng.fill(ciphertext.as_mut_slice());
        let key_handle = KEY_SLOTS[self.rng.gen_range(0..KEY_SLOTS.len())];

        let mut widget = EncryptedTextWidget::new(TerminalSecurePath::new(KEY_SLOTS));
        let result = widget
            .set_layout_mode(self.layout_mode.as_str())
            .and_then(|_| {
                widget.set_ciphertext(ciphertext, ciphertext_size, text_length, key_handle)
            });
        self.record_result(result);
        self.messages.push(widget);
    }

    pub fn is_scrolling(&self) -> bool {
        self.monitor.state() == ScrollState::Active
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
        self.clamp_offset();
    }

    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let end = (self.scroll_offset + self.viewport_rows).min(self.messages.len());
        self.scroll_offset.min(end)..end
    }

    /// Move the selection and report the position change to the monitor.
    pub fn scroll_by(&mut self, delta: isize) {
        if self.messages.is_empty() {
            return;
        }
        let last = self.messages.len() - 1;
        let next = self.selected.saturating_add_signed(delta).min(last);
        if next == self.selected {
            return;
        }
        self.selected = next;
        let before = self.scroll_offset;
        self.clamp_offset();
        if self.scroll_offset != before {
            self.monitor.on_position_changed();
        }
    }

    pub fn on_tick(&mut self) {
        self.monitor.poll();
    }

    pub fn on_scroll_event(&mut self, event: ScrollEvent) {
        if event == ScrollEvent::End {
            self.redraw_visible();
        }
    }

    /// Ask the secure path to repaint everything on screen.
    pub fn redraw_visible(&mut self) {
        for idx in self.visible_range() {
            let result = self.messages[idx].redraw_encrypted_text();
            if result.is_ok() {
                self.secure_redraws += 1;
            }
            self.record_result(result);
        }
    }

    pub fn redraw_selected(&mut self) {
        if let Some(widget) = self.messages.get_mut(self.selected) {
            let result = widget.redraw_encrypted_text();
            if result.is_ok() {
                self.secure_redraws += 1;
            }
            self.record_result(result);
        }
    }

    pub fn clear_selected(&mut self) {
        if let Some(widget) = self.messages.get_mut(self.selected) {
            let result = widget.clear_ciphertext();
            self.record_result(result);
        }
    }

    pub fn cycle_layout_mode(&mut self) {
        self.layout_mode = self.layout_mode.next();
        let mode = self.layout_mode;
        for idx in 0..self.messages.len() {
            let result = self.messages[idx].set_layout_mode(mode.as_str()).map(|_| ());
            self.record_result(result);
        }
    }

    pub fn estimated_width(&self, idx: usize) -> f64 {
        self.messages
            .get(idx)
            .map_or(0.0, |widget| widget.estimated_width(&self.model, &self.widths))
    }

    pub fn shutdown(&mut self) {
        self.monitor.detach();
        self.should_quit = true;
    }

    fn clamp_offset(&mut self) {
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.viewport_rows {
            self.scroll_offset = self.selected + 1 - self.viewport_rows;
        }
    }

    fn record_result(&mut self, result: Result<(), RenderError>) {
        if let Err(err) = result {
            tracing::debug!(error = %err, "secure render request failed");
            self.last_error = Some(err.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::scroll::ManualClock;

    fn test_app(count: usize) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = Config {
            message_count: count,
            ..Config::default()
        };
        let monitor =
            ScrollActivityMonitor::with_interval(clock.clone(), config.scroll_interval());
        let app = App::with_monitor(
            config,
            Theme::default(),
            FrequencyModel::build(),
            monitor,
            SmallRng::seed_from_u64(7),
        );
        (app, clock)
    }

    #[test]
    fn test_messages_start_encrypted_with_placeholders() {
        let (app, _) = test_app(5);
        assert_eq!(app.messages.len(), 5);
        for widget in &app.messages {
            let record = widget.record().unwrap();
            assert!(widget.is_encrypted());
            assert_eq!(widget.display_text().len(), record.text_length);
            assert_eq!(record.ciphertext.len(), record.ciphertext_size);
            assert!(widget.client().surface().is_showing());
        }
        assert!(app.last_error.is_none());
    }

    #[test]
    fn test_scrolling_past_viewport_starts_activity() {
        let (mut app, _) = test_app(10);
        app.set_viewport_rows(3);
        app.scroll_by(1);
        app.scroll_by(1);
        assert!(!app.is_scrolling());
        app.scroll_by(1);
        assert_eq!(app.scroll_offset, 1);
        assert!(app.is_scrolling());
        assert_eq!(app.visible_range(), 1..4);
    }

    #[test]
    fn test_scroll_end_redraws_visible_messages() {
        let (mut app, clock) = test_app(10);
        app.set_viewport_rows(3);
        app.scroll_by(5);
        assert!(app.is_scrolling());

        clock.advance(Duration::from_millis(100));
        app.on_tick();
        assert!(!app.is_scrolling());

        // Without a listener the app is told directly.
        app.on_scroll_event(ScrollEvent::End);
        assert_eq!(app.secure_redraws, 3);
        for idx in app.visible_range() {
            assert_eq!(app.messages[idx].client().surface().generation, 2);
        }
        assert_eq!(app.messages[0].client().surface().generation, 1);
    }

    #[test]
    fn test_clear_then_redraw_selected() {
        let (mut app, _) = test_app(2);
        app.clear_selected();
        assert!(!app.messages[0].is_encrypted());
        app.redraw_selected();
        assert!(app.messages[0].is_encrypted());
        assert_eq!(app.secure_redraws, 1);
    }

    #[test]
    fn test_cycle_layout_mode_reaches_every_widget() {
        let (mut app, _) = test_app(3);
        app.cycle_layout_mode();
        assert_eq!(app.layout_mode, LayoutMode::Less);
        assert!(app
            .messages
            .iter()
            .all(|w| w.client().surface().layout_mode == LayoutMode::Less));
    }

    #[test]
    fn test_estimated_width_is_close_to_length_in_monospace() {
        let (app, _) = test_app(1);
        let len = app.messages[0].record().unwrap().text_length as f64;
        assert!((app.estimated_width(0) - len).abs() < len * 1e-3 + 1e-9);
        assert_eq!(app.estimated_width(99), 0.0);
    }

    #[test]
    fn test_shutdown_detaches_monitor() {
        let (mut app, _) = test_app(4);
        app.set_viewport_rows(1);
        app.scroll_by(1);
        assert!(app.monitor.pending_recheck().is_some());
        app.shutdown();
        assert!(app.monitor.pending_recheck().is_none());
        assert!(app.should_quit);
    }
}

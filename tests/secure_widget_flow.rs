use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use veiltext::app::App;
use veiltext::config::Config;
use veiltext::engine::scroll::{Clock, ManualClock};
use veiltext::engine::width::{self, Monospace};
use veiltext::engine::{FrequencyModel, ScrollActivityMonitor, ScrollEvent, ScrollState};
use veiltext::error::RenderError;
use veiltext::secure::terminal::{SecureCall, TerminalSecurePath};
use veiltext::secure::{EncryptedTextWidget, LayoutMode, WidgetRenderState};
use veiltext::ui::theme::Theme;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn upload_calls(cipher: &[u8], key: i32, len: usize) -> Vec<SecureCall> {
    vec![
        SecureCall::EncryptedMode(true),
        SecureCall::Cipher(cipher.to_vec()),
        SecureCall::KeyHandle(key),
        SecureCall::TextLength(len),
    ]
}

#[test]
fn widget_upload_clear_and_replay() {
    let mut widget = EncryptedTextWidget::new(TerminalSecurePath::new([5]));
    let cipher = [0xA1, 0xB2, 0xC3];

    widget.set_ciphertext(cipher.to_vec(), 3, 11, 5).unwrap();
    assert_eq!(widget.display_text(), "XXXXXXXXXXX");
    assert_eq!(widget.render_state(), WidgetRenderState::Encrypted);
    assert_eq!(widget.client_mut().take_journal(), upload_calls(&cipher, 5, 11));

    widget.clear_ciphertext().unwrap();
    assert!(!widget.is_encrypted());
    assert!(!widget.client().surface().is_showing());
    assert_eq!(widget.client_mut().take_journal(), vec![SecureCall::Clear]);

    widget.redraw_encrypted_text().unwrap();
    assert!(widget.is_encrypted());
    assert!(widget.client().surface().is_showing());
    assert_eq!(widget.client_mut().take_journal(), upload_calls(&cipher, 5, 11));
}

#[test]
fn widget_failure_keeps_record_for_retry() {
    let mut widget = EncryptedTextWidget::new(TerminalSecurePath::new([1]));
    let err = widget.set_ciphertext(vec![9; 4], 4, 2, 8).unwrap_err();
    assert!(matches!(err, RenderError::UnknownKeyHandle(8)));

    // Stops at the failing call; the text length is never sent.
    let journal = widget.client_mut().take_journal();
    assert_eq!(journal.len(), 3);
    assert_eq!(widget.record().map(|r| r.key_handle), Some(8));
    assert!(widget.display_text().is_empty());

    let err = widget.redraw_encrypted_text().unwrap_err();
    assert!(matches!(err, RenderError::UnknownKeyHandle(8)));
}

#[test]
fn layout_mode_strings_resolve_case_insensitively() {
    let mut widget = EncryptedTextWidget::new(TerminalSecurePath::new([1]));
    for (input, expected) in [
        ("max", LayoutMode::Max),
        ("More", LayoutMode::More),
        ("LESS", LayoutMode::Less),
        ("STANDARD", LayoutMode::Standard),
        ("", LayoutMode::Standard),
        ("sideways", LayoutMode::Standard),
    ] {
        assert_eq!(widget.set_layout_mode(input).unwrap(), expected);
        assert_eq!(widget.client().surface().layout_mode, expected);
    }
}

#[test]
fn scroll_burst_reports_one_start_and_one_end() {
    let clock = ManualClock::new();
    let mut monitor = ScrollActivityMonitor::with_interval(clock.clone(), ms(100));
    let log: Rc<RefCell<Vec<(ScrollEvent, Duration)>>> = Rc::default();
    let sink = Rc::clone(&log);
    let listener_clock = clock.clone();
    monitor.set_listener(move |event: ScrollEvent| {
        sink.borrow_mut().push((event, listener_clock.now()));
    });

    let mut t = 0;
    while t <= 480 {
        clock.set(ms(t));
        monitor.on_position_changed();
        monitor.poll();
        t += 30;
    }
    for step in 49..=70 {
        clock.set(ms(step * 10));
        monitor.poll();
    }

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], (ScrollEvent::Start, ms(0)));
    assert_eq!(log[1].0, ScrollEvent::End);
    assert!(log[1].1 >= ms(580));
    assert_eq!(monitor.state(), ScrollState::Idle);
}

#[test]
fn scroll_end_triggers_secure_redraw_of_visible_messages() {
    let clock = ManualClock::new();
    let config = Config {
        message_count: 8,
        scroll_interval_ms: 50,
        ..Config::default()
    };
    let monitor = ScrollActivityMonitor::with_interval(clock.clone(), config.scroll_interval());
    let mut app = App::with_monitor(
        config,
        Theme::default(),
        FrequencyModel::build(),
        monitor,
        SmallRng::seed_from_u64(42),
    );
    app.set_viewport_rows(2);

    let ended: Rc<RefCell<Vec<ScrollEvent>>> = Rc::default();
    let sink = Rc::clone(&ended);
    app.monitor.set_listener(move |event: ScrollEvent| {
        sink.borrow_mut().push(event);
    });

    app.scroll_by(4);
    assert!(app.is_scrolling());
    clock.advance(ms(20));
    app.scroll_by(1);
    clock.advance(ms(40));
    app.on_tick();
    assert!(app.is_scrolling());

    clock.advance(ms(60));
    app.on_tick();
    assert!(!app.is_scrolling());
    let events: Vec<ScrollEvent> = ended.borrow().clone();
    assert_eq!(events, vec![ScrollEvent::Start, ScrollEvent::End]);

    for event in events {
        app.on_scroll_event(event);
    }
    assert_eq!(app.secure_redraws, 2);
    for idx in app.visible_range() {
        assert_eq!(app.messages[idx].client().surface().generation, 2);
    }
}

#[test]
fn width_estimate_scales_with_metrics() {
    let model = FrequencyModel::shared();
    let narrow = width::width_table(&Monospace::new(1.0));
    let wide = width::width_table(&Monospace::new(2.0));
    let a = width::estimate(model, &narrow);
    let b = width::estimate(model, &wide);
    assert!((b - 2.0 * a).abs() < 1e-9);

    let short = vec![1.0; model.required_width_len() - 1];
    assert!(width::try_estimate(model, &short).is_err());
}

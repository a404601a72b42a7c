use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};

use crate::engine::ScrollEvent;

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
    Scroll(ScrollEvent),
}

/// Single queue feeding the UI thread. Terminal input and ticks come from a
/// reader thread; scroll notifications are posted back onto the same queue so
/// they are handled in order with everything else.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => {
                            if reader_tx.send(AppEvent::Key(key)).is_err() {
                                return;
                            }
                        }
                        Ok(Event::Resize(w, h)) => {
                            if reader_tx.send(AppEvent::Resize(w, h)).is_err() {
                                return;
                            }
                        }
                        _ => {}
                    }
                } else if reader_tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, tx }
    }

    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

/// Scroll listener that posts notifications onto the event queue.
pub struct QueueScrollListener {
    tx: mpsc::Sender<AppEvent>,
}

impl QueueScrollListener {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx }
    }

    fn post(&self, event: ScrollEvent) {
        if self.tx.send(AppEvent::Scroll(event)).is_err() {
            tracing::debug!(?event, "event queue closed, dropping scroll notification");
        }
    }
}

impl crate::engine::ScrollListener for QueueScrollListener {
    fn on_scroll_start(&mut self) {
        self.post(ScrollEvent::Start);
    }

    fn on_scroll_end(&mut self) {
        self.post(ScrollEvent::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScrollListener;

    #[test]
    fn test_queue_listener_posts_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut listener = QueueScrollListener::new(tx);
        listener.on_scroll_start();
        listener.on_scroll_end();
        let got: Vec<ScrollEvent> = rx
            .try_iter()
            .filter_map(|ev| match ev {
                AppEvent::Scroll(ev) => Some(ev),
                _ => None,
            })
            .collect();
        assert_eq!(got, vec![ScrollEvent::Start, ScrollEvent::End]);
    }

    #[test]
    fn test_queue_listener_survives_closed_queue() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut listener = QueueScrollListener::new(tx);
        listener.on_scroll_end();
    }
}

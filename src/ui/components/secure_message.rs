use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::app::SecureMessage;
use crate::ui::theme::Theme;

/// Glyph painted where the secure path would draw plaintext.
const MASK_CHAR: char = '\u{2591}'; // ░

/// What a card shows in its body, derived from widget and surface state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardBody {
    /// Secure surface is current: paint the mask.
    Secure,
    /// Secure redraw deferred until scrolling settles: show the placeholder.
    Pending,
    /// Widget is plain.
    Cleared,
}

pub struct SecureMessageCard<'a> {
    widget: &'a SecureMessage,
    index: usize,
    selected: bool,
    scrolling: bool,
    estimated_width: f64,
    theme: &'a Theme,
}

impl<'a> SecureMessageCard<'a> {
    pub fn new(widget: &'a SecureMessage, index: usize, theme: &'a Theme) -> Self {
        Self {
            widget,
            index,
            selected: false,
            scrolling: false,
            estimated_width: 0.0,
            theme,
        }
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn scrolling(mut self, scrolling: bool) -> Self {
        self.scrolling = scrolling;
        self
    }

    pub fn estimated_width(mut self, width: f64) -> Self {
        self.estimated_width = width;
        self
    }

    pub fn body(&self) -> CardBody {
        if !self.widget.is_encrypted() {
            CardBody::Cleared
        } else if self.scrolling || !self.widget.client().surface().is_showing() {
            CardBody::Pending
        } else {
            CardBody::Secure
        }
    }

    fn title(&self) -> String {
        match self.widget.record() {
            Some(record) => format!(
                " #{:02} key {} {} chars ",
                self.index + 1,
                record.key_handle,
                record.text_length
            ),
            None => format!(" #{:02} ", self.index + 1),
        }
    }
}

impl Widget for SecureMessageCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let border = if self.selected {
            colors.border_focused()
        } else {
            colors.border()
        };
        let width_hint = Line::from(format!(" ~{:.1} cells ", self.estimated_width));
        let block = Block::bordered()
            .title(self.title())
            .title_bottom(width_hint.right_aligned())
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let max = inner.width as usize;
        let span = match self.body() {
            CardBody::Secure => {
                let len = self.widget.client().surface().text_length.min(max);
                Span::styled(
                    MASK_CHAR.to_string().repeat(len),
                    Style::default().fg(colors.masked()),
                )
            }
            CardBody::Pending => {
                let shown: String = self.widget.display_text().chars().take(max).collect();
                Span::styled(
                    shown,
                    Style::default()
                        .fg(colors.placeholder())
                        .add_modifier(Modifier::DIM),
                )
            }
            CardBody::Cleared => Span::styled(
                "cleared (r to redraw)",
                Style::default()
                    .fg(colors.cleared())
                    .add_modifier(Modifier::ITALIC),
            ),
        };

        Paragraph::new(Line::from(span)).render(inner, buf);
    }
}

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::SecureMessage;
use crate::engine::frequency::CharClass;
use crate::engine::{FrequencyModel, ScrollState};
use crate::secure::WidgetRenderState;
use crate::ui::theme::Theme;

/// Sidebar describing the selected message: record metadata, what the secure
/// surface holds, and the model used to size it.
pub struct Inspector<'a> {
    widget: Option<&'a SecureMessage>,
    model: &'a FrequencyModel,
    scroll_state: ScrollState,
    secure_redraws: u64,
    theme: &'a Theme,
}

impl<'a> Inspector<'a> {
    pub fn new(
        widget: Option<&'a SecureMessage>,
        model: &'a FrequencyModel,
        scroll_state: ScrollState,
        secure_redraws: u64,
        theme: &'a Theme,
    ) -> Self {
        Self {
            widget,
            model,
            scroll_state,
            secure_redraws,
            theme,
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let heading = Style::default()
            .fg(colors.accent())
            .add_modifier(Modifier::BOLD);
        let label = Style::default().fg(colors.placeholder());
        let value = Style::default().fg(colors.fg());

        let row = |name: &str, text: String| {
            Line::from(vec![
                Span::styled(format!("{name:<12}"), label),
                Span::styled(text, value),
            ])
        };

        let mut lines = vec![Line::from(Span::styled("Widget", heading))];
        match self.widget {
            Some(widget) => {
                let state = match widget.render_state() {
                    WidgetRenderState::Plain => "plain",
                    WidgetRenderState::Encrypted => "encrypted",
                };
                lines.push(row("state", state.to_string()));
                lines.push(row("layout", widget.layout_mode().to_string()));
                if let Some(record) = widget.record() {
                    lines.push(row("ciphertext", format!("{} bytes", record.ciphertext_size)));
                    lines.push(row("length", format!("{} chars", record.text_length)));
                    lines.push(row("key", record.key_handle.to_string()));
                }

                let surface = widget.client().surface();
                lines.push(Line::default());
                lines.push(Line::from(Span::styled("Secure surface", heading)));
                lines.push(row("showing", surface.is_showing().to_string()));
                lines.push(row("generation", surface.generation.to_string()));
                lines.push(row("calls", widget.client().journal().len().to_string()));
            }
            None => lines.push(row("state", "no message".to_string())),
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Scroll", heading)));
        let scroll = match self.scroll_state {
            ScrollState::Idle => "idle",
            ScrollState::Active => "active",
        };
        lines.push(row("monitor", scroll.to_string()));
        lines.push(row("redraws", self.secure_redraws.to_string()));

        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Frequency model", heading)));
        let weights = self.model.weights();
        for class in CharClass::ALL {
            lines.push(row(
                class.as_str(),
                format!(
                    "w {:.4}  n {}",
                    weights.get(class),
                    self.model.table(class).len()
                ),
            ));
        }
        lines
    }
}

impl Widget for Inspector<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(" Inspector ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

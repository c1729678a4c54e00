//! Frame renderer for the primary panel, widget stack, and command bar

use ratatui::{
    layout::Rect,
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::core::state::MainLog;
use crate::ui::layout::ComputedLayout;
use crate::ui::theme::Theme;
use crate::widget::WidgetSet;

/// Everything one draw pass needs, borrowed from the application.
pub struct RenderContext<'a> {
    pub title: &'a str,
    pub log: &'a MainLog,
    pub command_line: &'a str,
    pub widgets: &'a WidgetSet,
    pub layout: &'a ComputedLayout,
    pub theme: &'a Theme,
}

pub struct Renderer;

impl Renderer {
    pub fn render(frame: &mut Frame, ctx: &RenderContext) {
        // The layout was computed from the last resize event; clip against
        // the actual frame in case the two momentarily disagree.
        let screen = frame.area();

        Self::render_main(frame, ctx, ctx.layout.main.intersection(screen));

        for (id, rect) in &ctx.layout.panels {
            let Some(widget) = ctx.widgets.get(*id) else {
                continue;
            };
            let rect = rect.intersection(screen);
            if rect.height == 0 || rect.width == 0 {
                continue;
            }

            let block = Block::default()
                .title(widget.title().to_string())
                .borders(Borders::ALL)
                .border_style(ctx.theme.panel_border)
                .title_style(ctx.theme.panel_title);
            let inner = block.inner(rect);
            frame.render_widget(block, rect);
            widget.drawable().lock().draw(inner, frame.buffer_mut());
        }

        Self::render_command_bar(frame, ctx, ctx.layout.command_bar.intersection(screen));
    }

    fn render_main(frame: &mut Frame, ctx: &RenderContext, rect: Rect) {
        if rect.height == 0 || rect.width == 0 {
            return;
        }

        let block = Block::default()
            .title(ctx.title.to_string())
            .borders(Borders::ALL)
            .border_style(ctx.theme.panel_border)
            .title_style(ctx.theme.panel_title);
        let inner = block.inner(rect);

        let lines: Vec<Line> = ctx
            .log
            .window(inner.height as usize)
            .iter()
            .map(|l| Line::styled(truncate(&l.content, inner.width as usize), ctx.theme.main_text))
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }

    fn render_command_bar(frame: &mut Frame, ctx: &RenderContext, rect: Rect) {
        if rect.height == 0 || rect.width == 0 {
            return;
        }

        let block = Block::default()
            .title("Command")
            .borders(Borders::ALL)
            .border_style(ctx.theme.panel_border)
            .title_style(ctx.theme.panel_title);
        let text = Line::styled(
            truncate(ctx.command_line, rect.width.saturating_sub(2) as usize),
            ctx.theme.command_text,
        );
        frame.render_widget(Paragraph::new(text).block(block), rect);
    }
}

/// Truncate to a display width, not a char count.
fn truncate(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 3), "hel");
        // Wide CJK glyphs count double.
        assert_eq!(truncate("日本語", 4), "日本");
        assert_eq!(truncate("日本語", 5), "日本");
    }

    #[test]
    fn truncate_handles_zero_width() {
        assert_eq!(truncate("anything", 0), "");
    }
}

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::app::Panel;

/// Draws the tree's rendered lines with the cursor row highlighted.
pub struct TreeWidget<'a> {
    panel: &'a Panel,
    dir_suffix: &'a str,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(panel: &'a Panel, dir_suffix: &'a str) -> Self {
        Self {
            panel,
            dir_suffix,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn line_style(&self, line: &str, is_cursor: bool) -> Style {
        if is_cursor {
            return Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD);
        }
        if !self.dir_suffix.is_empty() && line.ends_with(self.dir_suffix) {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if self.panel.lines.is_empty() || visible_height == 0 {
            return;
        }

        let visible = self
            .panel
            .lines
            .iter()
            .enumerate()
            .skip(self.panel.scroll_offset)
            .take(visible_height);

        for (row, (idx, text)) in visible.enumerate() {
            let style = self.line_style(text, idx == self.panel.cursor);
            let line = Line::from(Span::styled(text.as_str(), style));
            buf.set_line(
                inner_area.x,
                inner_area.y + row as u16,
                &line,
                inner_area.width,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(lines: &[&str], cursor: usize, scroll_offset: usize) -> Panel {
        Panel {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            cursor,
            scroll_offset,
        }
    }

    fn row(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, y)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn renders_lines_in_order() {
        let p = panel(&["- foo/", " | a.txt"], 0, 0);
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&p, "/").render(area, &mut buf);
        assert!(row(&buf, 0, 20).starts_with("- foo/"));
        assert!(row(&buf, 1, 20).starts_with(" | a.txt"));
    }

    #[test]
    fn cursor_row_is_highlighted() {
        let p = panel(&["- foo/", " | a.txt"], 1, 0);
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&p, "/").render(area, &mut buf);
        assert_eq!(buf.cell((1, 1)).unwrap().bg, Color::Blue);
        assert_ne!(buf.cell((1, 0)).unwrap().bg, Color::Blue);
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Cyan);
    }

    #[test]
    fn scroll_offset_skips_lines() {
        let p = panel(&["- foo/", " | a", " | b", " | c"], 3, 2);
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&p, "/").render(area, &mut buf);
        assert!(row(&buf, 0, 10).starts_with(" | b"));
        assert!(row(&buf, 1, 10).starts_with(" | c"));
    }

    #[test]
    fn zero_area_does_not_panic() {
        let p = panel(&["- foo/"], 0, 0);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        TreeWidget::new(&p, "/").render(area, &mut buf);
    }
}

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

const KEY_HINTS: &str = " n:new  N:dir  r:ren  d:trash  q:quit ";

/// One-line status bar: root path, cursor position, selection and registry
/// counts, or a transient status message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    position: &'a str,
    status_message: Option<&'a str>,
    selection_info: Option<&'a str>,
    registry_info: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, position: &'a str) -> Self {
        Self {
            path_str,
            position,
            status_message: None,
            selection_info: None,
            registry_info: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str) -> Self {
        self.status_message = Some(msg);
        self
    }

    pub fn selection_info(mut self, info: &'a str) -> Self {
        self.selection_info = Some(info);
        self
    }

    pub fn registry_info(mut self, info: &'a str) -> Self {
        self.registry_info = Some(info);
        self
    }
}

/// Keep the tail of `s` within `budget` chars, marking the cut with `...`.
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    if len <= budget {
        return s.to_string();
    }
    if budget <= 3 {
        return s.chars().take(budget).collect();
    }
    let tail: String = s.chars().skip(len - (budget - 3)).collect();
    format!("...{tail}")
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let display: String = msg.chars().take(width).collect();
            let line = Line::from(Span::styled(
                format!("{:<width$}", display, width = width),
                Style::default().fg(Color::Green),
            ));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let mut extras = vec![Span::styled(
            format!(" {}", self.position),
            Style::default().fg(Color::Gray),
        )];
        if let Some(info) = self.selection_info {
            extras.push(Span::styled(
                format!(" {info}"),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if let Some(info) = self.registry_info {
            extras.push(Span::styled(
                format!(" {info}"),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        let extras_len: usize = extras.iter().map(|s| s.content.chars().count()).sum();

        let hints_len = KEY_HINTS.len();
        let path_budget = width.saturating_sub(extras_len + hints_len);
        let path_display = truncate_left(self.path_str, path_budget);
        let pad = width
            .saturating_sub(path_display.chars().count())
            .saturating_sub(extras_len)
            .saturating_sub(hints_len);

        let mut spans = vec![Span::styled(path_display, Style::default().fg(Color::White))];
        spans.extend(extras);
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(
            KEY_HINTS,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(widget: StatusBarWidget<'_>, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn normal_bar_shows_path_position_and_hints() {
        let content = render(StatusBarWidget::new("/home/user/project", "3/10"), 100);
        assert!(content.starts_with("/home/user/project 3/10"));
        assert!(content.contains("n:new"));
        assert!(content.contains("q:quit"));
    }

    #[test]
    fn counts_are_shown_when_present() {
        let widget = StatusBarWidget::new("/p", "1/2")
            .selection_info("2 selected")
            .registry_info("1 in registry");
        let content = render(widget, 100);
        assert!(content.contains("2 selected"));
        assert!(content.contains("1 in registry"));
    }

    #[test]
    fn status_message_replaces_bar() {
        let widget = StatusBarWidget::new("/p", "1/2").status_message("Pasted 2 item(s)");
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let content: String = (0..40)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect();
        assert!(content.starts_with("Pasted 2 item(s)"));
        assert!(!content.contains("q:quit"));
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Green);
    }

    #[test]
    fn long_path_is_truncated_from_the_left() {
        assert_eq!(truncate_left("/a/very/long/path", 10), "...ng/path");
        assert_eq!(truncate_left("short", 10), "short");
    }

    #[test]
    fn zero_area_does_not_panic() {
        let widget = StatusBarWidget::new("/path", "0/0");
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }
}

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub mod list;
pub mod wrap;

pub use list::{DefaultRenderer, ItemRenderer, ItemStyles, ListViewport, Listable, VirtualList};

/// Bordered list on top, status and key help underneath.
pub fn draw_list_screen<T, R: ItemRenderer<T>>(
    frame: &mut Frame,
    list: &mut ListViewport<T, R>,
    title: &str,
    status: Option<&str>,
    help: &str,
) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(frame.size());

    let block = Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(vertical[0]);
    list.set_size(inner.width, inner.height);
    frame.render_widget(VirtualList::new(&*list).block(block), vertical[0]);

    let status_line = match status {
        Some(message) => Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Green),
        )),
        None => Line::from(""),
    };
    let help_line = Line::from(Span::styled(
        help.to_string(),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(
        Paragraph::new(Text::from(vec![status_line, help_line])),
        vertical[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::segmentize;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn list_screen_sizes_viewport_to_inner_area() {
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).expect("terminal");
        let mut list = ListViewport::new(
            segmentize("-[]: one\n-[x]: two"),
            DefaultRenderer::default(),
            0,
            0,
        );
        terminal
            .draw(|frame| draw_list_screen(frame, &mut list, "Tasks", Some("saved"), "q quit"))
            .expect("draw");
        assert_eq!((list.width(), list.height()), (28, 6));

        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String {
            (0..30)
                .map(|x| buffer.get(x, y).symbol().to_string())
                .collect()
        };
        assert!(row(0).contains("Tasks"));
        assert!(row(1).contains("▸ -[]: one"));
        assert!(row(3).contains("-[x]: two"));
        assert!(row(8).starts_with("saved"));
        assert!(row(9).starts_with("q quit"));
    }
}

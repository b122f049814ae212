use crate::api::TaskStore;
use crate::app::{ActiveInput, App, InputMode};
use crate::classify::{Bucket, Buckets};
use crate::deadline::{evaluate, format_local};
use crate::models::{Task, TaskStatus};
use chrono::{DateTime, Utc};
use crossterm::event::{self, Event as CEvent};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(action),
    ]
}

fn get_legend(input_mode: InputMode) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match input_mode {
        InputMode::Normal => vec![
            key_hint(" q ", ": Quit "),
            key_hint(" j/k ", ": Down/Up "),
            key_hint(" h/l ", ": Switch Tab "),
            key_hint(" c ", ": Complete "),
            key_hint(" d ", ": Delete "),
            key_hint(" r ", ": Refresh "),
            key_hint(" a ", ": Add Task "),
        ],
        InputMode::Editing => vec![
            key_hint(" i ", ": Insert "),
            key_hint(" Tab ", ": Next Field "),
            key_hint(" Enter ", ": Submit "),
            key_hint(" Esc ", ": Cancel "),
        ],
        InputMode::Insert => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" Enter ", ": Submit "),
            key_hint(" Esc ", ": Stop Typing "),
        ],
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

pub fn status_tag(status: TaskStatus) -> Span<'static> {
    let color = match status {
        TaskStatus::Success => Color::Green,
        TaskStatus::Failure => Color::Red,
        TaskStatus::Ongoing => Color::Blue,
    };
    Span::styled(
        format!(" {} ", status.as_tag().to_uppercase()),
        Style::default().bg(color).fg(Color::Black),
    )
}

/// One board row. Remaining time is computed against `now` on every draw.
pub fn task_line(task: &Task, now: DateTime<Utc>) -> Line<'static> {
    let time_status = evaluate(task.deadline, now);
    let time_style = if time_status.is_past_deadline {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    };
    Line::from(vec![
        status_tag(task.status),
        Span::raw(" "),
        Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("  {}  ", format_local(task.deadline))),
        Span::styled(time_status.label(), time_style),
    ])
}

fn render_tabs(f: &mut Frame, area: Rect, buckets: &Buckets, selected: Bucket, loading: bool) {
    let titles: Vec<Line> = Bucket::ALL
        .iter()
        .map(|bucket| Line::from(format!("{} ({})", bucket.label(), buckets.get(*bucket).len())))
        .collect();
    let title = if loading { "ToDo App (Loading...)" } else { "ToDo App" };

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(selected.index())
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_details(f: &mut Frame, area: Rect, task: Option<&Task>, now: DateTime<Utc>) {
    let detail_block = Block::default().borders(Borders::ALL).title("Task Details");

    let Some(task) = task else {
        let paragraph = Paragraph::new("No tasks in this category.")
            .block(detail_block)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
        return;
    };

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let description = if task.description.trim().is_empty() {
        "No description".to_string()
    } else {
        task.description.clone()
    };
    let lines = vec![
        Line::from(Span::styled(task.title.clone(), bold)),
        Line::from(vec![Span::styled("Status: ", bold), status_tag(task.status)]),
        Line::from(vec![
            Span::styled("Deadline: ", bold),
            Span::raw(format_local(task.deadline)),
        ]),
        Line::from(vec![
            Span::styled("Time: ", bold),
            Span::raw(evaluate(task.deadline, now).label()),
        ]),
        Line::from(Span::styled("Description: ", bold)),
        Line::from(description),
    ];

    let paragraph = Paragraph::new(lines)
        .block(detail_block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_form<S>(f: &mut Frame, area: Rect, app: &App<S>) {
    let popup_width = (area.width * 60 / 100).max(30).min(area.width);
    let popup_height = 11u16.min(area.height);
    let popup_area = centered_rect_absolute(popup_width, popup_height, area);

    let title = if app.input_mode == InputMode::Insert {
        "New Task (typing)"
    } else {
        "New Task (press i to type)"
    };
    let popup_block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));

    let field = |label: &'static str, value: &str, input: ActiveInput| {
        let style = if app.active_input == input {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![Span::styled(label, style), Span::raw(value.to_string())])
    };

    let mut lines = vec![
        field("Title:       ", &app.new_task_title, ActiveInput::Title),
        field("Description: ", &app.new_task_description, ActiveInput::Description),
        field("Deadline:    ", &app.new_task_deadline, ActiveInput::Deadline),
        Line::from(Span::styled(
            "             DD-MM-YYYY HH:MM or +30m / +2h / +1d",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(message) = &app.form_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let input = Paragraph::new(lines)
        .block(popup_block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

pub fn draw<S: TaskStore>(f: &mut Frame, app: &mut App<S>) {
    let size = f.area();
    let now = app.clock.now();
    let buckets = app.client.buckets();
    app.sync_selection(&buckets);

    // Split the main layout into tabs, body and footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(size);

    render_tabs(f, chunks[0], &buckets, app.bucket, app.client.is_grid_busy());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(chunks[1]);

    let tasks = buckets.get(app.bucket);
    let list_block = Block::default().borders(Borders::ALL).title(app.bucket.label());
    let tasks_widget = if !app.client.snapshot().is_loaded() && app.client.is_grid_busy() {
        List::new(vec![ListItem::new("Loading...")]).block(list_block)
    } else if tasks.is_empty() {
        List::new(vec![ListItem::new("No tasks in this category.")]).block(list_block)
    } else {
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|task| ListItem::new(task_line(task, now)))
            .collect();
        List::new(items)
            .block(list_block)
            .highlight_style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ")
    };
    f.render_stateful_widget(tasks_widget, body[0], &mut app.state);

    let selected = app.selected_task(&buckets);
    render_details(f, body[1], selected.as_ref(), now);

    if app.input_mode != InputMode::Normal {
        render_form(f, chunks[1], app);
    }

    // Render the legend in the footer
    let legend = Paragraph::new(get_legend(app.input_mode))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(legend, chunks[2]);
}

pub async fn run_app<B: Backend, S: TaskStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        app.collect_finished();
        terminal.draw(|f| draw(f, app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if app.handle_input(key) {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;
    use crate::sync::SyncClient;
    use crate::test_utils::{at, MemoryStore};
    use ratatui::backend::TestBackend;

    fn task(status: TaskStatus, deadline: DateTime<Utc>) -> Task {
        Task {
            id: TaskId::new("1"),
            title: "Write report".to_string(),
            description: String::new(),
            deadline,
            status,
        }
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_task_line_shows_minutes_left() {
        let line = task_line(&task(TaskStatus::Ongoing, at(12, 25)), at(12, 0));
        let text = line_text(&line);
        assert!(text.starts_with(" ONGOING "));
        assert!(text.contains("Write report"));
        assert!(text.ends_with("25 min left"));
    }

    #[test]
    fn test_task_line_shows_passed_deadline() {
        let line = task_line(&task(TaskStatus::Failure, at(11, 0)), at(12, 0));
        let text = line_text(&line);
        assert!(text.starts_with(" FAILURE "));
        assert!(text.ends_with("Deadline passed"));
    }

    #[tokio::test]
    async fn test_draw_renders_bucket_counts() {
        let store = MemoryStore::new();
        store.insert("one", at(13, 0), TaskStatus::Ongoing);
        store.insert("two", at(11, 0), TaskStatus::Failure);
        let client = SyncClient::new(store);
        client.refresh().await.unwrap();
        let mut app = App::new(client);

        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let rendered: String = buffer.content.iter().map(|cell| cell.symbol()).collect();
        assert!(rendered.contains("Ongoing (1)"));
        assert!(rendered.contains("Completed On Time (0)"));
        assert!(rendered.contains("Failed (1)"));
        assert_eq!(app.state.selected(), Some(0));
    }
}

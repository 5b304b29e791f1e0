use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use phia::metrics::{MetricCard, MetricKind, UNAVAILABLE_MESSAGE};
use phia::{MetricsView, StatusIndicator};

use crate::app::{App, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            // Consume the second *
            chars.next();

            // Push any accumulated plain text
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next(); // consume second *
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    // Push any remaining text
    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, metrics, chat, input, footer
    let suggestions = app.chat.suggestions();
    let suggestions_height = if suggestions.is_empty() {
        0
    } else {
        suggestions.len() as u16 + 2
    };

    let [header_area, metrics_area, chat_area, suggestions_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(suggestions_height),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(app, frame, header_area);
    render_metrics(app, frame, metrics_area);
    render_chat(app, frame, chat_area);
    if suggestions_height > 0 {
        render_suggestions(suggestions, frame, suggestions_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let indicator = app.dashboard.indicator;
    let dot_color = match indicator {
        StatusIndicator::Connected => Color::Green,
        StatusIndicator::Disconnected => Color::Red,
        StatusIndicator::Checking => Color::Yellow,
    };

    let detail = match indicator {
        StatusIndicator::Disconnected => format!(" ({})", app.api_url()),
        _ => app
            .dashboard
            .last_status
            .as_ref()
            .filter(|s| !s.phia_agent.is_empty())
            .map(|s| format!(" agent: {}", s.phia_agent))
            .unwrap_or_default(),
    };

    let title = Line::from(vec![
        Span::styled(" PHIA ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Personal Health Insights Agent ", Style::default().fg(Color::White)),
        Span::styled("● ", Style::default().fg(dot_color)),
        Span::styled(
            format!("API Status: {}", indicator.label()),
            Style::default().fg(Color::White),
        ),
        Span::styled(detail, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn card_color(kind: MetricKind) -> Color {
    match kind {
        MetricKind::HeartRate => Color::Red,
        MetricKind::Steps => Color::Blue,
        MetricKind::Sleep => Color::Magenta,
        MetricKind::ActiveMinutes => Color::LightRed,
    }
}

fn render_metrics(app: &App, frame: &mut Frame, area: Rect) {
    let cells: [Rect; 4] = Layout::horizontal([Constraint::Percentage(25); 4]).areas(area);

    match app.dashboard.metrics() {
        MetricsView::Loading => {
            for cell in cells {
                let skeleton = Paragraph::new(vec![
                    Line::from("░░░░░░░░"),
                    Line::from("░░░░"),
                ])
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
                frame.render_widget(skeleton, cell);
            }
        }
        MetricsView::Unavailable => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Health Dashboard ");
            let message = Paragraph::new(Line::from(UNAVAILABLE_MESSAGE))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray))
                .block(block);
            frame.render_widget(message, area);
        }
        MetricsView::Cards(cards) => {
            for (card, cell) in cards.iter().zip(cells) {
                render_card(card, frame, cell);
            }
        }
    }
}

fn render_card(card: &MetricCard, frame: &mut Frame, area: Rect) {
    let color = card_color(card.kind);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(format!(" {} ", card.icon()));

    let body = Paragraph::new(vec![
        Line::from(Span::styled(
            card.value.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(card.label(), Style::default().fg(Color::Gray))),
    ])
    .block(block);

    frame.render_widget(body, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area for mouse hit-testing and scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2);

    let title = if app.chat.is_awaiting_reply() {
        " PHIA Health Assistant · Thinking... "
    } else {
        " PHIA Health Assistant "
    };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.chat.transcript() {
        let time = msg.timestamp.format("%H:%M:%S").to_string();
        if msg.is_user {
            lines.push(Line::from(vec![
                Span::styled("You", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {time}"), Style::default().fg(Color::DarkGray)),
            ]));
            lines.push(Line::from(msg.body().to_string()));
        } else {
            lines.push(Line::from(vec![
                Span::styled("PHIA", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(format!("  {time}"), Style::default().fg(Color::DarkGray)),
            ]));
            // Split response into lines and parse markdown
            for line in msg.body().lines() {
                lines.push(parse_markdown_line(line));
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_awaiting_reply() {
        lines.push(Line::from(Span::styled(
            "PHIA",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
    // Counted before the block is attached so only the text is measured
    let rendered_lines = u16::try_from(chat.line_count(inner_width)).unwrap_or(u16::MAX);
    app.set_chat_lines(rendered_lines);

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_suggestions(suggestions: &[&str], frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Try asking (Esc, then 1-4) ");

    let lines: Vec<Line> = suggestions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().bg(Color::DarkGray).fg(Color::White)),
                Span::raw(format!(" {question}")),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let awaiting = app.chat.is_awaiting_reply();
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if awaiting {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(if awaiting { " Waiting for reply... " } else { " Message " });

    let text = if app.chat.input().is_empty() && !awaiting {
        Line::from(Span::styled(
            "Ask me about your health...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(app.chat.input().to_string())
    };

    // Keep the cursor in view on long input
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor = app.chat.cursor();
    let offset = cursor.saturating_sub(inner_width.saturating_sub(1));

    let input = Paragraph::new(text).block(block).scroll((0, offset as u16));
    frame.render_widget(input, area);

    if editing && !awaiting {
        let x = area.x + 1 + (cursor - offset) as u16;
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
            Span::styled(" ^R ", key_style),
            Span::styled(" refresh ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" r ", key_style),
                Span::styled(" refresh ", label_style),
            ];
            if !app.chat.suggestions().is_empty() {
                hints.extend(vec![
                    Span::styled(" 1-4 ", key_style),
                    Span::styled(" suggest ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };
    hints.extend(vec![
        Span::styled(" ^L ", key_style),
        Span::styled(" new chat ", label_style),
    ]);

    if let Some(polled) = app.dashboard.last_polled {
        hints.push(Span::styled(
            format!("  updated {}", polled.format("%H:%M:%S")),
            Style::default().bg(Color::Black).fg(Color::DarkGray),
        ));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

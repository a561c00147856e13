use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};

use crate::app::{App, FocusPane, InputMode};
use crate::map::plan_view;
use crate::session::{ChatRole, SessionStatus};
use crate::surface::MapSurface;

/// Convert the agent's light markdown to styled spans: chunks between `**`
/// pairs come out bold, everything else stays plain.
fn bold_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    for (i, chunk) in text.split("**").enumerate() {
        if chunk.is_empty() {
            continue;
        }
        if i % 2 == 1 {
            spans.push(Span::styled(
                chunk.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(chunk.to_string()));
        }
    }
    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    app.ensure_surface_mounted();

    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Body: chat column on the left, map column on the right
    let [left_area, right_area] = Layout::horizontal([
        Constraint::Percentage(45),
        Constraint::Percentage(55),
    ])
    .areas(body_area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(left_area);

    let places_height = if app.session.places().is_empty() {
        0
    } else {
        (app.session.places().len().min(5) + 2) as u16 // +2 for borders
    };
    let [map_area, places_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(places_height),
    ])
    .areas(right_area);

    // Store areas for mouse hit-testing
    app.chat_area = Some(chat_area);
    app.map_area = Some(map_area);
    app.places_area = if places_height > 0 { Some(places_area) } else { None };

    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_map(app, frame, map_area);
    if places_height > 0 {
        render_places(app, frame, places_area);
    }

    render_footer(app, frame, footer_area);

    if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" mapagent ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!(" {} ", app.session.model_label()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!(" [{}] ", app.session.language().as_str()),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let copy = app.session.language().copy();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", copy.chat_title));

    // Store chat area dimensions for scroll calculations (inner size)
    let inner = block.inner(area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.session.transcript() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    copy.user_label,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.text.as_str()));
                lines.push(Line::default());
            }
            ChatRole::Agent => {
                lines.push(Line::from(Span::styled(
                    copy.agent_label,
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(bold_markdown_line(line));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.session.status() == SessionStatus::Thinking {
        lines.push(Line::from(Span::styled(
            copy.agent_label,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("{}{}", copy.thinking, dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let total_lines = lines.len() as u16;

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(paragraph, area);

    if total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.chat_scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let copy = app.session.language().copy();
    let editing = app.input_mode == InputMode::Editing && app.focus == FocusPane::Input;
    let border_color = if editing {
        Color::Yellow
    } else if app.focus == FocusPane::Input {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", copy.input_title));

    let input = if app.prompt_input.is_empty() {
        Paragraph::new(copy.input_placeholder)
            .style(Style::default().fg(Color::DarkGray))
            .block(block)
    } else {
        Paragraph::new(app.prompt_input.as_str())
            .style(Style::default().fg(Color::Cyan))
            .block(block)
    };

    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((area.x + 1 + app.prompt_cursor as u16, area.y + 1));
    }
}

fn render_map(app: &mut App, frame: &mut Frame, area: Rect) {
    let copy = app.session.language().copy();
    let view = plan_view(app.session.center(), app.session.places(), app.session.language());

    let label = view
        .center_label
        .clone()
        .unwrap_or_else(|| copy.default_marker.to_string());
    let title = format!(" {} · {} ({}) ", copy.map_title, label, view.markers.len());

    if app.surface.is_mounted() {
        app.surface.sync(&view, app.session.center_epoch());
    }
    let focused = app.focus == FocusPane::Map;
    app.surface.render(frame, area, focused, &title);
}

fn render_places(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Places;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let copy = app.session.language().copy();

    let title = format!(" {} ({}) ", copy.places_title, app.session.places().len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let items: Vec<ListItem> = app
        .session
        .places()
        .iter()
        .map(|place| {
            let mut spans = vec![Span::styled(
                place.name.clone(),
                Style::default().fg(Color::White),
            )];
            if place.coordinates().is_none() {
                spans.push(Span::styled(
                    format!(" ({})", copy.no_coordinates),
                    Style::default().fg(Color::DarkGray),
                ));
            } else if let Some(address) = &place.address {
                spans.push(Span::styled(
                    format!("  {}", address),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.places_state);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.session.status() {
        SessionStatus::Thinking => (" BUSY ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        SessionStatus::Error => (" ERROR ", Style::default().bg(Color::Red).fg(Color::White)),
        SessionStatus::Idle => match app.input_mode {
            InputMode::Editing => (" INPUT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
            InputMode::Normal => (" VIEW ", Style::default().bg(Color::Blue).fg(Color::White)),
        },
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
            ];
            if app.focus == FocusPane::Map {
                hints.extend(vec![
                    Span::styled(" ←↓↑→ ", key_style),
                    Span::styled(" pan ", label_style),
                    Span::styled(" +/- ", key_style),
                    Span::styled(" zoom ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" M ", key_style),
                Span::styled(" model ", label_style),
                Span::styled(" L ", key_style),
                Span::styled(" lang ", label_style),
                Span::styled(" ^N ", key_style),
                Span::styled(" new ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };

    // Errors stay out of the transcript; they live here until the next
    // submission clears them.
    if let Some(error) = app.session.error() {
        hints.push(Span::styled(
            format!(" {} ", error),
            Style::default().bg(Color::Black).fg(Color::Red),
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

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let copy = app.session.language().copy();

    // Calculate popup size and position (centered)
    let popup_width = 48.min(area.width.saturating_sub(4));
    let rows = app.session.models().len().max(1) as u16;
    let popup_height = (rows + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(copy.model_picker_title);

    if app.session.models().is_empty() {
        let text = if app.session.models_loading() {
            "...".to_string()
        } else {
            match app.session.models_error() {
                Some(error) => format!("{}: {}", copy.models_unavailable, error),
                None => copy.models_unavailable.to_string(),
            }
        };
        let placeholder = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(placeholder, popup_area);
        return;
    }

    let current_id = app.session.model_id().to_string();
    let items: Vec<ListItem> = app
        .session
        .models()
        .iter()
        .map(|model| {
            let style = if model.id == current_id {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let label = if model.name.is_empty() { &model.id } else { &model.name };
            ListItem::new(format!(" {} ", label)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}

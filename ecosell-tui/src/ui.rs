use chrono::Local;
use ecosell_core::{
    geo::{directions_url, format_distance_km},
    model::{Center, ClassificationResult, WasteCategory},
    pricing::{format_rupees, pricing, showcase},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

use crate::app::{App, Notice, Screen};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let tabs = [
        (Screen::Upload, "Upload"),
        (Screen::Centers, "Centers"),
        (Screen::Prices, "Prices"),
    ]
    .into_iter()
    .map(|(screen, name)| {
        if screen == app.screen {
            format!("[{name}]")
        } else {
            format!(" {name} ")
        }
    })
    .collect::<Vec<_>>()
    .join(" ");

    let header = Paragraph::new(format!("ecosell – price your recyclables · {tabs}"))
        .block(Block::default().borders(Borders::ALL).title("EcoSell"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::Upload => draw_upload(frame, app, *content_area),
        Screen::Centers => draw_centers(frame, app, *content_area),
        Screen::Prices => draw_prices(frame, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::Upload => "Type a path · Enter identify · ↑/↓ weight · Tab next · Esc/Ctrl-C quit",
        Screen::Centers => "↑/↓ move · r refresh · Tab next · q/Ctrl-C quit",
        Screen::Prices => "Tab next · q/Ctrl-C quit",
    };

    let status_text = if app.is_loading {
        format!("Loading… · {nav_hint}")
    } else {
        match &app.notice {
            Some(Notice::Info(msg) | Notice::Error(msg)) => format!("{msg} · {nav_hint}"),
            None => nav_hint.to_owned(),
        }
    };

    let status_style = match (&app.notice, app.is_loading) {
        (_, true) => Style::default().fg(Color::Yellow),
        (Some(Notice::Error(_)), false) => Style::default().fg(Color::Red),
        (Some(Notice::Info(_)), false) => Style::default().fg(Color::Green),
        (None, false) => Style::default(),
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_upload(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // path input
            Constraint::Min(0),    // result card
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [input_area, card_area] = chunks else {
        return;
    };

    let input = Paragraph::new(app.path_input.as_str())
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{} (JPG, PNG, WEBP or GIF path, Enter)",
            app.upload.status_label()
        )))
        .wrap(Wrap { trim: true });
    frame.render_widget(input, *input_area);

    let reading = app
        .upload
        .pending()
        .map(|file| format!("Reading {}…", file.name()));

    let Some(result) = app.result() else {
        let hint = match (&reading, app.upload.is_busy()) {
            (Some(note), _) => note.clone(),
            (None, true) => String::from("Identifying…"),
            (None, false) => String::from(
                "Point at a photo of your waste to see what it is and what it is worth.",
            ),
        };
        let paragraph = Paragraph::new(hint)
            .block(Block::default().borders(Borders::ALL).title("Result"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, *card_area);
        return;
    };

    let title = match (reading, app.upload.preview()) {
        (Some(note), _) => note,
        (None, Some(image)) => format!("Result for {} ({})", image.name, image.mime),
        (None, None) => String::from("Result"),
    };

    let paragraph = Paragraph::new(result_lines(app, result))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, *card_area);
}

fn result_lines(app: &App, result: &ClassificationResult) -> Vec<Line<'static>> {
    let entry = pricing(result.category);
    let estimate = app.estimate().unwrap_or_default();

    vec![
        Line::from(Span::styled(
            entry.display_name,
            Style::default()
                .fg(category_color(result.category))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "Confidence: {}% (model label: {})",
            result.confidence_percent(),
            result.label
        )),
        Line::from(format!("Rate: {} / kg", format_rupees(entry.rate_per_kg))),
        Line::from(""),
        Line::from(vec![
            Span::raw(format!("Estimate for {} kg: ", app.weight_kg)),
            Span::styled(
                format_rupees(estimate),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            "Prices are indicative; the center sets the final rate.",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn draw_centers(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = match (&app.nearby, app.coords) {
        (Some(nearby), _) => format!(
            "Recycling centers near {} (updated {})",
            nearby.origin,
            nearby.fetched_at.with_timezone(&Local).format("%H:%M")
        ),
        (None, Some(coords)) => format!("Recycling centers near {coords}"),
        (None, None) => String::from("Recycling centers"),
    };

    if app.is_loading && app.nearby.is_none() {
        let paragraph = Paragraph::new("Finding centers near you…")
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let centers = app.centers();
    if centers.is_empty() {
        let radius_km = f64::from(app.service.settings().radius_meters) / 1_000.0;
        let paragraph = Paragraph::new(format!(
            "No centers found within {radius_km} km. Try enabling location services, or press r to retry."
        ))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [list_area, detail_area] = chunks else {
        return;
    };

    let items = centers
        .iter()
        .map(|center| {
            ListItem::new(format!(
                "{:>8}  {}  {}",
                format_distance_km(center.distance_meters),
                center.name,
                center.phone.as_deref().unwrap_or("")
            ))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    state.select(Some(app.center_list_index));
    frame.render_stateful_widget(list, *list_area, &mut state);

    if let Some(center) = app.selected_center() {
        draw_center_detail(frame, center, *detail_area);
    }
}

fn draw_center_detail(frame: &mut Frame<'_>, center: &Center, area: Rect) {
    let mut lines = vec![Line::from(format!("Directions: {}", directions_url(center)))];
    if let Some(phone) = &center.phone {
        lines.push(Line::from(format!("Call: {phone}")));
    }
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(center.name.as_str()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_prices(frame: &mut Frame<'_>, area: Rect) {
    let rows = showcase().iter().map(|entry| {
        Row::new(vec![
            Cell::from(entry.display_name),
            Cell::from(format!("{} / kg", format_rupees(entry.rate_per_kg))),
        ])
        .style(Style::default().fg(category_color(entry.category)))
    });

    let column_widths = [Constraint::Min(28), Constraint::Length(12)];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Category", "Rate"]).style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("What we pay (indicative)"),
        )
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn category_color(category: WasteCategory) -> Color {
    match category {
        WasteCategory::Paper => Color::Blue,
        WasteCategory::Plastic => Color::Yellow,
        WasteCategory::Glass => Color::Cyan,
        WasteCategory::Metal => Color::LightBlue,
        WasteCategory::Mixed => Color::Gray,
    }
}

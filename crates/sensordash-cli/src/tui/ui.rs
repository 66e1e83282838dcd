//! TUI rendering.
//!
//! ┌──────────────────────────────────────────────────────────┐
//! │  📡 sensordash   source: firebase   #42   subscribed     │
//! ├───────────┬──────────┬──────────┬────────────┬───────────┤
//! │ Temp      │ Humidity │ Pressure │ Accel      │ Altitude  │
//! │ 21.40 °C  │ 40.20 %  │ 101325 Pa│ X 0.01 ... │ 2195.00 m │
//! ├───────────┴──────────┴──────────┴────────────┴───────────┤
//! │  Temperature │ Humidity │ Pressure │ Altitude │ X │ Y │ Z  │
//! ├──────────────────────────────────────────────────────────┤
//! │  ╭ Temperature (°C)                                      │
//! │  │      ⠤⠒⠉⠑⠢⠤                                           │
//! │  ╰──────────────────── 12:00:01 ... 12:00:20             │
//! ├──────────────────────────────────────────────────────────┤
//! │  ←→ metric   1-7 pick   g: graph   p: pause   q: quit    │
//! └──────────────────────────────────────────────────────────┘

use super::app::App;
use ratatui::{prelude::*, widgets::*};
use sensordash_core::{Card, DriverState, Metric};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(6), // cards
            Constraint::Length(3), // controls
            Constraint::Min(8),    // chart
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_cards(f, rows[1], app);
    draw_controls(f, rows[2], app);
    draw_chart(f, rows[3], app);
    draw_keys(f, rows[4]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let info = app.source_info();
    let received = app.dashboard().store().received();

    let (state, color) = if app.is_paused() {
        ("paused".to_string(), Color::Yellow)
    } else if app.source_closed() {
        ("source closed".to_string(), Color::Red)
    } else if app.state() == DriverState::Subscribed {
        (app.state().to_string(), Color::Green)
    } else {
        (app.state().to_string(), Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" 📡 sensordash ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("  source: "),
            Span::styled(info.name.as_str(), Style::default().bold().fg(Color::Yellow)),
            Span::styled(
                format!(" {}/{}  #{received}  ", info.origin, info.path),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(format!("{state} "), Style::default().fg(color)),
        ]));

    let status = match (app.error(), app.last_export()) {
        (Some(err), _) => Line::from(Span::styled(err, Style::default().fg(Color::Red))),
        (None, Some(path)) => Line::from(Span::styled(
            format!("saved {}", path.display()),
            Style::default().fg(Color::DarkGray),
        )),
        (None, None) if received == 0 => Line::from(Span::styled(
            "waiting for the first snapshot",
            Style::default().fg(Color::DarkGray),
        )),
        _ => Line::from(""),
    };

    f.render_widget(Paragraph::new(status).block(block), area);
}

fn draw_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = app.dashboard().cards();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, cards.len() as u32); cards.len()])
        .split(area);

    let active = app.dashboard().active();
    for (card, col) in cards.iter().zip(cols.iter()) {
        draw_card(f, *col, card, active);
    }
}

fn draw_card(f: &mut Frame, area: Rect, card: &Card, active: Metric) {
    let highlighted = card.readouts.iter().any(|r| r.metric == active);
    let border = if highlighted {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let lines: Vec<Line> = if card.readouts.len() == 1 {
        let r = &card.readouts[0];
        vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("{:.2} {}", r.value, r.unit),
                Style::default().bold(),
            ))
            .centered(),
        ]
    } else {
        card.readouts
            .iter()
            .map(|r| {
                let style = if r.metric == active {
                    Style::default().bold().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:<7}", r.name), Style::default().fg(Color::DarkGray)),
                    Span::styled(format!("{:>8.2} {}", r.value, r.unit), style),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {} ", card.title));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_controls(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Metric::PICKER_ORDER
        .iter()
        .enumerate()
        .map(|(i, m)| Line::from(format!("{} {}", i + 1, m.picker_name())))
        .collect();

    let toggle = if app.dashboard().chart_visible() {
        " g: Hide graph "
    } else {
        " g: Show graph "
    };

    let tabs = Tabs::new(titles)
        .select(app.dashboard().active().picker_index())
        .highlight_style(Style::default().bold().fg(Color::Black).bg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Metric ")
                .title_top(Line::from(toggle).right_aligned()),
        );
    f.render_widget(tabs, area);
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
    let dash = app.dashboard();
    let config = dash.chart_config();

    if !config.visible {
        let block = Block::default().borders(Borders::ALL).title(" Chart ");
        let p = Paragraph::new("Chart hidden. Press g to show it.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let series = dash.series();
    let title = match series.latest() {
        Some(v) => format!(" {}  {} ", series.label, config.format_tick(v)),
        None => format!(" {} ", series.label),
    };

    if series.is_empty() {
        let block = Block::default().borders(Borders::ALL).title(title);
        let p = Paragraph::new("Waiting for readings…")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let data: Vec<(f64, f64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64, v))
        .collect();

    let datasets = vec![
        Dataset::default()
            .name(series.label)
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&data),
    ];

    let times = series.time_labels();
    let x_labels: Vec<Line> = match times.len() {
        0 => vec![],
        1 => vec![Line::from(times[0].clone())],
        n => vec![
            Line::from(times[0].clone()),
            Line::from(times[n / 2].clone()),
            Line::from(times[n - 1].clone()),
        ],
    };
    let x_max = (series.values.len().saturating_sub(1) as f64).max(1.0);

    let (y_min, y_max) = series.y_bounds();
    let y_mid = (y_min + y_max) / 2.0;

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(
            Axis::default()
                .title(format!("last {} readings", config.window_size))
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Line::from(config.format_tick(y_min)),
                    Line::from(config.format_tick(y_mid)),
                    Line::from(config.format_tick(y_max)),
                ]),
        );

    f.render_widget(chart, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " ←→ metric   1-7 pick   g/space: graph   p: pause   s: export   q: quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use sensordash_core::{SimulatedSource, SubscriptionDriver};
    use std::time::Duration;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 32)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app(chart: bool) -> App {
        let source = SimulatedSource::new(Duration::from_secs(3600), Some(5));
        App::new(SubscriptionDriver::new(Box::new(source)), Metric::Temp, chart)
    }

    #[test]
    fn initial_screen_shows_offset_altitude_and_hidden_chart() {
        let screen = render(&app(false));
        assert!(screen.contains("sensordash"));
        assert!(screen.contains("2160.00 m"));
        assert!(screen.contains("Chart hidden"));
        assert!(screen.contains("Show graph"));
    }

    #[test]
    fn visible_chart_shows_series_label() {
        let mut a = app(true);
        a.handle_key(crossterm::event::KeyCode::Char('2'));
        let screen = render(&a);
        assert!(screen.contains("Humidity (%)"));
        assert!(screen.contains("Hide graph"));
        assert!(screen.contains("Waiting for readings"));
    }

    #[test]
    fn cards_render_all_readouts() {
        let screen = render(&app(false));
        for title in ["Temperature", "Humidity", "Air Pressure", "Acceleration", "Altitude"] {
            assert!(screen.contains(title), "missing card {title}");
        }
        assert!(screen.contains("X-axis"));
    }
}

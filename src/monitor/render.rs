//! Frame rendering.

use gecko::format::{format_compact_usd, format_percent, format_supply, format_symbol, format_usd};
use gecko::{AssetSnapshot, PriceSeries, Trend};
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState, Wrap,
};

use super::state::{InputMode, Palette, ViewMode, ViewState, CARD_COLUMNS};
use crate::controller::{Controller, MarketSource};

/// Rows taken by one card, borders included.
const CARD_HEIGHT: u16 = 6;

/// Render the full TUI frame.
pub fn render_ui<S: MarketSource>(
    frame: &mut Frame,
    state: &ViewState,
    controller: &Controller<S>,
    currency: &str,
) {
    let area = frame.area();
    let p = state.theme.palette();
    frame.render_widget(Block::default().style(Style::default().bg(p.bg).fg(p.text)), area);

    // Layout: header, search bar, main panels, log.
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(3), // search
            Constraint::Min(10),   // panels
            Constraint::Length(7), // log
        ])
        .split(area);

    render_header(frame, main_layout[0], state, controller, currency, &p);
    render_search(frame, main_layout[1], state, &p);

    // Panels: asset list (55%) | detail above chart (45%).
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(main_layout[2]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(8)])
        .split(panels[1]);

    let visible = state.visible(controller.snapshots());
    match state.view {
        ViewMode::Table => render_table(frame, panels[0], &visible, state, &p),
        ViewMode::Cards => render_cards(frame, panels[0], &visible, state, &p),
    }

    let selected = visible.get(state.selected).copied();
    render_detail(frame, right[0], selected, controller, &p);
    render_chart(frame, right[1], state, controller, &p);
    render_log(frame, main_layout[3], state, &p);
}

fn panel<'a>(title: impl Into<Line<'a>>, p: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(p.accent))
        .title(title)
}

fn change_style(pct: f64, p: &Palette) -> Style {
    match Trend::classify(pct) {
        Trend::Increase => Style::default().fg(p.up),
        Trend::Decrease => Style::default().fg(p.down),
    }
}

fn render_header<S: MarketSource>(
    frame: &mut Frame,
    area: Rect,
    state: &ViewState,
    controller: &Controller<S>,
    currency: &str,
    p: &Palette,
) {
    let refreshed = match controller.last_refresh() {
        Some(at) => at.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
        None => "never".to_string(),
    };
    let status = if controller.is_snapshot_pending() {
        " | refreshing..."
    } else {
        ""
    };
    let text = format!(
        " COINWATCH - {} | updated {refreshed}{status} | sort: {} {} | theme: {} | 'q' to quit",
        currency.to_uppercase(),
        state.sort.label(),
        if state.descending { "desc" } else { "asc" },
        state.theme.name(),
    );
    let header = Paragraph::new(text)
        .style(Style::default().fg(p.header_fg).bg(p.header_bg).bold())
        .alignment(Alignment::Center);
    frame.render_widget(header, area);
}

fn render_search(frame: &mut Frame, area: Rect, state: &ViewState, p: &Palette) {
    let line = match state.input {
        InputMode::Search => Line::from(vec![
            Span::raw(" / "),
            Span::styled(format!("{}_", state.query), Style::default().fg(p.accent)),
        ]),
        InputMode::Normal if state.query.is_empty() => Line::styled(
            " / search  v view  s sort  S reverse  d range  t theme  r refresh  Enter chart",
            Style::default().fg(p.muted),
        ),
        InputMode::Normal => Line::from(vec![
            Span::raw(" / "),
            Span::raw(state.query.as_str()),
        ]),
    };
    frame.render_widget(Paragraph::new(line).block(panel(" Search ", p)), area);
}

fn render_table(
    frame: &mut Frame,
    area: Rect,
    rows: &[&AssetSnapshot],
    state: &ViewState,
    p: &Palette,
) {
    let header = Row::new(["Coin", "Symbol", "Price", "Market Cap", "24h", "7d"])
        .style(Style::default().fg(p.muted).bold());

    let body: Vec<Row> = rows
        .iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(s.name.as_str()),
                Cell::from(format_symbol(&s.symbol)),
                Cell::from(format_usd(s.current_price)),
                Cell::from(format_compact_usd(s.market_cap)),
                Cell::from(format_percent(s.change_24h())).style(change_style(s.change_24h(), p)),
                Cell::from(format_percent(s.change_7d())).style(change_style(s.change_7d(), p)),
            ])
        })
        .collect();

    let title = format!(" Markets ({}) ", rows.len());
    let table = Table::new(
        body,
        [
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(14),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(panel(title, p))
    .row_highlight_style(Style::default().bg(p.highlight_bg).bold())
    .highlight_symbol("> ");

    let mut table_state = TableState::default();
    if !rows.is_empty() {
        table_state.select(Some(state.selected));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_cards(
    frame: &mut Frame,
    area: Rect,
    cards: &[&AssetSnapshot],
    state: &ViewState,
    p: &Palette,
) {
    let outer = panel(format!(" Markets ({}) ", cards.len()), p);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows_fit = (inner.height / CARD_HEIGHT).max(1) as usize;
    let selected_row = state.selected / CARD_COLUMNS;
    let first_row = selected_row.saturating_sub(rows_fit - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); rows_fit])
        .split(inner);

    for (slot, row_area) in row_areas.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, CARD_COLUMNS as u32); CARD_COLUMNS])
            .split(*row_area);

        for (col, card_area) in cols.iter().enumerate() {
            let index = (first_row + slot) * CARD_COLUMNS + col;
            let Some(asset) = cards.get(index) else {
                return;
            };
            render_card(frame, *card_area, asset, index == state.selected, p);
        }
    }
}

fn render_card(frame: &mut Frame, area: Rect, asset: &AssetSnapshot, selected: bool, p: &Palette) {
    let border = if selected {
        Style::default().fg(p.accent).bold()
    } else {
        Style::default().fg(p.muted)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {} ", format_symbol(&asset.symbol)));

    let lines = vec![
        Line::from(asset.name.as_str()).bold(),
        Line::from(format_usd(asset.current_price)),
        Line::from(vec![
            Span::raw("24h "),
            Span::styled(format_percent(asset.change_24h()), change_style(asset.change_24h(), p)),
        ]),
        Line::styled(
            format!("cap {}", format_compact_usd(asset.market_cap)),
            Style::default().fg(p.muted),
        ),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_detail<S: MarketSource>(
    frame: &mut Frame,
    area: Rect,
    asset: Option<&AssetSnapshot>,
    controller: &Controller<S>,
    p: &Palette,
) {
    let Some(a) = asset else {
        let empty = Paragraph::new(Line::styled(" No asset selected", Style::default().fg(p.muted)))
            .block(panel(" Detail ", p));
        frame.render_widget(empty, area);
        return;
    };

    let icon = match (controller.icon(&a.id), a.image.as_ref()) {
        (Some(icon), _) => format!(
            "{} ({} bytes)",
            icon.content_type.as_deref().unwrap_or("image"),
            icon.len()
        ),
        (None, Some(_)) if controller.icon_failed(&a.id) => "unavailable".to_string(),
        (None, Some(_)) => "loading".to_string(),
        (None, None) => "none".to_string(),
    };

    let label = |name: &'static str| Span::styled(format!(" {name:<12}"), Style::default().fg(p.muted));
    let lines = vec![
        Line::from(vec![label("Price"), Span::raw(format_usd(a.current_price)).bold()]),
        Line::from(vec![label("Market cap"), Span::raw(format_usd(a.market_cap))]),
        Line::from(vec![label("Volume 24h"), Span::raw(format_usd(a.total_volume))]),
        Line::from(vec![label("Circulating"), Span::raw(format_supply(a.circulating_supply))]),
        Line::from(vec![label("Total supply"), Span::raw(format_supply(a.total_supply))]),
        Line::from(vec![
            label("Change 24h"),
            Span::styled(format_percent(a.change_24h()), change_style(a.change_24h(), p)),
        ]),
        Line::from(vec![
            label("Change 7d"),
            Span::styled(format_percent(a.change_7d()), change_style(a.change_7d(), p)),
        ]),
        Line::from(vec![label("Icon"), Span::raw(icon)]),
    ];

    let title = format!(" {} ({}) ", a.name, format_symbol(&a.symbol));
    frame.render_widget(Paragraph::new(lines).block(panel(title, p)), area);
}

fn render_chart<S: MarketSource>(
    frame: &mut Frame,
    area: Rect,
    state: &ViewState,
    controller: &Controller<S>,
    p: &Palette,
) {
    let loading = if controller.is_history_pending() {
        " (loading)"
    } else {
        ""
    };

    let Some(series) = controller.history() else {
        let hint = Paragraph::new(Line::styled(
            " Select an asset and press Enter",
            Style::default().fg(p.muted),
        ))
        .block(panel(format!(" Chart {}{loading} ", state.range), p));
        frame.render_widget(hint, area);
        return;
    };

    let name = controller
        .find(&series.asset_id)
        .map(|a| a.name.as_str())
        .unwrap_or(series.asset_id.as_str());
    let overall = series
        .overall_change()
        .map(|c| format!(" {}", format_percent(c)))
        .unwrap_or_default();
    let title = Line::from(vec![
        Span::raw(format!(" {name} {}", series.range)),
        Span::styled(overall, change_style(series.overall_change().unwrap_or(0.0), p)),
        Span::raw(format!("{loading} ")),
    ]);

    let (line, ups, downs) = chart_points(series);
    let (x_min, x_max) = match (line.first(), line.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
        (Some(first), _) => (first.0 - 1.0, first.0 + 1.0),
        _ => (0.0, 1.0),
    };
    let (y_min, y_max) = padded_bounds(series.price_bounds().unwrap_or((0.0, 1.0)));

    let datasets = vec![
        Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(p.accent))
            .data(&line),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(p.up))
            .data(&ups),
        Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(p.down))
            .data(&downs),
    ];

    let date_label = |ts: f64| {
        chrono::DateTime::from_timestamp(ts as i64, 0)
            .map(|d| d.format("%m-%d").to_string())
            .unwrap_or_default()
    };
    let x_axis = Axis::default()
        .style(Style::default().fg(p.muted))
        .bounds([x_min, x_max])
        .labels([date_label(x_min), date_label((x_min + x_max) / 2.0), date_label(x_max)]);
    let y_axis = Axis::default()
        .style(Style::default().fg(p.muted))
        .bounds([y_min, y_max])
        .labels([format_compact_usd(y_min), format_compact_usd(y_max)]);

    let chart = Chart::new(datasets)
        .block(panel(title, p))
        .x_axis(x_axis)
        .y_axis(y_axis);
    frame.render_widget(chart, area);
}

type Points = Vec<(f64, f64)>;

/// Price line plus the daily endpoints split by trend, keyed by unix seconds.
fn chart_points(series: &PriceSeries) -> (Points, Points, Points) {
    let line = series
        .points
        .iter()
        .map(|pt| (pt.timestamp.timestamp() as f64, pt.price))
        .collect();

    let mut ups = Vec::new();
    let mut downs = Vec::new();
    for change in &series.changes {
        let xy = (change.timestamp.timestamp() as f64, change.price);
        match change.trend {
            Some(Trend::Increase) => ups.push(xy),
            Some(Trend::Decrease) => downs.push(xy),
            None => {}
        }
    }
    (line, ups, downs)
}

/// Widen `(lo, hi)` by 5% so extremes don't sit on the border.
fn padded_bounds((lo, hi): (f64, f64)) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (hi.abs() * 0.01).max(1e-9)
    };
    (lo - pad, hi + pad)
}

fn render_log(frame: &mut Frame, area: Rect, state: &ViewState, p: &Palette) {
    // Show the tail that fits.
    let capacity = area.height.saturating_sub(2) as usize;
    let skip = state.log.len().saturating_sub(capacity);
    let lines: Vec<Line> = state
        .log
        .iter()
        .skip(skip)
        .map(|l| Line::from(l.as_str()))
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(panel(" Log ", p))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

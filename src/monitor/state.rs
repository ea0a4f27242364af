//! View state of the monitor, independent of the terminal.
//!
//! Keys go in through [`ViewState::handle_key`] and come out as an
//! [`Action`] for the event loop to carry out against the controller.

use std::cmp::Ordering;
use std::collections::VecDeque;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gecko::{filter_snapshots, AssetSnapshot, ChartRange};
use ratatui::style::Color;

/// Maximum log lines retained.
pub const MAX_LOG_LINES: usize = 200;

/// Cards per row in the card view.
pub const CARD_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Table,
    Cards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

/// Colors for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub header_fg: Color,
    pub header_bg: Color,
    pub highlight_bg: Color,
    pub up: Color,
    pub down: Color,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Dark => Palette {
                bg: Color::Reset,
                text: Color::White,
                muted: Color::DarkGray,
                accent: Color::Cyan,
                header_fg: Color::White,
                header_bg: Color::Blue,
                highlight_bg: Color::DarkGray,
                up: Color::Green,
                down: Color::Red,
            },
            Self::Light => Palette {
                bg: Color::White,
                text: Color::Black,
                muted: Color::Gray,
                accent: Color::Blue,
                header_fg: Color::Black,
                header_bg: Color::LightCyan,
                highlight_bg: Color::LightYellow,
                up: Color::Green,
                down: Color::Red,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

/// Column the asset list is ordered by. `Rank` keeps server order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rank,
    Name,
    Price,
    MarketCap,
    Change24h,
    Change7d,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            Self::Rank => Self::Name,
            Self::Name => Self::Price,
            Self::Price => Self::MarketCap,
            Self::MarketCap => Self::Change24h,
            Self::Change24h => Self::Change7d,
            Self::Change7d => Self::Rank,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Name => "name",
            Self::Price => "price",
            Self::MarketCap => "market cap",
            Self::Change24h => "24h",
            Self::Change7d => "7d",
        }
    }

    fn compare(self, a: &AssetSnapshot, b: &AssetSnapshot) -> Ordering {
        match self {
            Self::Rank => Ordering::Equal,
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::Price => a.current_price.total_cmp(&b.current_price),
            Self::MarketCap => a.market_cap.total_cmp(&b.market_cap),
            Self::Change24h => a.change_24h().total_cmp(&b.change_24h()),
            Self::Change7d => a.change_7d().total_cmp(&b.change_7d()),
        }
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    Refresh,
    ShowChart { asset_id: String },
    RangeChanged(ChartRange),
}

#[derive(Debug)]
pub struct ViewState {
    pub query: String,
    pub input: InputMode,
    pub view: ViewMode,
    pub theme: Theme,
    pub sort: SortKey,
    pub descending: bool,
    pub selected: usize,
    pub range: ChartRange,
    pub log: VecDeque<String>,
}

impl ViewState {
    pub fn new(range: ChartRange) -> Self {
        Self {
            query: String::new(),
            input: InputMode::Normal,
            view: ViewMode::Table,
            theme: Theme::Dark,
            sort: SortKey::Rank,
            descending: false,
            selected: 0,
            range,
            log: VecDeque::with_capacity(MAX_LOG_LINES),
        }
    }

    /// Snapshots matching the search query, in display order.
    pub fn visible<'a>(&self, snapshots: &'a [AssetSnapshot]) -> Vec<&'a AssetSnapshot> {
        let mut rows = filter_snapshots(snapshots, &self.query);
        if self.sort != SortKey::Rank {
            rows.sort_by(|a, b| self.sort.compare(a, b));
        }
        if self.descending {
            rows.reverse();
        }
        rows
    }

    pub fn selected_asset<'a>(&self, snapshots: &'a [AssetSnapshot]) -> Option<&'a AssetSnapshot> {
        self.visible(snapshots).get(self.selected).copied()
    }

    /// Keep the selection inside a list of `len` rows.
    pub fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Append a timestamped line to the log panel.
    pub fn push_log(&mut self, line: impl AsRef<str>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.log.push_back(format!("{stamp} {}", line.as_ref()));
        while self.log.len() > MAX_LOG_LINES {
            self.log.pop_front();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, visible: &[&AssetSnapshot]) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match self.input {
            InputMode::Search => self.handle_search_key(key.code),
            InputMode::Normal => self.handle_normal_key(key.code, visible),
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char(c) => {
                self.query.push(c);
                self.selected = 0;
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.selected = 0;
            }
            KeyCode::Enter | KeyCode::Esc => self.input = InputMode::Normal,
            _ => {}
        }
        Action::None
    }

    fn handle_normal_key(&mut self, code: KeyCode, visible: &[&AssetSnapshot]) -> Action {
        let len = visible.len();
        let step = match self.view {
            ViewMode::Table => 1,
            ViewMode::Cards => CARD_COLUMNS,
        };

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Char('/') => self.input = InputMode::Search,
            KeyCode::Char('r') => return Action::Refresh,
            KeyCode::Char('v') => {
                self.view = match self.view {
                    ViewMode::Table => ViewMode::Cards,
                    ViewMode::Cards => ViewMode::Table,
                };
            }
            KeyCode::Char('t') => self.theme = self.theme.toggle(),
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.selected = 0;
            }
            KeyCode::Char('S') => {
                self.descending = !self.descending;
                self.selected = 0;
            }
            KeyCode::Char('d') => {
                self.range = self.range.next();
                return Action::RangeChanged(self.range);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(step);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + step < len {
                    self.selected += step;
                }
            }
            KeyCode::Left | KeyCode::Char('h') if self.view == ViewMode::Cards => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') if self.view == ViewMode::Cards => {
                if self.selected + 1 < len {
                    self.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(asset) = visible.get(self.selected) {
                    return Action::ShowChart {
                        asset_id: asset.id.clone(),
                    };
                }
            }
            _ => {}
        }
        Action::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crossterm::event::KeyEventKind;

    fn snap(id: &str, name: &str, symbol: &str, price: f64, change_24h: f64) -> AssetSnapshot {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "symbol": symbol,
            "current_price": price,
            "market_cap": price * 1000.0,
            "total_volume": 1.0,
            "price_change_percentage_24h": change_24h,
        }))
        .unwrap()
    }

    fn market() -> Vec<AssetSnapshot> {
        vec![
            snap("bitcoin", "Bitcoin", "btc", 65000.0, 2.5),
            snap("ethereum", "Ethereum", "eth", 3200.0, -1.0),
            snap("solana", "Solana", "sol", 150.0, 4.0),
            snap("dogecoin", "Dogecoin", "doge", 0.12, -3.0),
        ]
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn ids(rows: &[&AssetSnapshot]) -> Vec<String> {
        rows.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_rank_order_is_server_order() {
        let state = ViewState::new(ChartRange::Month);
        let data = market();
        assert_eq!(
            ids(&state.visible(&data)),
            vec!["bitcoin", "ethereum", "solana", "dogecoin"]
        );
    }

    #[test]
    fn test_sort_by_change_descending() {
        let mut state = ViewState::new(ChartRange::Month);
        state.sort = SortKey::Change24h;
        state.descending = true;
        let data = market();
        assert_eq!(
            ids(&state.visible(&data)),
            vec!["solana", "bitcoin", "ethereum", "dogecoin"]
        );
    }

    #[test]
    fn test_search_typing_filters_and_resets_selection() {
        let mut state = ViewState::new(ChartRange::Month);
        let data = market();
        state.selected = 2;

        let visible = state.visible(&data);
        assert_eq!(state.handle_key(press(KeyCode::Char('/')), &visible), Action::None);
        assert_eq!(state.input, InputMode::Search);

        for c in "ETH".chars() {
            let visible = state.visible(&data);
            state.handle_key(press(KeyCode::Char(c)), &visible);
        }
        assert_eq!(state.selected, 0);
        assert_eq!(ids(&state.visible(&data)), vec!["ethereum"]);

        // 'q' is text while searching.
        let visible = state.visible(&data);
        assert_eq!(state.handle_key(press(KeyCode::Char('q')), &visible), Action::None);
        assert!(state.visible(&data).is_empty());

        let visible = state.visible(&data);
        state.handle_key(press(KeyCode::Backspace), &visible);
        state.handle_key(press(KeyCode::Enter), &visible);
        assert_eq!(state.input, InputMode::Normal);
        assert_eq!(state.query, "ETH");
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut state = ViewState::new(ChartRange::Month);
        let data = market();
        let visible = state.visible(&data);

        state.handle_key(press(KeyCode::Up), &visible);
        assert_eq!(state.selected, 0);
        for _ in 0..10 {
            state.handle_key(press(KeyCode::Down), &visible);
        }
        assert_eq!(state.selected, 3);

        state.view = ViewMode::Cards;
        state.selected = 0;
        state.handle_key(press(KeyCode::Down), &visible);
        assert_eq!(state.selected, CARD_COLUMNS);
        state.handle_key(press(KeyCode::Down), &visible);
        assert_eq!(state.selected, CARD_COLUMNS);
        state.handle_key(press(KeyCode::Left), &visible);
        assert_eq!(state.selected, CARD_COLUMNS - 1);
    }

    #[test]
    fn test_enter_requests_chart_for_selection() {
        let mut state = ViewState::new(ChartRange::Month);
        let data = market();
        let visible = state.visible(&data);
        state.handle_key(press(KeyCode::Down), &visible);
        assert_eq!(
            state.handle_key(press(KeyCode::Enter), &visible),
            Action::ShowChart {
                asset_id: "ethereum".into()
            }
        );
        assert_eq!(state.handle_key(press(KeyCode::Enter), &[]), Action::None);
    }

    #[test]
    fn test_range_cycles_and_commands() {
        let mut state = ViewState::new(ChartRange::Month);
        assert_eq!(
            state.handle_key(press(KeyCode::Char('d')), &[]),
            Action::RangeChanged(ChartRange::Quarter)
        );
        assert_eq!(state.handle_key(press(KeyCode::Char('r')), &[]), Action::Refresh);
        state.handle_key(press(KeyCode::Char('t')), &[]);
        assert_eq!(state.theme, Theme::Light);
        state.handle_key(press(KeyCode::Char('v')), &[]);
        assert_eq!(state.view, ViewMode::Cards);
        assert_eq!(state.handle_key(press(KeyCode::Char('q')), &[]), Action::Quit);
    }

    #[test]
    fn test_clamp_selection_after_shrink() {
        let mut state = ViewState::new(ChartRange::Month);
        state.selected = 5;
        state.clamp_selection(2);
        assert_eq!(state.selected, 1);
        state.clamp_selection(0);
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut state = ViewState::new(ChartRange::Month);
        for i in 0..MAX_LOG_LINES + 10 {
            state.push_log(format!("line {i}"));
        }
        assert_eq!(state.log.len(), MAX_LOG_LINES);
        assert!(state.log.back().unwrap().ends_with(&format!("line {}", MAX_LOG_LINES + 9)));
    }
}

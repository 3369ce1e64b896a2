use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, BorderType, Borders, Chart, Dataset, GraphType, Paragraph, Sparkline},
};

use crate::game::{GameState, Position, RelativeAction};
use crate::metrics::{Dashboard, TrainingStats, dashboard::DASHBOARD_WINDOW};

/// Read-only snapshot of a training session for one frame
pub struct TrainingView<'a> {
    pub state: &'a GameState,
    pub stats: &'a TrainingStats,
    pub dashboard: &'a Dashboard,
    pub games_played: usize,
    pub epsilon: i64,
    pub paused: bool,
    pub tick_ms: u64,
}

/// Q-value line colours, indexed by `RelativeAction::index`
const ACTION_COLORS: [Color; RelativeAction::COUNT] = [Color::Cyan, Color::Yellow, Color::Magenta];

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Keyboard play: board, score line and controls
    pub fn render(&self, frame: &mut Frame, state: &GameState, stats: &TrainingStats, paused: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let header = self.render_stats(state, stats, paused);
        frame.render_widget(header, chunks[0]);

        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(board_width(state)),
                Constraint::Min(0),
            ])
            .split(chunks[1])[1];

        if state.is_alive {
            frame.render_widget(self.render_grid(state), game_area);
        } else {
            frame.render_widget(self.render_game_over(state), game_area);
        }

        let controls = self.render_controls(" to steer | ");
        frame.render_widget(controls, chunks[2]);
    }

    /// Agent training: board on the left, diagnostics on the right
    pub fn render_training(&self, frame: &mut Frame, view: &TrainingView) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        frame.render_widget(self.render_training_header(view), chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(board_width(view.state)), Constraint::Min(0)])
            .split(chunks[1]);

        frame.render_widget(self.render_grid(view.state), body[0]);
        self.render_dashboard(frame, body[1], view);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Space", Style::default().fg(Color::Cyan)),
                Span::raw(" pause | "),
                Span::styled("1-4", Style::default().fg(Color::Cyan)),
                Span::raw(" speed | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" quit"),
            ]))
            .alignment(Alignment::Center),
            chunks[2],
        );
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect, view: &TrainingView) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(30),
                Constraint::Percentage(35),
            ])
            .split(area);
        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(0)])
            .split(rows[1]);
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(view.dashboard.cols() as u16 + 2)])
            .split(rows[2]);

        // Scores and running mean
        let scores: Vec<(f64, f64)> = view
            .stats
            .scores()
            .iter()
            .enumerate()
            .map(|(i, &s)| (i as f64 + 1.0, s as f64))
            .collect();
        let means: Vec<(f64, f64)> = view
            .stats
            .mean_scores()
            .iter()
            .enumerate()
            .map(|(i, &m)| (i as f64 + 1.0, m as f64))
            .collect();
        let games = scores.len().max(1) as f64;
        let top = (view.stats.record().max(1)) as f64;
        let score_chart = Chart::new(vec![
            Dataset::default()
                .name("score")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Blue))
                .data(&scores),
            Dataset::default()
                .name("mean")
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::LightRed))
                .data(&means),
        ])
        .block(titled(" Training "))
        .x_axis(
            Axis::default()
                .bounds([0.0, games])
                .labels(vec!["0".to_string(), format!("{}", games as usize)]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, top])
                .labels(vec!["0".to_string(), format!("{}", top as u32)]),
        );
        frame.render_widget(score_chart, rows[0]);

        // Action distribution
        let counts = view.dashboard.action_counts();
        let bars: Vec<(&str, u64)> = RelativeAction::ALL
            .iter()
            .map(|a| (a.label(), counts[a.index()]))
            .collect();
        let action_chart = BarChart::default()
            .block(titled(" Actions "))
            .data(bars.as_slice())
            .bar_width(6)
            .bar_gap(2)
            .bar_style(Style::default().fg(Color::Green))
            .value_style(Style::default().fg(Color::Black).bg(Color::Green));
        frame.render_widget(action_chart, middle[0]);

        // Recent Q-values, one line per action
        let q_series: Vec<Vec<(f64, f64)>> = (0..RelativeAction::COUNT)
            .map(|a| {
                view.dashboard
                    .q_history()
                    .enumerate()
                    .map(|(i, q)| (i as f64, q[a] as f64))
                    .collect()
            })
            .collect();
        let (q_min, q_max) = q_bounds(view.dashboard);
        let q_chart = Chart::new(
            RelativeAction::ALL
                .iter()
                .zip(q_series.iter())
                .map(|(a, points)| {
                    Dataset::default()
                        .name(a.label())
                        .marker(symbols::Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().fg(ACTION_COLORS[a.index()]))
                        .data(points)
                })
                .collect(),
        )
        .block(titled(" Q-values "))
        .x_axis(Axis::default().bounds([0.0, DASHBOARD_WINDOW as f64]))
        .y_axis(
            Axis::default()
                .bounds([q_min, q_max])
                .labels(vec![format!("{:.1}", q_min), format!("{:.1}", q_max)]),
        );
        frame.render_widget(q_chart, middle[1]);

        // Recent rewards, shifted so the death penalty sits at the baseline
        let rewards: Vec<u64> = view.dashboard.reward_history().map(reward_bar).collect();
        let sparkline = Sparkline::default()
            .block(titled(" Rewards "))
            .data(rewards.as_slice())
            .max(20)
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(sparkline, bottom[0]);

        frame.render_widget(self.render_heatmap(view.dashboard), bottom[1]);
    }

    fn render_heatmap(&self, dashboard: &Dashboard) -> Paragraph<'_> {
        let max = dashboard.max_heat();
        let lines: Vec<Line> = (0..dashboard.rows())
            .map(|row| {
                let spans: Vec<Span> = (0..dashboard.cols())
                    .map(|col| {
                        let heat = dashboard.heat(col, row);
                        if heat == 0 {
                            Span::styled("·", Style::default().fg(Color::DarkGray))
                        } else {
                            Span::styled("█", Style::default().fg(heat_color(heat, max)))
                        }
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines).block(titled(" Visits "))
    }

    fn render_training_header(&self, view: &TrainingView) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

        let mut spans = vec![
            Span::styled("Game: ", label),
            Span::styled(view.games_played.to_string(), value),
            Span::raw("    "),
            Span::styled("Score: ", label),
            Span::styled(view.state.score.to_string(), value),
            Span::raw("    "),
            Span::styled("Record: ", label),
            Span::styled(view.stats.record().to_string(), value),
            Span::raw("    "),
            Span::styled("Mean: ", label),
            Span::styled(format!("{:.2}", view.stats.mean_score()), value),
            Span::raw("    "),
            Span::styled("Epsilon: ", label),
            Span::styled(view.epsilon.max(0).to_string(), value),
            Span::raw("    "),
            Span::styled("Tick: ", label),
            Span::styled(format!("{}ms", view.tick_ms), value),
        ];
        if view.paused {
            spans.push(Span::raw("    "));
            spans.push(Span::styled(
                "PAUSED",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }

        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }

    fn render_grid(&self, state: &GameState) -> Paragraph<'_> {
        let lines: Vec<Line> = grid_rows(state)
            .into_iter()
            .map(|row| {
                let spans: Vec<Span> = row
                    .into_iter()
                    .map(|cell| match cell {
                        Cell::Head => Span::styled(
                            "■ ",
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ),
                        Cell::Body => Span::styled("□ ", Style::default().fg(Color::Green)),
                        Cell::Food => Span::styled(
                            "O ",
                            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                        ),
                        Cell::Empty => Span::styled(". ", Style::default().fg(Color::DarkGray)),
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(Color::White))
                .title(" Snake "),
        )
    }

    fn render_stats(&self, state: &GameState, stats: &TrainingStats, paused: bool) -> Paragraph<'_> {
        let mut spans = vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                state.score.to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Record: ", Style::default().fg(Color::Yellow)),
            Span::styled(stats.record().to_string(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Games: ", Style::default().fg(Color::Yellow)),
            Span::styled(stats.episodes().to_string(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Time: ", Style::default().fg(Color::Yellow)),
            Span::styled(stats.format_elapsed(), Style::default().fg(Color::White)),
        ];
        if paused {
            spans.push(Span::raw("    "));
            spans.push(Span::styled(
                "PAUSED",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }

        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }

    fn render_game_over(&self, state: &GameState) -> Paragraph<'_> {
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    state.score.to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self, move_hint: &'static str) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(move_hint),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Head,
    Body,
    Food,
    Empty,
}

/// Classify every board cell, row by row
fn grid_rows(state: &GameState) -> Vec<Vec<Cell>> {
    let block = state.block_size.max(1);
    let (cols, rows) = (state.width / block, state.height / block);
    let head = state.snake.head();

    (0..rows)
        .map(|row| {
            (0..cols)
                .map(|col| {
                    let pos = Position::new(col * block, row * block);
                    if pos == head {
                        Cell::Head
                    } else if state.snake.contains(pos) {
                        Cell::Body
                    } else if pos == state.food {
                        Cell::Food
                    } else {
                        Cell::Empty
                    }
                })
                .collect()
        })
        .collect()
}

/// Terminal columns taken by the bordered board (two characters per cell)
fn board_width(state: &GameState) -> u16 {
    let cols = state.width / state.block_size.max(1);
    (cols as u16) * 2 + 2
}

fn titled(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

/// "Hot" colour ramp for the visit heatmap
fn heat_color(heat: u32, max: u32) -> Color {
    if max == 0 {
        return Color::DarkGray;
    }
    let level = heat as f32 / max as f32;
    if level > 0.75 {
        Color::White
    } else if level > 0.5 {
        Color::Yellow
    } else if level > 0.25 {
        Color::LightRed
    } else {
        Color::Red
    }
}

/// Sparkline bar height for a reward; rewards are clamped to [-10, 10]
fn reward_bar(reward: f32) -> u64 {
    (reward.clamp(-10.0, 10.0) + 10.0).round() as u64
}

/// Y-axis range covering every recent Q-value, never degenerate
fn q_bounds(dashboard: &Dashboard) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for q in dashboard.q_history() {
        for &v in q {
            lo = lo.min(v as f64);
            hi = hi.max(v as f64);
        }
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    if hi - lo < 1e-3 {
        return (lo - 0.5, hi + 0.5);
    }
    (lo, hi)
}

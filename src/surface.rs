use ratatui::layout::Rect;
use ratatui::style::{Color, Style, Stylize};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Map, MapResolution};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::map::MapView;

/// Half-width of the longitude window right after a recenter, city scale.
const DEFAULT_SPAN: f64 = 0.12;
const MIN_SPAN: f64 = 0.005;
const MAX_SPAN: f64 = 180.0;
/// Below this zoom the world coastline outline is just noise.
const OUTLINE_SPAN: f64 = 4.0;
/// Pan step as a fraction of the visible window.
const PAN_STEP: f64 = 0.2;

/// Where the map gets drawn. The session and UI layers only know this
/// contract: hand over a view, pan/zoom it, draw it into an area.
pub trait MapSurface {
    /// Mount for the given session generation. Mounting an already-mounted
    /// generation is a no-op; a new generation discards all widget state.
    fn mount(&mut self, generation: u64);
    fn is_mounted(&self) -> bool;
    /// Install the latest planned view. A changed `center_epoch` recenters
    /// (pan and zoom reset); an unchanged one leaves them alone.
    fn sync(&mut self, view: &MapView, center_epoch: u64);
    fn pan(&mut self, dx: f64, dy: f64);
    fn zoom_in(&mut self);
    fn zoom_out(&mut self);
    fn render(&self, frame: &mut Frame, area: Rect, focused: bool, title: &str);
}

/// Terminal adapter drawing a braille canvas with the built-in world map
/// outline plus one printed label per marker.
pub struct CanvasSurface {
    mounted: Option<u64>,
    view: MapView,
    seen_epoch: u64,
    offset: (f64, f64),
    span: f64,
}

impl CanvasSurface {
    pub fn new() -> Self {
        Self {
            mounted: None,
            view: MapView::default(),
            seen_epoch: 0,
            offset: (0.0, 0.0),
            span: DEFAULT_SPAN,
        }
    }
}

impl Default for CanvasSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSurface for CanvasSurface {
    fn mount(&mut self, generation: u64) {
        if self.mounted == Some(generation) {
            return;
        }
        *self = Self::new();
        self.mounted = Some(generation);
    }

    fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    fn sync(&mut self, view: &MapView, center_epoch: u64) {
        if center_epoch != self.seen_epoch {
            self.seen_epoch = center_epoch;
            self.offset = (0.0, 0.0);
            self.span = DEFAULT_SPAN;
        }
        self.view = view.clone();
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        self.offset.0 += dx * self.span * PAN_STEP;
        self.offset.1 += dy * self.span * PAN_STEP;
    }

    fn zoom_in(&mut self) {
        self.span = (self.span * 0.5).max(MIN_SPAN);
    }

    fn zoom_out(&mut self) {
        self.span = (self.span * 2.0).min(MAX_SPAN);
    }

    fn render(&self, frame: &mut Frame, area: Rect, focused: bool, title: &str) {
        let border_color = if focused { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title.to_string());

        if self.mounted.is_none() {
            let placeholder = Paragraph::new("...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        let center_lat = self.view.center.0 + self.offset.1;
        let center_lon = self.view.center.1 + self.offset.0;
        let half_lon = self.span;
        // Terminal cells are roughly twice as tall as wide.
        let half_lat = self.span * 0.5;

        let markers = &self.view.markers;
        let outline = self.span >= OUTLINE_SPAN;

        let canvas = Canvas::default()
            .block(block)
            .marker(symbols::Marker::Braille)
            .x_bounds([center_lon - half_lon, center_lon + half_lon])
            .y_bounds([center_lat - half_lat, center_lat + half_lat])
            .paint(move |ctx| {
                if outline {
                    ctx.draw(&Map {
                        color: Color::DarkGray,
                        resolution: MapResolution::High,
                    });
                }
                for marker in markers {
                    ctx.print(
                        marker.lon,
                        marker.lat,
                        Line::from(vec![
                            Span::styled("◆ ", Style::default().fg(Color::Red).bold()),
                            Span::styled(marker.name.clone(), Style::default().fg(Color::White)),
                        ]),
                    );
                }
            });

        frame.render_widget(canvas, area);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::map::Marker;

    use super::*;

    fn view_at(lat: f64, lon: f64) -> MapView {
        MapView {
            center: (lat, lon),
            center_label: None,
            markers: vec![Marker {
                name: "A".to_string(),
                lat,
                lon,
            }],
        }
    }

    #[test]
    fn starts_unmounted_and_mounts_once_per_generation() {
        let mut surface = CanvasSurface::new();
        assert!(!surface.is_mounted());

        surface.mount(0);
        assert!(surface.is_mounted());

        surface.pan(1.0, 0.0);
        let panned = surface.offset;
        surface.mount(0);
        assert_eq!(surface.offset, panned);
    }

    #[test]
    fn new_generation_discards_widget_state() {
        let mut surface = CanvasSurface::new();
        surface.mount(0);
        surface.sync(&view_at(41.0, 29.0), 3);
        surface.pan(2.0, -1.0);
        surface.zoom_in();

        surface.mount(1);

        assert!(surface.is_mounted());
        assert_eq!(surface.offset, (0.0, 0.0));
        assert_eq!(surface.span, DEFAULT_SPAN);
        assert_eq!(surface.seen_epoch, 0);
    }

    #[test]
    fn recenter_is_edge_triggered_on_epoch_change() {
        let mut surface = CanvasSurface::new();
        surface.mount(0);
        surface.sync(&view_at(41.0, 29.0), 0);
        surface.pan(1.0, 1.0);
        surface.zoom_out();
        assert_ne!(surface.offset, (0.0, 0.0));

        // Same epoch on redraw: pan and zoom survive.
        surface.sync(&view_at(41.0, 29.0), 0);
        assert_ne!(surface.offset, (0.0, 0.0));
        assert_ne!(surface.span, DEFAULT_SPAN);

        // New epoch: recentered.
        surface.sync(&view_at(40.0, 28.0), 1);
        assert_eq!(surface.offset, (0.0, 0.0));
        assert_eq!(surface.span, DEFAULT_SPAN);
    }

    #[test]
    fn renders_into_a_test_terminal_without_panicking() {
        let backend = TestBackend::new(50, 16);
        let mut terminal = Terminal::new(backend).expect("terminal");
        let mut surface = CanvasSurface::new();

        // Unmounted draws the placeholder, mounted draws the canvas.
        for generation in [None, Some(0)] {
            if let Some(generation) = generation {
                surface.mount(generation);
                surface.sync(&view_at(41.0082, 28.9784), 1);
            }
            terminal
                .draw(|frame| {
                    let area = frame.area();
                    surface.render(frame, area, true, " Map ");
                })
                .expect("draw");
        }
    }
}

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::{AgentReply, BackendClient, BackendError, ModelOption};
use crate::config::Config;
use crate::locale::Language;
use crate::session::{SearchTicket, Session, SessionStatus};
use crate::surface::{CanvasSurface, MapSurface};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Chat,
    Map,
    Places,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Runtime shell around the session: spawns the network calls the session
/// asks for, feeds completions back, and keeps the purely visual state
/// (focus, cursor, scroll, popups) the session does not care about.
pub struct App {
    pub should_quit: bool,
    pub session: Session,
    pub surface: Box<dyn MapSurface>,
    backend: BackendClient,
    events: UnboundedSender<AppEvent>,

    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub prompt_input: String,
    pub prompt_cursor: usize, // cursor position in prompt_input, in chars

    pub chat_scroll: u16,
    pub chat_height: u16, // inner chat size, stored during render
    pub chat_width: u16,

    pub show_model_picker: bool,
    pub model_picker_state: ListState,
    pub places_state: ListState,

    // Animation state: 0-2 for the thinking ellipsis
    pub animation_frame: u8,

    // Set once the terminal is confirmed live; the map surface stays an
    // unmounted placeholder until then.
    interactive: bool,

    // Pane areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub map_area: Option<Rect>,
    pub places_area: Option<Rect>,
}

impl App {
    pub fn new(config: &Config, events: UnboundedSender<AppEvent>) -> Self {
        let language = config
            .language
            .as_deref()
            .and_then(Language::from_str)
            .unwrap_or_default();

        Self {
            should_quit: false,
            session: Session::new(language, &config.fallback_model()),
            surface: Box::new(CanvasSurface::new()),
            backend: BackendClient::new(&config.base_url()),
            events,

            input_mode: InputMode::Editing,
            focus: FocusPane::Input,
            prompt_input: String::new(),
            prompt_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            show_model_picker: false,
            model_picker_state: ListState::default(),
            places_state: ListState::default(),

            animation_frame: 0,

            interactive: false,

            chat_area: None,
            map_area: None,
            places_area: None,
        }
    }

    /// The hosting runtime confirmed an interactive terminal.
    pub fn mark_interactive(&mut self) {
        self.interactive = true;
    }

    /// Mount the map surface once the terminal is live. Idempotent within a
    /// session generation; a restart bumps the generation and remounts.
    pub fn ensure_surface_mounted(&mut self) {
        if self.interactive {
            self.surface.mount(self.session.generation());
        }
    }

    // Network plumbing: session commands hand out tickets, tasks resolve them
    // through the event channel.

    pub fn request_models(&mut self) {
        let ticket = self.session.request_models();
        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.list_models().await;
            let _ = events.send(AppEvent::ModelsLoaded(ticket.seq, result));
        });
    }

    fn spawn_search(&self, ticket: SearchTicket) {
        let backend = self.backend.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.search(&ticket.prompt, &ticket.model).await;
            let _ = events.send(AppEvent::SearchDone(ticket.seq, result));
        });
    }

    /// Submit the current input. Gated on the thinking status here, at the
    /// affordance level; the session itself never blocks a submission.
    pub fn submit_prompt(&mut self) {
        if self.session.status() == SessionStatus::Thinking {
            return;
        }
        if let Some(ticket) = self.session.submit(&self.prompt_input) {
            self.prompt_input.clear();
            self.prompt_cursor = 0;
            self.scroll_chat_to_bottom();
            self.spawn_search(ticket);
        }
    }

    pub fn on_models_loaded(&mut self, seq: u64, result: Result<Vec<ModelOption>, BackendError>) {
        self.session.apply_models(seq, result);
        let count = self.session.models().len();
        log::info!("model registry: {count} models");
        if self.show_model_picker {
            self.align_picker_selection();
        }
    }

    pub fn on_search_done(&mut self, seq: u64, result: Result<AgentReply, BackendError>) {
        self.session.apply_search(seq, result);
        self.places_state
            .select(if self.session.places().is_empty() { None } else { Some(0) });
        self.scroll_chat_to_bottom();
    }

    /// Restart the session: fresh seeded transcript, cleared map model, and
    /// a new surface generation so no widget state leaks across restarts.
    pub fn reset_session(&mut self) {
        self.session.reset();
        self.prompt_input.clear();
        self.prompt_cursor = 0;
        self.chat_scroll = 0;
        self.places_state.select(None);
        self.focus = FocusPane::Input;
        self.input_mode = InputMode::Editing;
    }

    pub fn toggle_language(&mut self) {
        let language = self.session.language().toggle();
        self.session.set_language(language);
        let _ = Config::save_language(language.as_str());
    }

    // Model picker

    pub fn open_model_picker(&mut self) {
        if self.session.models().is_empty() && !self.session.models_loading() {
            // Registry never loaded (or failed): retry before showing it.
            self.request_models();
        }
        self.align_picker_selection();
        self.show_model_picker = true;
    }

    fn align_picker_selection(&mut self) {
        if self.session.models().is_empty() {
            self.model_picker_state.select(None);
            return;
        }
        let current = self
            .session
            .models()
            .iter()
            .position(|m| m.id == self.session.model_id())
            .unwrap_or(0);
        self.model_picker_state.select(Some(current));
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = self.session.models().len();
        if len > 0 {
            let i = self.model_picker_state.selected().unwrap_or(0);
            self.model_picker_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(model) = self.session.models().get(i) {
                let id = model.id.clone();
                self.session.select_model(&id);
                self.show_model_picker = false;
                let _ = Config::save_default_model(&id);
            }
        }
    }

    // Places list

    pub fn places_nav_down(&mut self) {
        let len = self.session.places().len();
        if len > 0 {
            let i = self.places_state.selected().unwrap_or(0);
            self.places_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn places_nav_up(&mut self) {
        let i = self.places_state.selected().unwrap_or(0);
        self.places_state.select(Some(i.saturating_sub(1)));
    }

    // Chat scrolling

    pub fn chat_scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn chat_scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Pin the chat to its end so the newest message (or the thinking
    /// indicator) is visible. Mirrors the wrap math of the render pass.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.session.transcript() {
            total_lines += 1; // role line
            for line in msg.text.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // blank line after message
        }

        if self.session.status() == SessionStatus::Thinking {
            total_lines += 2; // role line + thinking indicator
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.status() == SessionStatus::Thinking {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

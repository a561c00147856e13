use crate::backend::{AgentReply, BackendError, MapCenter, ModelOption, Place};
use crate::locale::{seed_transcript, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Thinking,
    Error,
}

/// Ticket describing the agent call the runtime should issue. The sequence
/// number comes back with the result so stale replies can be discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    pub seq: u64,
    pub prompt: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelsTicket {
    pub seq: u64,
}

/// All state for one assistant session: transcript, submission lifecycle,
/// model registry and the map model. Commands mutate state and return tickets
/// for the network calls they need; no I/O happens here.
pub struct Session {
    language: Language,
    transcript: Vec<ChatMessage>,
    status: SessionStatus,
    error: Option<String>,
    has_interacted: bool,

    models: Vec<ModelOption>,
    models_error: Option<String>,
    models_loading: bool,
    selected_model: Option<String>,
    fallback_model: String,

    center: Option<MapCenter>,
    places: Vec<Place>,
    center_epoch: u64,
    generation: u64,

    search_seq: u64,
    models_seq: u64,
}

impl Session {
    pub fn new(language: Language, fallback_model: &str) -> Self {
        Self {
            language,
            transcript: seed_transcript(language),
            status: SessionStatus::Idle,
            error: None,
            has_interacted: false,

            models: Vec::new(),
            models_error: None,
            models_loading: false,
            selected_model: None,
            fallback_model: fallback_model.to_string(),

            center: None,
            places: Vec::new(),
            center_epoch: 0,
            generation: 0,

            search_seq: 0,
            models_seq: 0,
        }
    }

    // Read-only snapshot for the render layer.

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_interacted(&self) -> bool {
        self.has_interacted
    }

    pub fn models(&self) -> &[ModelOption] {
        &self.models
    }

    pub fn models_error(&self) -> Option<&str> {
        self.models_error.as_deref()
    }

    pub fn models_loading(&self) -> bool {
        self.models_loading
    }

    /// Model id sent with agent calls: the picked one, else the configured
    /// fallback. Works even when the registry never loaded.
    pub fn model_id(&self) -> &str {
        self.selected_model.as_deref().unwrap_or(&self.fallback_model)
    }

    /// Display label for the current model. A selection whose id is no longer
    /// in the registry simply shows the raw id.
    pub fn model_label(&self) -> &str {
        let id = self.model_id();
        self.models
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(id)
    }

    pub fn center(&self) -> Option<&MapCenter> {
        self.center.as_ref()
    }

    /// Latest place list, wholesale from the last reply that carried one.
    /// Retains places without coordinates; only rendering filters them.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Bumps whenever a reply installs a new valid center. The map surface
    /// recenters on the edge, not on every redraw.
    pub fn center_epoch(&self) -> u64 {
        self.center_epoch
    }

    /// Remount token for the map surface; changes only on session restart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // Commands.

    /// Submit a prompt. Whitespace-only input is a silent no-op. Otherwise
    /// the user message is appended (dropping the scripted seed on the first
    /// real submission), status moves to thinking and a ticket is returned.
    pub fn submit(&mut self, prompt: &str) -> Option<SearchTicket> {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return None;
        }

        if !self.has_interacted {
            self.transcript.clear();
            self.has_interacted = true;
        }

        self.transcript.push(ChatMessage {
            role: ChatRole::User,
            text: trimmed.to_string(),
        });
        self.error = None;
        self.status = SessionStatus::Thinking;
        self.search_seq += 1;

        Some(SearchTicket {
            seq: self.search_seq,
            prompt: trimmed.to_string(),
            model: self.model_id().to_string(),
        })
    }

    /// Apply an agent result. Results whose sequence is not the latest issued
    /// are dropped whole, so a slow reply can never clobber a newer one and
    /// nothing applies after a restart.
    pub fn apply_search(&mut self, seq: u64, result: Result<AgentReply, BackendError>) {
        if seq != self.search_seq {
            log::debug!("dropping stale agent reply (seq {seq}, latest {})", self.search_seq);
            return;
        }

        match result {
            Ok(reply) => {
                let text = reply
                    .response
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| self.language.copy().no_response.to_string());
                self.transcript.push(ChatMessage {
                    role: ChatRole::Agent,
                    text,
                });

                // Center and places are two independent optional updates, but
                // always from this same reply.
                if let Some(center) = reply.center {
                    if center.coordinates().is_some() {
                        self.center = Some(center);
                        self.center_epoch += 1;
                    }
                }
                if let Some(places) = reply.places {
                    self.places = places;
                }

                self.status = SessionStatus::Idle;
                self.error = None;
            }
            Err(err) => {
                log::warn!("agent call failed: {err}");
                self.status = SessionStatus::Error;
                self.error = Some(err.message());
            }
        }
    }

    pub fn request_models(&mut self) -> ModelsTicket {
        self.models_seq += 1;
        self.models_loading = true;
        ModelsTicket {
            seq: self.models_seq,
        }
    }

    /// Apply a registry result. On failure the list is cleared rather than
    /// left half-populated; the fallback model id keeps working.
    pub fn apply_models(&mut self, seq: u64, result: Result<Vec<ModelOption>, BackendError>) {
        if seq != self.models_seq {
            log::debug!("dropping stale model list (seq {seq}, latest {})", self.models_seq);
            return;
        }
        self.models_loading = false;

        match result {
            Ok(models) => {
                self.models = models;
                self.models_error = None;
                if self.selected_model.is_none() {
                    if let Some(first) = self.models.first() {
                        self.selected_model = Some(first.id.clone());
                    }
                }
            }
            Err(err) => {
                log::warn!("model registry fetch failed: {err}");
                self.models.clear();
                self.models_error = Some(err.message());
            }
        }
    }

    pub fn select_model(&mut self, id: &str) {
        self.selected_model = Some(id.to_string());
    }

    /// Switch the UI language. Until the user has interacted this replaces
    /// the scripted seed wholesale; afterwards the transcript is untouched.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if !self.has_interacted {
            self.transcript = seed_transcript(language);
        }
    }

    /// Start a fresh session: new seed, idle status, empty map model. The
    /// registry and model choice survive. In-flight agent replies are
    /// invalidated via the sequence bump, and the bumped generation forces
    /// the map surface to remount with fresh widget state.
    pub fn reset(&mut self) {
        self.transcript = seed_transcript(self.language);
        self.has_interacted = false;
        self.status = SessionStatus::Idle;
        self.error = None;
        self.center = None;
        self.places.clear();
        self.center_epoch = 0;
        self.generation += 1;
        self.search_seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    use super::*;

    fn session() -> Session {
        Session::new(Language::English, "openai/gpt-4o-mini")
    }

    fn reply(text: &str) -> AgentReply {
        AgentReply {
            response: Some(text.to_string()),
            ..AgentReply::default()
        }
    }

    fn model(id: &str) -> ModelOption {
        ModelOption {
            id: id.to_string(),
            name: format!("name of {id}"),
        }
    }

    #[test]
    fn starts_idle_with_scripted_seed() {
        let s = session();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.transcript().len(), 3);
        assert!(!s.has_interacted());
    }

    #[test]
    fn whitespace_submit_is_a_noop() {
        let mut s = session();
        assert_eq!(s.submit("   \n\t "), None);
        assert_eq!(s.transcript().len(), 3);
        assert_eq!(s.status(), SessionStatus::Idle);
    }

    #[test]
    fn first_submit_replaces_seed_and_appends_trimmed_prompt() {
        let mut s = session();
        let ticket = s.submit("  cafes in Moda  ").expect("ticket");

        assert_eq!(ticket.prompt, "cafes in Moda");
        assert_eq!(ticket.model, "openai/gpt-4o-mini");
        assert_eq!(s.status(), SessionStatus::Thinking);
        assert_eq!(
            s.transcript(),
            &[ChatMessage {
                role: ChatRole::User,
                text: "cafes in Moda".to_string(),
            }]
        );
    }

    #[test]
    fn successful_reply_appends_exactly_one_agent_message() {
        let mut s = session();
        let ticket = s.submit("cafes").expect("ticket");
        s.apply_search(ticket.seq, Ok(reply("Two cafes found.")));

        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.transcript().len(), 2);
        assert_eq!(s.transcript()[1].role, ChatRole::Agent);
        assert_eq!(s.transcript()[1].text, "Two cafes found.");
    }

    #[test]
    fn missing_response_text_falls_back_to_placeholder() {
        let mut s = session();
        let ticket = s.submit("cafes").expect("ticket");
        s.apply_search(ticket.seq, Ok(AgentReply::default()));

        assert_eq!(s.transcript()[1].text, "No response.");
    }

    #[test]
    fn reply_with_center_and_places_replaces_map_model_wholesale() {
        let mut s = session();
        let ticket = s.submit("first").expect("ticket");
        s.apply_search(
            ticket.seq,
            Ok(AgentReply {
                response: Some("ok".to_string()),
                center: Some(MapCenter {
                    lat: Some(41.05),
                    lon: Some(29.00),
                    label: Some("Kadıköy".to_string()),
                }),
                places: Some(vec![Place {
                    name: "A".to_string(),
                    lat: Some(41.05),
                    lon: Some(29.00),
                    address: None,
                }]),
            }),
        );
        assert_eq!(s.center_epoch(), 1);
        assert_eq!(s.places().len(), 1);

        // Next reply carries an empty list: prior markers are cleared, never
        // merged; an invalid center leaves the old one and its epoch alone.
        let ticket = s.submit("second").expect("ticket");
        s.apply_search(
            ticket.seq,
            Ok(AgentReply {
                response: Some("nothing".to_string()),
                center: Some(MapCenter {
                    lat: None,
                    lon: Some(29.0),
                    label: None,
                }),
                places: Some(Vec::new()),
            }),
        );

        assert_eq!(s.places(), &[]);
        assert_eq!(s.center_epoch(), 1);
        assert_eq!(s.center().and_then(MapCenter::coordinates), Some((41.05, 29.00)));
    }

    #[test]
    fn reply_without_map_fields_keeps_previous_map_model() {
        let mut s = session();
        let ticket = s.submit("first").expect("ticket");
        s.apply_search(
            ticket.seq,
            Ok(AgentReply {
                response: Some("ok".to_string()),
                center: Some(MapCenter {
                    lat: Some(41.0),
                    lon: Some(29.0),
                    label: None,
                }),
                places: Some(vec![Place {
                    name: "A".to_string(),
                    lat: Some(41.0),
                    lon: Some(29.0),
                    address: None,
                }]),
            }),
        );

        let ticket = s.submit("second").expect("ticket");
        s.apply_search(ticket.seq, Ok(reply("just text")));

        assert_eq!(s.places().len(), 1);
        assert!(s.center().is_some());
    }

    #[test]
    fn failure_sets_error_status_and_leaves_transcript_and_map_alone() {
        let mut s = session();
        let ticket = s.submit("cafes").expect("ticket");
        s.apply_search(
            ticket.seq,
            Err(BackendError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: Some("agent exploded".to_string()),
            }),
        );

        assert_eq!(s.status(), SessionStatus::Error);
        assert_eq!(s.error(), Some("agent exploded"));
        assert_eq!(s.transcript().len(), 1);
        assert!(s.places().is_empty());

        // The next submission clears the error and goes back to thinking.
        let ticket = s.submit("retry").expect("ticket");
        assert_eq!(s.status(), SessionStatus::Thinking);
        assert_eq!(s.error(), None);
        s.apply_search(ticket.seq, Ok(reply("fine now")));
        assert_eq!(s.status(), SessionStatus::Idle);
    }

    #[test]
    fn stale_reply_is_dropped_entirely() {
        let mut s = session();
        let first = s.submit("one").expect("ticket");
        let second = s.submit("two").expect("ticket");

        // Second call resolves first; then the first call's reply trickles in.
        s.apply_search(
            second.seq,
            Ok(AgentReply {
                response: Some("answer two".to_string()),
                center: Some(MapCenter {
                    lat: Some(2.0),
                    lon: Some(2.0),
                    label: None,
                }),
                places: Some(vec![Place {
                    name: "two".to_string(),
                    lat: Some(2.0),
                    lon: Some(2.0),
                    address: None,
                }]),
            }),
        );
        s.apply_search(
            first.seq,
            Ok(AgentReply {
                response: Some("answer one".to_string()),
                center: Some(MapCenter {
                    lat: Some(1.0),
                    lon: Some(1.0),
                    label: None,
                }),
                places: Some(vec![Place {
                    name: "one".to_string(),
                    lat: Some(1.0),
                    lon: Some(1.0),
                    address: None,
                }]),
            }),
        );

        let texts: Vec<&str> = s.transcript().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "answer two"]);
        assert_eq!(s.places().len(), 1);
        assert_eq!(s.places()[0].name, "two");
        assert_eq!(s.center().and_then(MapCenter::coordinates), Some((2.0, 2.0)));
    }

    #[test]
    fn transcript_only_grows() {
        let mut s = session();
        let mut last_len = 0;
        for i in 0..5 {
            let ticket = s.submit(&format!("q{i}")).expect("ticket");
            assert!(s.transcript().len() >= last_len);
            last_len = s.transcript().len();
            s.apply_search(ticket.seq, Ok(reply(&format!("a{i}"))));
            assert!(s.transcript().len() > last_len);
            last_len = s.transcript().len();
        }
        assert_eq!(last_len, 10);
    }

    #[test]
    fn registry_success_defaults_selection_to_first_entry() {
        let mut s = session();
        let ticket = s.request_models();
        assert!(s.models_loading());

        s.apply_models(ticket.seq, Ok(vec![model("openai/gpt-4o"), model("google/gemini-2.0-flash")]));

        assert!(!s.models_loading());
        assert_eq!(s.model_id(), "openai/gpt-4o");
        assert_eq!(s.model_label(), "name of openai/gpt-4o");
    }

    #[test]
    fn registry_failure_clears_list_but_keeps_fallback_model_usable() {
        let mut s = session();
        let ticket = s.request_models();
        s.apply_models(
            ticket.seq,
            Err(BackendError::Http {
                status: StatusCode::BAD_GATEWAY,
                detail: None,
            }),
        );

        assert_eq!(s.models(), &[]);
        assert!(s.models_error().is_some());
        assert_eq!(s.model_id(), "openai/gpt-4o-mini");

        let ticket = s.submit("still works").expect("ticket");
        assert_eq!(ticket.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn stale_registry_result_is_dropped() {
        let mut s = session();
        let first = s.request_models();
        let second = s.request_models();

        s.apply_models(second.seq, Ok(vec![model("b")]));
        s.apply_models(first.seq, Ok(vec![model("a")]));

        assert_eq!(s.models().len(), 1);
        assert_eq!(s.models()[0].id, "b");
    }

    #[test]
    fn dangling_selection_shows_raw_id() {
        let mut s = session();
        let ticket = s.request_models();
        s.apply_models(ticket.seq, Ok(vec![model("a")]));
        s.select_model("gone/model");

        assert_eq!(s.model_id(), "gone/model");
        assert_eq!(s.model_label(), "gone/model");
    }

    #[test]
    fn language_toggle_reseeds_only_before_first_interaction() {
        let mut s = session();
        s.set_language(Language::Turkish);
        assert_eq!(s.transcript()[0].text, Language::Turkish.copy().seed_greeting);

        let ticket = s.submit("soru").expect("ticket");
        s.apply_search(ticket.seq, Ok(reply("cevap")));
        let before: Vec<ChatMessage> = s.transcript().to_vec();

        s.set_language(Language::English);
        assert_eq!(s.transcript(), &before[..]);
    }

    #[test]
    fn reset_reseeds_bumps_generation_and_invalidates_in_flight_reply() {
        let mut s = session();
        let ticket = s.submit("query").expect("ticket");
        s.reset();

        assert_eq!(s.generation(), 1);
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.transcript().len(), 3);
        assert!(!s.has_interacted());

        // The reply of the pre-reset call lands after the restart: dropped.
        s.apply_search(ticket.seq, Ok(reply("late")));
        assert_eq!(s.transcript().len(), 3);
        assert!(s.places().is_empty());
    }
}

//! One configurator session: widgets, configuration, probabilities and
//! generated results, owned together and driven against a [`Backend`].
//!
//! ```text
//! widget ──listener──► EventBus ──► reduce() ──► Configuration
//!                                       │
//!                                       ▼
//!                         Command::Predict / BuildFromConfig
//!                                       │
//!                    Backend ◄──────────┘──────► recolor widgets
//! ```
//!
//! Everything runs on one task; listeners only enqueue events, and the
//! session drains them in [`Session::process_events`].

use std::path::Path;

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::client::Backend;
use crate::colors::probability_color;
use crate::config::{ConfigValue, Configuration};
use crate::events::{Command, EventBus, UiEvent};
use crate::generation::{
    progress_message, validate_amount, GenerationError, GenerationRequest, GenerationRoute,
    DECISION_TREE_LABEL, DECISION_TREE_LINK,
};
use crate::logging::{config_hash, debug, info, obj, v_num, v_str, warn, Domain};
use crate::picker::FilePicker;
use crate::probas::Probabilities;
use crate::reducer::{reduce, BuildPolicy, ReducerContext};
use crate::results::ResultsTable;
use crate::settings::Settings;
use crate::source::ConfigSource;
use crate::widgets::{ChoiceKind, ChoiceOption, NumberOption, ANY};

/// Source the PDF viewer points at once a build succeeded.
pub const PDF_VIEWER_SOURCE: &str = "/build_pdf";

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Input rejected before any request was made.
    Rejected(GenerationError),
    /// The request or its response failed; the table is left as is.
    Failed,
    Completed { rows: usize },
}

/// A prediction in flight. Responses are applied only if no newer
/// request has been applied in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTicket {
    pub seq: u64,
    pub config: Configuration,
}

pub struct Session<B: Backend> {
    backend: B,
    settings: Settings,
    bus: EventBus,

    config: Configuration,
    probas: Probabilities,
    has_data: bool,
    predictions_issued: u64,
    predictions_applied: u64,

    booleans: Vec<ChoiceOption>,
    enums: Vec<ChoiceOption>,
    groups: Vec<ChoiceOption>,
    numbers: Vec<NumberOption>,
    variable_count: usize,

    filter_generation: bool,
    build_policy: BuildPolicy,
    status: String,
    status_link: Option<String>,
    results: ResultsTable,
    pdf_source: Option<String>,
    last_pdf: Option<Vec<u8>>,
    files: FilePicker,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self {
            backend,
            settings,
            bus: EventBus::new(),
            config: Configuration::new(),
            probas: Probabilities::default(),
            has_data: false,
            predictions_issued: 0,
            predictions_applied: 0,
            booleans: Vec::new(),
            enums: Vec::new(),
            groups: Vec::new(),
            numbers: Vec::new(),
            variable_count: 0,
            filter_generation: false,
            build_policy: BuildPolicy::Manual,
            status: String::new(),
            status_link: None,
            results: ResultsTable::new(),
            pdf_source: None,
            last_pdf: None,
            files: FilePicker::new(),
        }
    }

    /// Drops every widget and all session state, as on page navigation.
    pub fn reset(&mut self) {
        self.bus.clear();
        self.config.clear();
        self.probas = Probabilities::default();
        self.has_data = false;
        self.predictions_issued = 0;
        self.predictions_applied = 0;
        self.booleans.clear();
        self.enums.clear();
        self.groups.clear();
        self.numbers.clear();
        self.variable_count = 0;
        self.filter_generation = false;
        self.status.clear();
        self.status_link = None;
        self.results.clear();
        self.pdf_source = None;
        self.last_pdf = None;
        self.files = FilePicker::new();
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn probas(&self) -> &Probabilities {
        &self.probas
    }

    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn booleans(&self) -> &[ChoiceOption] {
        &self.booleans
    }

    pub fn enums(&self) -> &[ChoiceOption] {
        &self.enums
    }

    pub fn groups(&self) -> &[ChoiceOption] {
        &self.groups
    }

    pub fn numbers(&self) -> &[NumberOption] {
        &self.numbers
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn boolean(&self, name: &str) -> Option<&ChoiceOption> {
        self.booleans.iter().find(|w| w.name() == Some(name))
    }

    pub fn enumeration(&self, name: &str) -> Option<&ChoiceOption> {
        self.enums.iter().find(|w| w.name() == Some(name))
    }

    pub fn group(&self, index: usize) -> Option<&ChoiceOption> {
        self.groups.get(index)
    }

    /// Index of the group declaring `member`.
    pub fn group_of(&self, member: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.option(member).is_some() && member != ANY)
    }

    pub fn number(&self, name: &str) -> Option<&NumberOption> {
        self.numbers.iter().find(|w| w.name() == name)
    }

    /// Direct widget access; call [`Session::process_events`] afterwards.
    pub fn boolean_mut(&mut self, name: &str) -> Option<&mut ChoiceOption> {
        self.booleans.iter_mut().find(|w| w.name() == Some(name))
    }

    pub fn enumeration_mut(&mut self, name: &str) -> Option<&mut ChoiceOption> {
        self.enums.iter_mut().find(|w| w.name() == Some(name))
    }

    pub fn group_mut(&mut self, index: usize) -> Option<&mut ChoiceOption> {
        self.groups.get_mut(index)
    }

    pub fn number_mut(&mut self, name: &str) -> Option<&mut NumberOption> {
        self.numbers.iter_mut().find(|w| w.name() == name)
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn status_link(&self) -> Option<&str> {
        self.status_link.as_deref()
    }

    pub fn results(&self) -> &ResultsTable {
        &self.results
    }

    pub fn pdf_source(&self) -> Option<&str> {
        self.pdf_source.as_deref()
    }

    pub fn last_pdf(&self) -> Option<&[u8]> {
        self.last_pdf.as_deref()
    }

    pub fn files(&self) -> &FilePicker {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut FilePicker {
        &mut self.files
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_generation
    }

    pub fn build_policy(&self) -> BuildPolicy {
        self.build_policy
    }

    pub fn set_build_policy(&mut self, policy: BuildPolicy) {
        self.build_policy = policy;
    }

    // ---------------------------------------------------------------------
    // Widget construction
    // ---------------------------------------------------------------------

    /// Fetches the variable declarations and builds the widgets.
    pub async fn load_config_src(&mut self) -> Result<()> {
        let source = self.backend.fetch_config_src().await?;
        self.load_source(&source);
        Ok(())
    }

    /// Builds one widget per declared variable, in declaration order:
    /// booleans, enums, choice groups, numbers.
    pub fn load_source(&mut self, source: &ConfigSource) {
        for name in &source.booleans {
            let mut widget = ChoiceOption::new_boolean(name);
            self.wire_selection(&mut widget, name);
            self.booleans.push(widget);
        }

        for (name, values) in &source.enums {
            let mut widget = ChoiceOption::new_enum(name);
            self.wire_selection(&mut widget, name);
            for value in values {
                widget.add_option(value, Some(ConfigValue::Text(value.clone())));
            }
            self.enums.push(widget);
        }

        for members in &source.choices {
            let group = self.groups.len();
            let mut widget = ChoiceOption::new_group();
            let bus = self.bus.clone();
            widget.add_selection_listener(Box::new(
                move |new: Option<&ConfigValue>, old: Option<&ConfigValue>| {
                    bus.push(UiEvent::GroupSelected {
                        group,
                        new: new.map(ToString::to_string),
                        old: old.map(ToString::to_string),
                    });
                },
            ));
            for member in members {
                widget.add_option(member, Some(ConfigValue::Text(member.clone())));
            }
            self.groups.push(widget);
        }

        for (name, domain) in &source.numbers {
            let mut widget = NumberOption::new(name, domain.min, domain.max, domain.decimals);
            let bus = self.bus.clone();
            let var = name.clone();
            widget.add_change_listener(Box::new(move |new, old| {
                bus.push(UiEvent::NumberChanged { name: var.clone(), new, old });
            }));
            let bus = self.bus.clone();
            let var = name.clone();
            widget.add_toggle_listener(Box::new(move |enabled, value| {
                bus.push(UiEvent::NumberToggled { name: var.clone(), enabled, value });
            }));
            self.numbers.push(widget);
        }

        self.variable_count += source.variable_count();
        info(
            Domain::Source,
            "widgets_built",
            obj(&[
                ("booleans", v_num(source.booleans.len() as f64)),
                ("enums", v_num(source.enums.len() as f64)),
                ("choices", v_num(source.choices.len() as f64)),
                ("numbers", v_num(source.numbers.len() as f64)),
                ("variables", v_num(self.variable_count as f64)),
            ]),
        );
    }

    fn wire_selection(&self, widget: &mut ChoiceOption, name: &str) {
        let bus = self.bus.clone();
        let var = name.to_string();
        widget.add_selection_listener(Box::new(
            move |new: Option<&ConfigValue>, old: Option<&ConfigValue>| {
                bus.push(UiEvent::Selected {
                    name: var.clone(),
                    new: new.cloned(),
                    old: old.cloned(),
                });
            },
        ));
    }

    // ---------------------------------------------------------------------
    // Event processing
    // ---------------------------------------------------------------------

    /// Drains the event bus, applies every event to the configuration and
    /// runs the resulting commands. Commands of one drain are coalesced:
    /// at most one prediction and one build, both on the final
    /// configuration. Returns the number of events processed.
    pub async fn process_events(&mut self) -> usize {
        let mut processed = 0;
        let mut predict = false;
        let mut build = false;

        while let Some(event) = self.bus.pop() {
            debug(Domain::Widget, "widget_changed", widget_fields(&event));
            let ctx = ReducerContext {
                probas: &self.probas,
                build_policy: self.build_policy,
                variable_count: self.variable_count,
            };
            for command in reduce(&mut self.config, &event, &ctx) {
                match command {
                    Command::Predict => predict = true,
                    Command::BuildFromConfig => build = true,
                }
            }
            processed += 1;
        }

        if predict {
            self.refresh_probas().await;
        }
        if build {
            self.build_from_config().await;
        }
        processed
    }

    /// Selects `label` on the boolean or enum widget `name`.
    pub async fn select(&mut self, name: &str, label: &str) -> bool {
        let changed = match self.boolean_mut(name) {
            Some(w) => w.select_option(label),
            None => match self.enumeration_mut(name) {
                Some(w) => w.select_option(label),
                None => return false,
            },
        };
        self.process_events().await;
        changed
    }

    pub async fn select_in_group(&mut self, group: usize, label: &str) -> bool {
        let changed = match self.groups.get_mut(group) {
            Some(w) => w.select_option(label),
            None => return false,
        };
        self.process_events().await;
        changed
    }

    pub async fn set_number_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let changed = match self.number_mut(name) {
            Some(w) => w.set_enabled(enabled),
            None => return false,
        };
        self.process_events().await;
        changed
    }

    pub async fn slide_number(&mut self, name: &str, value: f64) -> bool {
        let changed = match self.number_mut(name) {
            Some(w) => w.set_value(value),
            None => return false,
        };
        self.process_events().await;
        changed
    }

    /// Applies a textual constraint `name = raw` to whichever widget
    /// declares `name`:
    /// - booleans take `true`/`false`/`any`
    /// - enums take one of their values or `any`
    /// - a choice-group member set to `true` becomes the group's
    ///   selection; `false`/`any` clears the group
    /// - numbers take a value (enabling the widget) or `any`/`off`
    ///
    /// Returns `false` if nothing declares `name` or `raw` does not fit.
    pub async fn constrain(&mut self, name: &str, raw: &str) -> bool {
        let raw = raw.trim();
        let wildcard = raw.eq_ignore_ascii_case("any") || raw.eq_ignore_ascii_case("off");

        if self.boolean(name).is_some() {
            let label = match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => "True",
                "false" | "0" | "no" => "False",
                "any" => ANY,
                _ => return false,
            };
            self.select(name, label).await;
            return true;
        }

        if let Some(widget) = self.enumeration(name) {
            let label = if wildcard { ANY } else { raw };
            if widget.option(label).is_none() {
                return false;
            }
            self.select(name, label).await;
            return true;
        }

        if let Some(group) = self.group_of(name) {
            let label = match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => name,
                "false" | "0" | "no" | "any" => ANY,
                _ => return false,
            };
            // clearing only applies if this member is the one selected
            let selected = self.groups[group].selected().label.clone();
            if label == ANY && selected != name {
                return true;
            }
            self.select_in_group(group, label).await;
            return true;
        }

        if self.number(name).is_some() {
            if wildcard {
                self.set_number_enabled(name, false).await;
                return true;
            }
            let Ok(value) = raw.parse::<f64>() else {
                return false;
            };
            self.slide_number(name, value).await;
            self.set_number_enabled(name, true).await;
            return true;
        }

        false
    }

    // ---------------------------------------------------------------------
    // Probability feedback
    // ---------------------------------------------------------------------

    /// Starts a prediction for the current configuration. `None` until a
    /// first generation produced data for the server to learn from.
    pub fn begin_prediction(&mut self) -> Option<PredictionTicket> {
        if !self.has_data {
            return None;
        }
        self.predictions_issued += 1;
        Some(PredictionTicket {
            seq: self.predictions_issued,
            config: self.config.clone(),
        })
    }

    /// Applies a prediction response; stale responses are dropped.
    pub fn complete_prediction(&mut self, seq: u64, probas: Probabilities) -> bool {
        if seq <= self.predictions_applied {
            info(
                Domain::Predict,
                "prediction_discarded",
                obj(&[
                    ("seq", v_num(seq as f64)),
                    ("applied", v_num(self.predictions_applied as f64)),
                ]),
            );
            return false;
        }
        self.predictions_applied = seq;
        self.probas = probas;
        self.recolor();
        true
    }

    /// Requests fresh probabilities and recolors the widgets. Does
    /// nothing before the first generation.
    pub async fn refresh_probas(&mut self) -> bool {
        let Some(ticket) = self.begin_prediction() else {
            return false;
        };
        let hash = config_hash(&ticket.config.to_json().to_string());
        info(
            Domain::Predict,
            "prediction_requested",
            obj(&[("seq", v_num(ticket.seq as f64)), ("config_hash", v_str(&hash))]),
        );
        match self.backend.predict(&ticket.config, self.settings.max_pages).await {
            Ok(probas) => self.complete_prediction(ticket.seq, probas),
            Err(e) => {
                warn(
                    Domain::Predict,
                    "prediction_failed",
                    obj(&[("seq", v_num(ticket.seq as f64)), ("error", v_str(&e.to_string()))]),
                );
                false
            }
        }
    }

    /// Paints every option with the color of its predicted probability.
    /// Options without a probability keep their current color.
    pub fn recolor(&mut self) {
        let probas = &self.probas;
        for widget in self
            .booleans
            .iter_mut()
            .chain(self.enums.iter_mut())
            .chain(self.groups.iter_mut())
        {
            paint_choice(widget, probas);
        }
        for widget in self.numbers.iter_mut() {
            if let Some(p) = probas.number_probability(widget.name(), widget.effective_value()) {
                widget.set_color(Some(probability_color(p)));
            }
        }
    }

    // ---------------------------------------------------------------------
    // Generation and builds
    // ---------------------------------------------------------------------

    /// Flips whether generation is filtered by the configuration; returns
    /// the new button label.
    pub fn toggle_filter(&mut self) -> String {
        self.filter_generation = !self.filter_generation;
        format!(
            "Generate documents using these constraints : {}",
            if self.filter_generation { "enabled" } else { "disabled" }
        )
    }

    /// Switches between building once the configuration is complete and
    /// building after every change; returns the new button label.
    pub fn toggle_auto_generate(&mut self) -> String {
        self.build_policy = match self.build_policy {
            BuildPolicy::Always => BuildPolicy::WhenComplete,
            _ => BuildPolicy::Always,
        };
        format!(
            "Auto generate missing options : {}",
            if self.build_policy == BuildPolicy::Always { "enabled" } else { "disabled" }
        )
    }

    /// Generates `input` documents. In reset mode the table is replaced,
    /// otherwise rows are appended.
    pub async fn generate(&mut self, input: &str, reset: bool) -> GenerationOutcome {
        let amount = match validate_amount(input) {
            Ok(amount) => amount,
            Err(e) => {
                self.status = e.to_string();
                self.status_link = None;
                info(
                    Domain::Generate,
                    "generation_rejected",
                    obj(&[("input", v_str(input)), ("msg", v_str(&self.status))]),
                );
                return GenerationOutcome::Rejected(e);
            }
        };

        self.status = progress_message(amount, reset);
        self.status_link = None;
        if reset {
            self.results.clear();
        }

        let route = self.settings.generation_route;
        let body = match route {
            GenerationRoute::GeneratePdfs if self.filter_generation => Some(self.config.to_json()),
            GenerationRoute::GeneratePdfs => Some(json!({})),
            GenerationRoute::Compile => None,
        };
        let request = GenerationRequest { route, amount, reset, body };
        info(
            Domain::Generate,
            "generation_started",
            obj(&[
                ("path", v_str(&request.path())),
                ("amount", v_num(amount as f64)),
                ("reset", Value::Bool(reset)),
                ("filtered", Value::Bool(self.filter_generation)),
            ]),
        );

        let csv = match self.backend.generate(&request).await {
            Ok(csv) => csv,
            Err(e) => {
                warn(Domain::Generate, "generation_failed", obj(&[("error", v_str(&e.to_string()))]));
                return GenerationOutcome::Failed;
            }
        };
        let rows = match self.results.fill(&csv, reset) {
            Ok(rows) => rows,
            Err(e) => {
                warn(Domain::Generate, "generation_unreadable", obj(&[("error", v_str(&e.to_string()))]));
                return GenerationOutcome::Failed;
            }
        };

        self.has_data = true;
        match route {
            GenerationRoute::GeneratePdfs => {
                self.status = DECISION_TREE_LABEL.to_string();
                self.status_link = Some(DECISION_TREE_LINK.to_string());
            }
            GenerationRoute::Compile => self.status.clear(),
        }
        info(
            Domain::Generate,
            "generation_completed",
            obj(&[("rows", v_num(rows as f64)), ("total", v_num(self.results.len() as f64))]),
        );

        if self.variable_count > 0 {
            self.refresh_probas().await;
        }
        GenerationOutcome::Completed { rows }
    }

    /// Builds the PDF of one generated document.
    pub async fn build_pdf(&mut self, row: usize) -> bool {
        let Some(payload) = self.results.row(row).map(|r| r.build_payload()) else {
            return false;
        };
        self.build(payload).await
    }

    /// Builds a PDF straight from the configuration.
    pub async fn build_from_config(&mut self) -> bool {
        let payload = self.config.to_json_map();
        self.build(payload).await
    }

    async fn build(&mut self, payload: Map<String, Value>) -> bool {
        self.pdf_source = None;
        match self.backend.build_pdf(&payload).await {
            Ok(bytes) => {
                info(
                    Domain::Build,
                    "pdf_built",
                    obj(&[("fields", v_num(payload.len() as f64)), ("bytes", v_num(bytes.len() as f64))]),
                );
                self.pdf_source = Some(PDF_VIEWER_SOURCE.to_string());
                self.last_pdf = Some(bytes);
                true
            }
            Err(e) => {
                warn(Domain::Build, "pdf_failed", obj(&[("error", v_str(&e.to_string()))]));
                false
            }
        }
    }

    /// Writes the last built PDF; `false` if nothing was built yet.
    pub fn save_pdf(&self, path: &Path) -> Result<bool> {
        match &self.last_pdf {
            Some(bytes) => {
                std::fs::write(path, bytes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ---------------------------------------------------------------------
    // File picker
    // ---------------------------------------------------------------------

    pub async fn load_filenames(&mut self) -> Result<usize> {
        let names = self.backend.filenames().await?;
        let count = names.len();
        self.files.load(names);
        Ok(count)
    }
}

fn widget_fields(event: &UiEvent) -> Map<String, Value> {
    let opt = |v: Option<String>| v.map(Value::String).unwrap_or(Value::Null);
    match event {
        UiEvent::Selected { name, new, .. } => obj(&[
            ("kind", v_str(event.kind())),
            ("name", v_str(name)),
            ("value", opt(new.as_ref().map(ToString::to_string))),
        ]),
        UiEvent::GroupSelected { group, new, .. } => obj(&[
            ("kind", v_str(event.kind())),
            ("group", v_num(*group as f64)),
            ("value", opt(new.clone())),
        ]),
        UiEvent::NumberChanged { name, new, .. } => obj(&[
            ("kind", v_str(event.kind())),
            ("name", v_str(name)),
            ("value", v_num(*new)),
        ]),
        UiEvent::NumberToggled { name, enabled, value } => obj(&[
            ("kind", v_str(event.kind())),
            ("name", v_str(name)),
            ("enabled", Value::Bool(*enabled)),
            ("value", v_num(*value)),
        ]),
    }
}

fn paint_choice(widget: &mut ChoiceOption, probas: &Probabilities) {
    let kind = widget.kind();
    let name = widget.name().unwrap_or_default().to_string();
    for entry in widget.entries_mut() {
        let p = probas.option_probability(kind, &name, &entry.label, entry.value.as_ref());
        if let Some(p) = p {
            entry.color = Some(probability_color(p));
        } else if kind == ChoiceKind::Group && entry.value.is_none() {
            entry.color = None;
        }
    }
}

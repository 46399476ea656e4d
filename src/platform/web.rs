//! Browser glue
//!
//! Binds page elements, forwards DOM events into `TrackerApp`, and redraws
//! from its state once per animation frame. Missing elements are skipped.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::anyhow;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, KeyboardEvent, MouseEvent};

use crate::app::TrackerApp;
use crate::settings::Settings;
use crate::timeline::{NODE_COUNT, NodeState};

const NODE_GLOW_ANIMATION: &str = "circleGlow 1.5s infinite, goldPulse 2s infinite";

fn html(document: &Document, id: &str) -> Option<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

fn set_shown(el: &Option<HtmlElement>, shown: bool) {
    if let Some(el) = el {
        let cl = el.class_list();
        if shown {
            let _ = cl.remove_1("hidden");
            let _ = cl.add_1("show");
        } else {
            let _ = cl.remove_1("show");
            let _ = cl.add_1("hidden");
        }
    }
}

fn set_text(el: &Option<HtmlElement>, text: &str) {
    if let Some(el) = el {
        if el.text_content().as_deref() != Some(text) {
            el.set_text_content(Some(text));
        }
    }
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Element handles looked up once at startup
struct Page {
    document: Document,
    token_input: Option<HtmlInputElement>,
    token_valid: Option<HtmlElement>,
    track_btn: Option<HtmlElement>,
    roadmap_section: Option<HtmlElement>,
    status_section: Option<HtmlElement>,
    current_status: Option<HtmlElement>,
    estimated_delivery: Option<HtmlElement>,
    toast: Option<HtmlElement>,
    roadmap_line: Option<HtmlElement>,
    nodes: Vec<Element>,
    particles: HashMap<u64, HtmlElement>,
    shown_toast: Option<u64>,
    shown_progress: Option<u8>,
}

impl Page {
    fn bind(document: &Document) -> Self {
        let nodes = document
            .query_selector_all(".roadmap-node")
            .ok()
            .map(|list| {
                (0..list.length())
                    .filter_map(|i| list.item(i))
                    .filter_map(|n| n.dyn_into::<Element>().ok())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if nodes.len() != NODE_COUNT {
            log::warn!("Expected {} roadmap nodes, found {}", NODE_COUNT, nodes.len());
        }

        Self {
            document: document.clone(),
            token_input: document
                .get_element_by_id("tokenInput")
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok()),
            token_valid: html(document, "tokenValid"),
            track_btn: html(document, "trackBtn"),
            roadmap_section: html(document, "roadmapSection"),
            status_section: html(document, "statusSection"),
            current_status: html(document, "currentStatus"),
            estimated_delivery: html(document, "estimatedDelivery"),
            toast: html(document, "toast"),
            roadmap_line: document
                .query_selector(".roadmap-line")
                .ok()
                .flatten()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok()),
            nodes,
            particles: HashMap::new(),
            shown_toast: None,
            shown_progress: None,
        }
    }

    /// The legacy status timeline is superseded by the roadmap
    fn hide_status_section(&self) {
        set_shown(&self.status_section, false);
    }

    fn render(&mut self, app: &TrackerApp) {
        self.render_token(app);
        set_shown(&self.track_btn, app.is_track_visible());
        set_shown(&self.roadmap_section, app.is_roadmap_visible());
        self.render_roadmap(app);
        self.render_toast(app);
        self.render_particles(app);
    }

    fn render_token(&self, app: &TrackerApp) {
        if let Some(el) = &self.token_valid {
            let style = el.style();
            match app.feedback() {
                Some(feedback) => {
                    set_text(&self.token_valid, &feedback.text);
                    let _ = style.set_property("color", feedback.tone.color());
                    let _ = style.set_property("opacity", "1");
                }
                None => {
                    let _ = style.set_property("opacity", "0");
                }
            }
        }
        if let Some(input) = &self.token_input {
            let style = input.style();
            match app.input_tone().border() {
                Some(border) => {
                    let _ = style.set_property("border", border);
                }
                None => {
                    let _ = style.remove_property("border");
                }
            }
        }
    }

    fn render_roadmap(&mut self, app: &TrackerApp) {
        let state = app.sequencer().state();
        for (node, marker) in self.nodes.iter().zip(state.nodes.iter()) {
            let cl = node.class_list();
            let _ = cl.toggle_with_force("active", marker.state == NodeState::Active);
            let _ = cl.toggle_with_force("completed", marker.state == NodeState::Completed);
            if let Some(circle) = node
                .query_selector(".node-circle")
                .ok()
                .flatten()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                let animation = if marker.glowing { NODE_GLOW_ANIMATION } else { "" };
                let _ = circle.style().set_property("animation", animation);
            }
        }

        if self.shown_progress != Some(state.progress_percent) {
            let value = format!("{}%", state.progress_percent);
            if let Some(root) = self
                .document
                .document_element()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                let _ = root.style().set_property("--progress", &value);
            }
            if let Some(line) = &self.roadmap_line {
                let _ = line.style().set_property("--progress", &value);
            }
            self.shown_progress = Some(state.progress_percent);
        }

        set_text(&self.current_status, &state.status_text);
        set_text(&self.estimated_delivery, &state.delivery_text);
    }

    fn render_toast(&mut self, app: &TrackerApp) {
        let Some(el) = &self.toast else {
            return;
        };
        let current = app.toast().current();
        if current.map(|t| t.id) == self.shown_toast {
            return;
        }
        match current {
            Some(toast) => {
                let (border, background) = toast.kind.colors();
                let style = el.style();
                let _ = style.set_property("border-color", border);
                let _ = style.set_property("background-color", background);
                el.set_text_content(Some(&toast.message));
                let _ = el.class_list().add_1("show");
            }
            None => {
                let _ = el.class_list().remove_1("show");
            }
        }
        self.shown_toast = current.map(|t| t.id);
    }

    fn render_particles(&mut self, app: &TrackerApp) {
        let live: HashSet<u64> = app.emitter().particles().map(|p| p.id).collect();
        self.particles.retain(|id, el| {
            let keep = live.contains(id);
            if !keep {
                el.remove();
            }
            keep
        });

        let Some(body) = self.document.body() else {
            return;
        };
        for particle in app.emitter().particles() {
            let el = match self.particles.get(&particle.id) {
                Some(el) => el.clone(),
                None => {
                    let Some(el) = self
                        .document
                        .create_element("div")
                        .ok()
                        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                    else {
                        continue;
                    };
                    el.set_class_name(if particle.sparkle {
                        "particle sparkle"
                    } else {
                        "particle"
                    });
                    let _ = el.style().set_property("position", "fixed");
                    let _ = el.style().set_property("pointer-events", "none");
                    let _ = body.append_child(&el);
                    self.particles.insert(particle.id, el.clone());
                    el
                }
            };
            let style = el.style();
            let half = particle.size / 2.0;
            let _ = style.set_property("left", &format!("{:.1}px", particle.pos.x - half));
            let _ = style.set_property("top", &format!("{:.1}px", particle.pos.y - half));
            let _ = style.set_property("width", &format!("{:.1}px", particle.size));
            let _ = style.set_property("height", &format!("{:.1}px", particle.size));
            let _ = style.set_property("opacity", &format!("{:.3}", particle.alpha()));
        }
    }

    fn clear_particles(&mut self) {
        for (_, el) in self.particles.drain() {
            el.remove();
        }
    }
}

/// App plus the page it draws into
struct Widget {
    app: TrackerApp,
    page: Page,
}

pub fn run() -> anyhow::Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("no window"))?;
    let document = window.document().ok_or_else(|| anyhow!("no document"))?;

    let settings = Settings::load();
    let seed = js_sys::Date::now() as u64;
    let widget = Rc::new(RefCell::new(Widget {
        app: TrackerApp::new(settings, seed),
        page: Page::bind(&document),
    }));

    prefill_from_query(&window, &widget);
    setup_token_handlers(&widget);
    setup_track_button(&widget);
    setup_pointer_handlers(&document, &widget);
    setup_unload(&window, &widget);

    {
        let mut w = widget.borrow_mut();
        let Widget { app, page } = &mut *w;
        page.render(app);
    }
    request_animation_frame(widget);
    log::info!("Shipment tracker running");
    Ok(())
}

fn prefill_from_query(window: &web_sys::Window, widget: &Rc<RefCell<Widget>>) {
    let token = window
        .location()
        .search()
        .ok()
        .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
        .and_then(|params| params.get("token"));

    if let Some(token) = token {
        let mut w = widget.borrow_mut();
        if let Some(input) = &w.page.token_input {
            input.set_value(&token);
        }
        w.app.prefill(&token, now_ms());
    }
}

fn validate(widget: &Rc<RefCell<Widget>>) {
    let mut w = widget.borrow_mut();
    if let Err(e) = w.app.validate(now_ms()) {
        log::debug!("Token rejected: {:?}", e);
    }
    w.page.hide_status_section();
}

fn setup_token_handlers(widget: &Rc<RefCell<Widget>>) {
    let document = widget.borrow().page.document.clone();

    if let Some(btn) = document.get_element_by_id("validateBtn") {
        let widget = widget.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| validate(&widget));
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    let Some(input) = widget.borrow().page.token_input.clone() else {
        log::warn!("#tokenInput missing; token gate inactive");
        return;
    };

    // Keystroke normalization
    {
        let widget = widget.clone();
        let field = input.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut w = widget.borrow_mut();
            let normalized = w.app.input(&field.value()).to_string();
            if field.value() != normalized {
                field.set_value(&normalized);
            }
        });
        let _ = input.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Enter submits
    {
        let widget = widget.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.key() == "Enter" {
                validate(&widget);
            }
        });
        let _ =
            input.add_event_listener_with_callback("keypress", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn setup_track_button(widget: &Rc<RefCell<Widget>>) {
    let Some(btn) = widget.borrow().page.track_btn.clone() else {
        return;
    };
    let widget = widget.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
        let mut w = widget.borrow_mut();
        w.app.track(now_ms());
        w.page.hide_status_section();
    });
    let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_pointer_handlers(document: &Document, widget: &Rc<RefCell<Widget>>) {
    {
        let widget = widget.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            widget.borrow_mut().app.pointer_move(
                event.client_x() as f32,
                event.client_y() as f32,
                now_ms(),
            );
        });
        let _ = document
            .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
        closure.forget();
    }
    {
        let widget = widget.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            widget
                .borrow_mut()
                .app
                .pointer_click(event.client_x() as f32, event.client_y() as f32);
        });
        let _ =
            document.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn setup_unload(window: &web_sys::Window, widget: &Rc<RefCell<Widget>>) {
    let widget = widget.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::PageTransitionEvent| {
        // A persisted page goes into the back/forward cache and may be restored live
        if event.persisted() {
            log::debug!("Page cached, keeping tracker alive");
            return;
        }
        let mut w = widget.borrow_mut();
        w.app.shutdown();
        w.page.clear_particles();
    });
    let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn request_animation_frame(widget: Rc<RefCell<Widget>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(move |time: f64| {
        frame(widget, time);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn frame(widget: Rc<RefCell<Widget>>, time: f64) {
    {
        let mut w = widget.borrow_mut();
        if w.app.is_shut_down() {
            log::debug!("Frame loop stopped");
            return;
        }
        let Widget { app, page } = &mut *w;
        if app.frame(time).is_some() {
            page.hide_status_section();
        }
        page.render(app);
    }
    request_animation_frame(widget);
}

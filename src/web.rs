//! Browser side of the greeting: DOM scene containers, calendar face, counter
//! text, audio element and the two canvases. Everything here is a thin adapter
//! from the [`Stage`] / [`CalendarFace`] / [`CounterFace`] seams onto `web_sys`.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlMediaElement, window,
};

use crate::calendar::{CalendarFace, TearVisual};
use crate::config::GreetingConfig;
use crate::counter::{CounterFace, Elapsed, ElapsedCounter, group_thousands};
use crate::scene::{PlaybackError, Scene, SceneController, Stage};
use crate::schedule::{FrameLoop, Interval, LoopControl, Timeout, now_ms};
use crate::snow::SnowField;
use crate::surface::{CanvasSurface, Viewport};
use crate::tree::{Palette, TreeParticleField, TreeRenderer};

const ACTIVE_CLASS: &str = "active";

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("not a 2d context"))
}

fn canvas_by_id(doc: &Document, id: &str) -> Result<HtmlCanvasElement, JsValue> {
    doc.get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("#{id} is not a canvas")))
}

fn window_viewport() -> Viewport {
    let Some(win) = window() else {
        return Viewport::new(0.0, 0.0);
    };
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    Viewport::new(dim(win.inner_width()), dim(win.inner_height()))
}

/// Locale-aware number text, falling back to comma grouping.
fn format_count(n: i64, locale: Option<&str>) -> String {
    match locale {
        Some(lang) => String::from(js_sys::Number::from(n as f64).to_locale_string(lang)),
        None => group_thousands(n),
    }
}

struct DomCounterFace {
    seconds_el: Option<Element>,
    days_el: Option<Element>,
    locale: Option<String>,
}

impl CounterFace for DomCounterFace {
    fn show_elapsed(&mut self, elapsed: Elapsed) {
        let locale = self.locale.as_deref();
        if let Some(el) = &self.seconds_el {
            el.set_text_content(Some(&format_count(elapsed.seconds, locale)));
        }
        if let Some(el) = &self.days_el {
            el.set_text_content(Some(&format_count(elapsed.days, locale)));
        }
    }
}

/// Page-backed [`Stage`]. Owns the render loops and counter interval once the
/// tree scene starts.
pub struct DomStage {
    doc: Document,
    config: GreetingConfig,
    tree_loop: Option<FrameLoop>,
    snow_loop: Option<FrameLoop>,
    counter: Option<Interval>,
    resize_listener: Option<Closure<dyn FnMut()>>,
}

impl DomStage {
    pub fn new(doc: Document, config: GreetingConfig) -> Self {
        Self {
            doc,
            config,
            tree_loop: None,
            snow_loop: None,
            counter: None,
            resize_listener: None,
        }
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.doc.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn start_tree_loop(&mut self) -> Result<(), JsValue> {
        let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
        let canvas = canvas_by_id(&self.doc, "geekTreeCanvas")?;
        let ctx = context_2d(&canvas)?;
        let shape = self.config.tree;
        let size = Viewport::new(shape.surface_width, shape.surface_height);

        // backing store in device pixels, drawing in logical pixels
        let dpr = win.device_pixel_ratio().max(1.0);
        canvas.set_width((size.width * dpr).round() as u32);
        canvas.set_height((size.height * dpr).round() as u32);
        ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
        ctx.scale(dpr, dpr)?;

        let container = canvas
            .parent_element()
            .map(|p| Viewport::new(p.client_width() as f64, p.client_height() as f64))
            .filter(|v| v.width > 0.0)
            .unwrap_or(size);

        let mut rng = SmallRng::from_entropy();
        let field = TreeParticleField::generate_with(
            &shape,
            &Palette::default(),
            container.width,
            container.height,
            &mut rng,
        );
        log::info!(
            "tree: {} points, scale {:.2}, dpr {:.2}",
            field.len(),
            field.scale(),
            dpr
        );
        let mut renderer = TreeRenderer::new(field, size, self.config.projection);
        let mut surface = CanvasSurface::new(ctx);
        self.tree_loop = Some(FrameLoop::start(move |_ts| {
            renderer.render_frame(&mut surface);
            LoopControl::Continue
        })?);
        Ok(())
    }

    fn start_snow_loop(&mut self) -> Result<(), JsValue> {
        let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
        let canvas = canvas_by_id(&self.doc, "snowCanvas")?;
        let mut surface = CanvasSurface::new(context_2d(&canvas)?);
        let viewport = window_viewport();
        canvas.set_width(viewport.width as u32);
        canvas.set_height(viewport.height as u32);

        let field = Rc::new(RefCell::new(SnowField::new(
            self.config.snow_count,
            viewport,
            SmallRng::from_entropy(),
        )));

        let on_resize = {
            let field = field.clone();
            let canvas = canvas.clone();
            Closure::wrap(Box::new(move || {
                let viewport = window_viewport();
                canvas.set_width(viewport.width as u32);
                canvas.set_height(viewport.height as u32);
                field.borrow_mut().resize(viewport);
            }) as Box<dyn FnMut()>)
        };
        win.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
        self.resize_listener = Some(on_resize);

        self.snow_loop = Some(FrameLoop::start(move |_ts| {
            let mut field = field.borrow_mut();
            field.tick();
            field.draw(&mut surface);
            LoopControl::Continue
        })?);
        Ok(())
    }

    fn try_start_counter(&mut self) -> Result<(), JsValue> {
        let counter = ElapsedCounter::new(self.config.start_date);
        let mut face = DomCounterFace {
            seconds_el: self.doc.get_element_by_id("timer"),
            days_el: self.doc.get_element_by_id("timerDays"),
            locale: window().and_then(|w| w.navigator().language()),
        };
        counter.refresh(&chrono::Local::now(), &mut face);
        self.counter = Some(Interval::new(self.config.counter_refresh_ms, move || {
            counter.refresh(&chrono::Local::now(), &mut face);
        })?);
        Ok(())
    }
}

impl CalendarFace for DomStage {
    fn show_date(&mut self, month: &'static str, day: u32) {
        self.set_text("calMonth", month);
        self.set_text("calDay", &day.to_string());
    }

    fn tear_page(&mut self, tear: TearVisual) {
        let Ok(Some(card)) = self.doc.query_selector(".calendar-card") else {
            return;
        };
        let Ok(el) = self.doc.create_element("div") else {
            return;
        };
        el.set_class_name("calendar-tear");
        el.set_inner_html(&format!(
            "<div class=\"calendar-month\">{}</div><div class=\"calendar-day\">{}</div><div class=\"calendar-year\">{}</div>",
            tear.month, tear.day, tear.year
        ));
        if card.append_child(&el).is_err() {
            return;
        }
        if let Err(e) = Timeout::detached(self.config.calendar.tear_display_ms, move || el.remove()) {
            log::warn!("tear cleanup not scheduled: {e:?}");
        }
    }
}

impl Stage for DomStage {
    fn activate(&mut self, scene: Scene) {
        if let Some(el) = self.doc.get_element_by_id(scene.element_id()) {
            el.class_list().add_1(ACTIVE_CLASS).ok();
        }
    }

    fn deactivate(&mut self, scene: Scene) {
        if let Some(el) = self.doc.get_element_by_id(scene.element_id()) {
            el.class_list().remove_1(ACTIVE_CLASS).ok();
        }
    }

    fn open_gift(&mut self) {
        if let Some(el) = self.doc.get_element_by_id("giftBox") {
            el.class_list().add_1("open").ok();
        }
    }

    fn play_audio(&mut self) -> Result<(), PlaybackError> {
        let media = self
            .doc
            .get_element_by_id("bgMusic")
            .ok_or_else(|| PlaybackError("missing #bgMusic".into()))?
            .dyn_into::<HtmlMediaElement>()
            .map_err(|_| PlaybackError("#bgMusic is not a media element".into()))?;
        let promise = media
            .play()
            .map_err(|e| PlaybackError(format!("{e:?}")))?;
        // autoplay policy rejections arrive asynchronously
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("audio playback rejected: {e:?}");
            }
        });
        Ok(())
    }

    fn start_counter(&mut self) {
        if let Err(e) = self.try_start_counter() {
            log::error!("counter: {e:?}");
        }
    }

    fn start_tree(&mut self) {
        if let Err(e) = self.start_tree_loop() {
            log::error!("tree: {e:?}");
        }
        if let Err(e) = self.start_snow_loop() {
            log::error!("snow: {e:?}");
        }
    }
}

impl Drop for DomStage {
    fn drop(&mut self) {
        if let (Some(win), Some(listener)) = (window(), self.resize_listener.as_ref()) {
            win.remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
                .ok();
        }
    }
}

/// Top-level page context: one controller, one stage.
struct GreetingApp {
    controller: SceneController,
    stage: DomStage,
    director: Option<FrameLoop>,
}

thread_local! {
    static APP: RefCell<Option<GreetingApp>> = const { RefCell::new(None) };
}

fn with_app<R>(f: impl FnOnce(&mut GreetingApp) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

pub fn start(config: GreetingConfig) -> Result<(), JsValue> {
    if APP.with(|cell| cell.borrow().is_some()) {
        log::warn!("greeting already started");
        return Ok(());
    }
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let gift = doc
        .get_element_by_id("giftBox")
        .ok_or_else(|| JsValue::from_str("missing #giftBox"))?;

    let mut stage = DomStage::new(doc, config.clone());
    let mut controller = SceneController::new(&config);
    controller.mount(&mut stage);
    APP.with(|cell| {
        cell.replace(Some(GreetingApp {
            controller,
            stage,
            director: None,
        }))
    });

    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            let now = now_ms();
            with_app(|app| app.controller.on_gift_click(now, &mut app.stage));
        }) as Box<dyn FnMut(_)>);
        gift.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    let director = FrameLoop::start(|ts| {
        with_app(|app| {
            app.controller.tick(ts, &mut app.stage);
            if app.controller.is_settled() {
                log::debug!("sequence settled, director loop stopping");
                LoopControl::Stop
            } else {
                LoopControl::Continue
            }
        })
        .unwrap_or(LoopControl::Stop)
    })?;
    with_app(|app| app.director = Some(director));
    log::info!("greeting ready, waiting for the gift to be opened");
    Ok(())
}

// Browser tests: `wasm-pack test --headless --firefox` (or --chrome).
#![cfg(target_arch = "wasm32")]

use std::cell::Cell;
use std::rc::Rc;

use holiday_greeting::schedule::{FrameLoop, Interval, LoopControl, Timeout};
use holiday_greeting::surface::CanvasSurface;
use holiday_greeting::{Rgb, Surface};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

wasm_bindgen_test_configure!(run_in_browser);

fn scratch_canvas() -> (HtmlCanvasElement, CanvasRenderingContext2d) {
    let doc = web_sys::window().unwrap().document().unwrap();
    let canvas: HtmlCanvasElement = doc.create_element("canvas").unwrap().dyn_into().unwrap();
    canvas.set_width(32);
    canvas.set_height(32);
    let ctx = canvas
        .get_context("2d")
        .unwrap()
        .unwrap()
        .dyn_into::<CanvasRenderingContext2d>()
        .unwrap();
    (canvas, ctx)
}

#[wasm_bindgen_test]
fn canvas_surface_fills_and_clears() {
    let (_canvas, ctx) = scratch_canvas();
    let mut surface = CanvasSurface::new(ctx.clone());
    surface.fill_circle(16.0, 16.0, 8.0, Rgb::GOLD, 1.0);
    let px = ctx.get_image_data(16.0, 16.0, 1.0, 1.0).unwrap().data();
    assert_eq!((px[0], px[1], px[2], px[3]), (255, 215, 0, 255));

    surface.clear(32.0, 32.0);
    let px = ctx.get_image_data(16.0, 16.0, 1.0, 1.0).unwrap().data();
    assert_eq!(px[3], 0);
}

#[wasm_bindgen_test]
fn glow_is_reset_after_use() {
    let (_canvas, ctx) = scratch_canvas();
    let mut surface = CanvasSurface::new(ctx.clone());
    surface.set_glow(25.0, Rgb::GOLD);
    assert_eq!(ctx.shadow_blur(), 25.0);
    surface.clear_glow();
    assert_eq!(ctx.shadow_blur(), 0.0);
}

async fn sleep(ms: i32) {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .unwrap();
    });
    JsFuture::from(promise).await.unwrap();
}

fn counter() -> (Rc<Cell<u32>>, impl FnMut() + Clone + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    (hits, move || h.set(h.get() + 1))
}

#[wasm_bindgen_test]
async fn cancelled_or_dropped_timeouts_never_fire() {
    let (hits, bump) = counter();
    let mut cancelled = Timeout::new(0.0, bump.clone()).unwrap();
    cancelled.cancel();
    drop(Timeout::new(0.0, bump.clone()).unwrap());
    let _kept = Timeout::new(0.0, bump.clone()).unwrap();
    Timeout::detached(0.0, bump).unwrap();

    sleep(50).await;
    assert_eq!(hits.get(), 2);
}

#[wasm_bindgen_test]
async fn interval_stops_after_cancel() {
    let (hits, bump) = counter();
    let mut interval = Interval::new(5.0, bump).unwrap();
    sleep(60).await;
    interval.cancel();
    let seen = hits.get();
    assert!(seen > 0);
    sleep(60).await;
    assert_eq!(hits.get(), seen);
}

#[wasm_bindgen_test]
async fn frame_loop_ends_when_the_body_says_stop() {
    let frames = Rc::new(Cell::new(0u32));
    let f = frames.clone();
    let _frame_loop = FrameLoop::start(move |_ts| {
        f.set(f.get() + 1);
        if f.get() >= 3 {
            LoopControl::Stop
        } else {
            LoopControl::Continue
        }
    })
    .unwrap();
    sleep(300).await;
    assert_eq!(frames.get(), 3);
}

#[wasm_bindgen_test]
async fn frame_loop_stops_after_cancel() {
    let frames = Rc::new(Cell::new(0u32));
    let f = frames.clone();
    let mut frame_loop = FrameLoop::start(move |_ts| {
        f.set(f.get() + 1);
        LoopControl::Continue
    })
    .unwrap();
    sleep(100).await;
    frame_loop.cancel();
    let seen = frames.get();
    sleep(100).await;
    assert_eq!(frames.get(), seen);
}

//! The rabbit: a pixel-art sprite that drops into the scene, glows when the
//! pointer comes near and hops away when it comes too close.
//!
//! The actor owns a [`TrackedElement`] and drives four phases: spawn-drop,
//! idle, jump and a cooldown interval. Completion of the drop and jump
//! animations arrives as `animationend` events; the element can have more
//! than one animation running (the art layer idles on its own), so every
//! completion handler filters by animation name.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use gloo::events::EventListener;
use gloo::render::{AnimationFrame, request_animation_frame};
use wasm_bindgen::JsCast;
use web_sys::{AnimationEvent, Document, Element, Event, HtmlElement, MouseEvent};

use crate::config::RabbitConfig;
use crate::sprite::geometry::{self, Direction};
use crate::sprite::tracked::TrackedElement;
use crate::util::{viewport_height, viewport_width};

/// Keyframe names, shared with the stylesheet.
pub const DROP_ANIMATION: &str = "rabbit-drop";
pub const JUMP_ANIMATION: &str = "rabbit-jump";
const SETTLE_ANIMATION_CLASS: &str = "settled";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Spawning,
    Idle,
    Jumping,
}

struct RabbitInner {
    cfg: RabbitConfig,
    base: RefCell<TrackedElement>,
    phase: Cell<Phase>,
    cooling_down: Cell<bool>,
    first_jump: Cell<bool>,
    has_revealed_color: Cell<bool>,
    last_direction: Cell<Direction>,
    glow_bonus: Cell<f64>,
    pointer: Cell<Option<(f64, f64)>>,
    glow_frame: RefCell<Option<AnimationFrame>>,
    pointer_listener: RefCell<Option<EventListener>>,
}

/// Cheap-clone handle; all clones drive the same actor.
#[derive(Clone)]
pub struct Rabbit {
    inner: Rc<RabbitInner>,
}

impl Rabbit {
    pub fn new(cfg: RabbitConfig) -> Self {
        Self {
            inner: Rc::new(RabbitInner {
                cfg,
                base: RefCell::new(TrackedElement::new("rabbit")),
                phase: Cell::new(Phase::Spawning),
                cooling_down: Cell::new(false),
                first_jump: Cell::new(true),
                has_revealed_color: Cell::new(false),
                last_direction: Cell::new(Direction::Right),
                glow_bonus: Cell::new(0.0),
                pointer: Cell::new(None),
                glow_frame: RefCell::new(None),
                pointer_listener: RefCell::new(None),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.phase.get()
    }

    pub fn has_revealed_color(&self) -> bool {
        self.inner.has_revealed_color.get()
    }

    pub fn glow_bonus(&self) -> f64 {
        self.inner.glow_bonus.get()
    }

    pub fn position(&self) -> (f64, f64) {
        let base = self.inner.base.borrow();
        (base.x(), base.y())
    }

    fn element(&self) -> Option<HtmlElement> {
        self.inner.base.borrow().element().cloned()
    }

    /// Place the sprite at `(x, y)`, attach it under `parent` and play the
    /// drop animation. Pointer tracking and the glow loop start right away
    /// so the glow can react before interaction is enabled.
    pub fn spawn_and_drop(&self, x: f64, y: f64, parent: &Element) -> &Self {
        let cfg = self.inner.cfg.clone();
        {
            let mut base = self.inner.base.borrow_mut();
            base.set_position(x, y);
            if !base.spawn(parent, |document| build_sprite(document, &cfg)) {
                return self;
            }
        }
        self.inner.phase.set(Phase::Spawning);

        let Some(el) = self.element() else {
            return self;
        };
        // Fall distance for the drop keyframes, down to the resting line.
        let rest_y = viewport_height() - cfg.rendered_height();
        let _ = el
            .style()
            .set_property("--drop-dy", &format!("{}px", (rest_y - y).max(0.0)));
        let _ = el.class_list().add_1("dropping");

        self.install_early_pointer_listener();
        self.start_glow_loop();

        // Drop completion, filtered by name.
        let rabbit = self.clone();
        self.inner
            .base
            .borrow_mut()
            .listen(&el, "animationend", move |event: &Event| {
                let Some(event) = event.dyn_ref::<AnimationEvent>() else {
                    return;
                };
                if event.animation_name() != DROP_ANIMATION {
                    return;
                }
                if rabbit.inner.phase.get() != Phase::Spawning {
                    return;
                }
                rabbit.stop_glow_loop();
                rabbit.finish_drop();
            });

        // Proximity-qualified clicks feed the permanent glow bonus.
        if let Some(window) = web_sys::window() {
            let rabbit = self.clone();
            self.inner
                .base
                .borrow_mut()
                .listen(&window, "click", move |event: &Event| {
                    let Some(event) = event.dyn_ref::<MouseEvent>() else {
                        return;
                    };
                    rabbit.apply_click_boost(event.client_x() as f64, event.client_y() as f64);
                });
        }
        self
    }

    fn finish_drop(&self) {
        let rest_y = viewport_height() - self.inner.cfg.rendered_height();
        let x = self.inner.base.borrow().x();
        self.inner.base.borrow_mut().set_position(x, rest_y);
        self.inner.phase.set(Phase::Idle);
        if let Some(el) = self.element() {
            let class_list = el.class_list();
            let _ = class_list.remove_1("dropping");
            let _ = class_list.add_1(SETTLE_ANIMATION_CLASS);
            // The settle squash is the only finite animation in flight at
            // this point, so a fire-once listener is enough to clear it.
            let settle_el = el.clone();
            self.inner
                .base
                .borrow()
                .listen_once(&el, "animationend", move |_event: &Event| {
                    let _ = settle_el.class_list().remove_1(SETTLE_ANIMATION_CLASS);
                });
        }
    }

    /// Swap the early pointer handler for the full one: track the pointer,
    /// recompute glow when the frame loop is idle, and trigger a jump when
    /// the pointer comes within `threshold` of the sprite.
    pub fn enable_mouse_reaction(&self, threshold: f64) {
        if self.element().is_none() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let rabbit = self.clone();
        let listener = EventListener::new(&window, "mousemove", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let pointer = (event.client_x() as f64, event.client_y() as f64);
            let inner = &rabbit.inner;
            inner.pointer.set(Some(pointer));
            if inner.glow_frame.borrow().is_none() {
                rabbit.refresh_glow();
            }
            if inner.phase.get() != Phase::Idle || inner.cooling_down.get() {
                return;
            }
            let Some((ax, ay)) = rabbit.rendered_anchor() else {
                return;
            };
            if geometry::distance(pointer.0, pointer.1, ax, ay) >= threshold {
                return;
            }
            // The flag goes up before the async hop so a second mousemove
            // in the same tick cannot start an overlapping jump.
            inner.phase.set(Phase::Jumping);
            let rabbit = rabbit.clone();
            wasm_bindgen_futures::spawn_local(async move {
                rabbit.jump().await;
                rabbit.begin_cooldown();
            });
        });
        *self.inner.pointer_listener.borrow_mut() = Some(listener);
    }

    pub fn disable_mouse_reaction(&self) {
        self.inner.pointer_listener.borrow_mut().take();
    }

    /// Hop one jump-distance left or right; resolves when the jump
    /// animation reports completion. Immediate no-op while unspawned or
    /// still dropping.
    pub async fn jump(&self) {
        let inner = &self.inner;
        if inner.base.borrow().element().is_none() || inner.phase.get() == Phase::Spawning {
            return;
        }
        let cfg = &inner.cfg;
        let x = inner.base.borrow().x();
        let left_ok = geometry::can_jump_left(x, cfg.jump_distance);
        let right_ok = geometry::can_jump_right(
            x,
            cfg.jump_distance,
            cfg.rendered_width(),
            viewport_width(),
        );

        let direction = if inner.first_jump.get() {
            inner.first_jump.set(false);
            self.begin_color_reveal();
            geometry::first_direction(right_ok)
        } else {
            match geometry::choose_direction(
                inner.last_direction.get(),
                left_ok,
                right_ok,
                js_sys::Math::random(),
            ) {
                Some(direction) => direction,
                None => {
                    // Trapped against both edges: nothing was animated, so
                    // drop the jumping flag and resolve right away.
                    inner.phase.set(Phase::Idle);
                    return;
                }
            }
        };
        inner.last_direction.set(direction);
        inner.phase.set(Phase::Jumping);

        let Some(el) = self.element() else {
            return;
        };
        let class_list = el.class_list();
        match direction {
            Direction::Left => {
                let _ = class_list.add_1("facing-left");
            }
            Direction::Right => {
                let _ = class_list.remove_1("facing-left");
            }
        }
        let dx = -direction.sign() * cfg.jump_distance;
        let _ = el.style().set_property("--jump-dx", &format!("{dx}px"));
        // Remove and re-add the animation class with a forced reflow in
        // between, otherwise a repeat of the same animation never restarts.
        let _ = class_list.remove_1("jumping");
        let _ = el.offset_width();
        let _ = class_list.add_1("jumping");

        self.start_glow_loop();

        let (tx, rx) = oneshot::channel::<()>();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let finished = EventListener::new(&el, "animationend", move |event: &Event| {
            let Some(event) = event.dyn_ref::<AnimationEvent>() else {
                return;
            };
            if event.animation_name() != JUMP_ANIMATION {
                return;
            }
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(());
            }
        });
        let _ = rx.await;
        drop(finished);

        // Position and latch updates land before this future resolves, so
        // awaiting callers always observe the new position.
        let landing = geometry::landing_x(inner.base.borrow().x(), direction, cfg.jump_distance);
        let y = inner.base.borrow().y();
        inner.base.borrow_mut().set_position(landing, y);
        self.stop_glow_loop();
        if let Some(el) = self.element() {
            let _ = el.class_list().remove_1("jumping");
        }
        if !inner.has_revealed_color.get() {
            inner.has_revealed_color.set(true);
            if let Some(el) = self.element() {
                let class_list = el.class_list();
                let _ = class_list.remove_1("monochrome");
                let _ = class_list.remove_1("revealing");
            }
        }
        inner.phase.set(Phase::Idle);
    }

    /// Enable the full pointer handler once the drop animation is over,
    /// through a tracked timer so destruction cancels it.
    pub fn enable_mouse_reaction_after(&self, delay_ms: u32, threshold: f64) {
        let rabbit = self.clone();
        self.inner
            .base
            .borrow_mut()
            .schedule(delay_ms, move || rabbit.enable_mouse_reaction(threshold));
    }

    /// Clears the accumulated click bonus.
    pub fn reset_glow_bonus(&self) {
        self.inner.glow_bonus.set(0.0);
        self.refresh_glow();
    }

    /// Tear down listeners, timers, the glow loop and the element. Safe to
    /// call any number of times; an in-flight jump future may still resolve
    /// afterwards with no observable effect.
    pub fn destroy(&self) {
        self.stop_glow_loop();
        self.disable_mouse_reaction();
        self.inner.base.borrow_mut().destroy();
    }

    fn begin_cooldown(&self) {
        self.inner.cooling_down.set(true);
        let rabbit = self.clone();
        self.inner
            .base
            .borrow_mut()
            .schedule(self.inner.cfg.cooldown_ms, move || {
                rabbit.inner.cooling_down.set(false);
            });
    }

    fn begin_color_reveal(&self) {
        if let Some(el) = self.element() {
            let _ = el.class_list().add_1("revealing");
        }
    }

    fn install_early_pointer_listener(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        // During the drop the glow loop is running, so this handler only
        // has to remember where the pointer is.
        let rabbit = self.clone();
        let listener = EventListener::new(&window, "mousemove", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            rabbit
                .inner
                .pointer
                .set(Some((event.client_x() as f64, event.client_y() as f64)));
        });
        *self.inner.pointer_listener.borrow_mut() = Some(listener);
    }

    fn apply_click_boost(&self, x: f64, y: f64) {
        let Some((ax, ay)) = self.rendered_anchor() else {
            return;
        };
        let cfg = &self.inner.cfg;
        if geometry::distance(x, y, ax, ay) > cfg.click_radius {
            return;
        }
        let boosted = geometry::boosted_bonus(
            self.inner.glow_bonus.get(),
            cfg.glow_boost_per_click,
            cfg.max_glow_bonus,
        );
        self.inner.glow_bonus.set(boosted);
        self.refresh_glow();
    }

    /// Bottom-center of the sprite as actually rendered. The stored
    /// position only changes at jump completion while the animation moves
    /// the element continuously, so glow must follow the rendered box.
    fn rendered_anchor(&self) -> Option<(f64, f64)> {
        let el = self.element()?;
        let rect = el.get_bounding_client_rect();
        Some((rect.left() + rect.width() / 2.0, rect.bottom()))
    }

    fn refresh_glow(&self) {
        let Some(el) = self.element() else {
            return;
        };
        let cfg = &self.inner.cfg;
        let factor = match (self.inner.pointer.get(), self.rendered_anchor()) {
            (Some((px, py)), Some((ax, ay))) => geometry::proximity_factor(
                geometry::distance(px, py, ax, ay),
                cfg.glow_range,
                cfg.glow_exponent,
            ),
            _ => 0.0,
        };
        let intensity =
            geometry::glow_intensity(factor, cfg.max_proximity_glow, self.inner.glow_bonus.get());
        let spread = geometry::glow_spread(factor, cfg.max_proximity_spread);
        let style = el.style();
        let _ = style.set_property("--glow-intensity", &format!("{intensity:.4}"));
        let _ = style.set_property("--glow-spread", &format!("{spread:.4}"));
    }

    /// Idempotent: at most one frame loop runs per actor.
    fn start_glow_loop(&self) {
        if self.inner.glow_frame.borrow().is_some() {
            return;
        }
        self.schedule_glow_frame();
    }

    fn schedule_glow_frame(&self) {
        let rabbit = self.clone();
        let handle = request_animation_frame(move |_timestamp| {
            rabbit.inner.glow_frame.borrow_mut().take();
            if rabbit.element().is_none() {
                return;
            }
            rabbit.refresh_glow();
            rabbit.schedule_glow_frame();
        });
        *self.inner.glow_frame.borrow_mut() = Some(handle);
    }

    fn stop_glow_loop(&self) {
        self.inner.glow_frame.borrow_mut().take();
    }
}

fn build_sprite(document: &Document, cfg: &RabbitConfig) -> Option<HtmlElement> {
    let el: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
    el.set_class_name("rabbit monochrome");
    let style = el.style();
    let _ = style.set_property("width", &format!("{}px", cfg.rendered_width()));
    let _ = style.set_property("height", &format!("{}px", cfg.rendered_height()));
    let _ = style.set_property("--sprite-scale", &format!("{}", cfg.scale));
    let _ = style.set_property(
        "--drop-duration",
        &format!("{}ms", cfg.drop_duration_ms),
    );
    let _ = style.set_property(
        "--jump-duration",
        &format!("{}ms", cfg.jump_duration_ms),
    );

    let art: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
    art.set_class_name("rabbit-art");
    el.append_child(&art).ok()?;
    Some(el)
}

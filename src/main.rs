use std::cell::RefCell;
use std::rc::Rc;

use gloo::timers::callback::Timeout;
use web_sys::{Element, HtmlElement};
use yew::prelude::*;

mod config;
mod sprite;
mod terminal;
mod util;

use sprite::Rabbit;
use sprite::geometry::EDGE_MARGIN;
use terminal::Terminal;

const FLICKER_SPIKE_MS: u32 = 110;

#[derive(PartialEq, Clone, Copy)]
enum Stage {
    Intro,
    Scene,
}

/// Random brightness spikes on the CRT frame; each spike schedules the
/// next one, and the shared slot keeps only the pending timer alive.
fn schedule_flicker_spike(frame: &HtmlElement, slot: &Rc<RefCell<Option<Timeout>>>) {
    let delay_ms = 1800 + (js_sys::Math::random() * 4200.0) as u32;
    let frame = frame.clone();
    let slot_for_next = Rc::clone(slot);
    let handle = Timeout::new(delay_ms, move || {
        let _ = frame.class_list().add_1("flicker-spike");
        let clear_target = frame.clone();
        Timeout::new(FLICKER_SPIKE_MS, move || {
            let _ = clear_target.class_list().remove_1("flicker-spike");
        })
        .forget();
        schedule_flicker_spike(&frame, &slot_for_next);
    });
    *slot.borrow_mut() = Some(handle);
}

#[function_component(App)]
fn app() -> Html {
    let cfg = use_memo((), |_| config::load());
    let stage = {
        let cfg = cfg.clone();
        use_state(move || {
            if cfg.skip_intro {
                Stage::Scene
            } else {
                Stage::Intro
            }
        })
    };
    let crt_ref = use_node_ref();
    let scene_ref = use_node_ref();

    // The rabbit lives exactly as long as the scene stage is mounted.
    {
        let scene_ref = scene_ref.clone();
        let cfg = cfg.clone();
        use_effect_with(*stage, move |stage| {
            let mut rabbit = None;
            if let (Stage::Scene, Some(container)) = (*stage, scene_ref.cast::<Element>()) {
                let spawn_x = (util::viewport_width() * 0.5 - cfg.rabbit.rendered_width() * 0.5)
                    .max(EDGE_MARGIN);
                let actor = Rabbit::new(cfg.rabbit.clone());
                actor.spawn_and_drop(spawn_x, 0.0, &container);
                actor.enable_mouse_reaction_after(
                    cfg.rabbit.drop_duration_ms + 50,
                    cfg.rabbit.trigger_distance,
                );
                util::clog(&format!("scene: rabbit spawned at x={spawn_x:.0}"));
                rabbit = Some(actor);
            }
            move || {
                if let Some(actor) = rabbit {
                    actor.destroy();
                }
            }
        });
    }

    // CRT flicker spikes for the whole page lifetime.
    {
        let crt_ref = crt_ref.clone();
        use_effect_with((), move |_| {
            let slot = Rc::new(RefCell::new(None));
            if let Some(frame) = crt_ref.cast::<HtmlElement>() {
                schedule_flicker_spike(&frame, &slot);
            }
            move || {
                slot.borrow_mut().take();
            }
        });
    }

    let to_scene = {
        let stage = stage.clone();
        Callback::from(move |_| stage.set(Stage::Scene))
    };

    html! {
        <div class="crt" ref={crt_ref.clone()}>
            <div class="crt-screen">
                {
                    match *stage {
                        Stage::Intro => html! {
                            <Terminal
                                lines={cfg.intro_lines.clone()}
                                type_speed_ms={cfg.type_speed_ms}
                                outro_pause_ms={cfg.outro_pause_ms}
                                on_done={to_scene.clone()}
                            />
                        },
                        Stage::Scene => html! {
                            <div class="scene" ref={scene_ref.clone()}></div>
                        },
                    }
                }
            </div>
            <div class="crt-scanlines"></div>
            <div class="crt-vignette"></div>
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}

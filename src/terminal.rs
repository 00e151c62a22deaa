//! The typewriter intro: a fake terminal that types its script character by
//! character, then hands control to the scene.

use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::{Interval, Timeout};
use yew::prelude::*;

#[derive(PartialEq)]
struct Progress {
    chars: usize,
}

enum TypeAction {
    Tick,
}

impl Reducible for Progress {
    type Action = TypeAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        match action {
            TypeAction::Tick => Rc::new(Progress {
                chars: self.chars + 1,
            }),
        }
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct TerminalProps {
    pub lines: Vec<String>,
    pub type_speed_ms: u32,
    pub outro_pause_ms: u32,
    pub on_done: Callback<()>,
}

#[function_component(Terminal)]
pub fn terminal(props: &TerminalProps) -> Html {
    let progress = use_reducer(|| Progress { chars: 0 });
    // One beat per character plus one per line break.
    let total: usize = props.lines.iter().map(|l| l.chars().count() + 1).sum();

    {
        let progress = progress.clone();
        let speed = props.type_speed_ms;
        use_effect_with((), move |_| {
            let interval = Interval::new(speed, move || progress.dispatch(TypeAction::Tick));
            move || drop(interval)
        });
    }

    // Finish once the whole script has been typed, after a short pause.
    {
        let on_done = props.on_done.clone();
        let pause = props.outro_pause_ms;
        let fired = use_mut_ref(|| false);
        use_effect_with(progress.chars.min(total), move |&chars| {
            let mut timeout = None;
            if chars >= total && !*fired.borrow() {
                *fired.borrow_mut() = true;
                timeout = Some(Timeout::new(pause, move || on_done.emit(())));
            }
            move || drop(timeout)
        });
    }

    // Any click skips the rest of the intro.
    {
        let on_done = props.on_done.clone();
        use_effect_with((), move |_| {
            let window = web_sys::window().expect("no global `window` exists");
            let skip = EventListener::once(&window, "pointerdown", move |_event| {
                on_done.emit(());
            });
            move || drop(skip)
        });
    }

    let typed = progress.chars.min(total);
    let mut budget = typed;
    let mut caret_done = false;
    let mut rows = Vec::new();
    for (i, line) in props.lines.iter().enumerate() {
        let count = line.chars().count();
        let take = budget.min(count);
        let caret_here = !caret_done && budget <= count;
        if caret_here {
            caret_done = true;
        }
        if take == 0 && !caret_here {
            break;
        }
        let shown: String = line.chars().take(take).collect();
        budget = budget.saturating_sub(count + 1);
        rows.push(html! {
            <div class="terminal-line" key={i}>
                { shown }
                { if caret_here { html! { <span class="caret"></span> } } else { html! {} } }
            </div>
        });
    }
    if !caret_done {
        rows.push(html! {
            <div class="terminal-line" key="caret">
                <span class="caret"></span>
            </div>
        });
    }

    html! {
        <div class="terminal">
            { for rows }
        </div>
    }
}

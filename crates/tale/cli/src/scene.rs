//! The demo cutscene played by the binary.

use tale_core::builder::{
    any, bind, branch, delayed, exec, increment_flag, interpolate, interruptible, multiplex,
    parallel, queue, repeat, repeat_forever, set_trigger, stop, unscaled, wait, wait_for,
};
use tale_core::{ActionId, Easing, Scheduler, Task};
use tracing::{debug, info};

/// Trigger raised by the host to skip the dialogue.
pub const SKIP: &str = "skip";

const CAMERA_SETTLED: &str = "camera-settled";

/// Times the opening has been watched. Flags survive scene resets.
const VISITS: &str = "visits";

fn cue(name: &'static str) -> Task {
    exec(move |frame| info!(cue = name, delta = frame.delta(), "cue"))
}

fn line(speaker: &'static str, text: &'static str, hold: f32) -> Task {
    queue(vec![
        exec(move |_| info!(speaker, "{text}")),
        wait(hold),
    ])
}

/// A rainy street opening: camera pan, ambient loops, two lines of dialogue.
pub fn opening(scheduler: &mut Scheduler) -> ActionId {
    let flicker = scheduler.spawn_task(repeat_forever(|| {
        vec![cue("streetlight-flicker"), wait(0.6)]
    }));

    let ambience = parallel(vec![
        queue(vec![cue("camera-pan"), wait(1.0), set_trigger(CAMERA_SETTLED)]),
        repeat(4, || vec![cue("rain-burst"), wait(0.3)]),
    ]);

    // The blink loop runs on unscaled time so it keeps going while the scene is paused.
    let dialogue = bind(
        queue(vec![
            line("Mira", "You came back.", 1.5),
            line("Jun", "I said I would.", 1.2),
        ]),
        unscaled(repeat_forever(|| vec![cue("blink"), wait(0.8)])),
    );

    scheduler.enqueue_task(queue(vec![
        cue("fade-in"),
        interpolate(0.0_f32, 1.0, 0.5, Easing::EaseOut, |alpha| debug!(alpha, "fade")),
        ambience,
        // Fall through after a few seconds even if the camera never reports in.
        any(vec![wait_for(CAMERA_SETTLED), wait(5.0)]),
        interruptible(SKIP, dialogue),
        increment_flag(VISITS, 1),
        branch(VISITS, |visits| {
            (visits > 1).then(|| line("Mira", "Again? You keep coming back.", 1.0))
        }),
        multiplex(vec![
            delayed(0.4, cue("music-out")),
            cue("fade-out"),
            stop(flicker),
        ]),
    ]))
}

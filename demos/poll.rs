use hidpad::{Config, HatState, Manager};
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path).expect("load config"),
        None => Config::default(),
    };
    let mut mgr = Manager::discover(&config).expect("open HID backend");

    println!("Gamepads:");
    for g in mgr.registry().iter() {
        println!("- {} {} [{}]", g.id(), g.name(), g.identifier());
    }

    let mut last = mgr.snapshot();
    loop {
        mgr.update();
        let snap = mgr.snapshot();
        for (id, state) in snap.iter() {
            if last.get(*id) == Some(state) {
                continue;
            }
            let axes: Vec<String> = state.axes.iter().map(|v| format!("{v:+.2}")).collect();
            let pressed: Vec<usize> = state
                .buttons
                .iter()
                .enumerate()
                .filter_map(|(i, &down)| down.then_some(i))
                .collect();
            let hats: Vec<&HatState> = state
                .hats
                .iter()
                .filter(|h| **h != HatState::Centered)
                .collect();
            println!("{id}: axes=[{}] pressed={pressed:?} hats={hats:?}", axes.join(" "));
        }
        last = snap;
        // Sleep a touch to avoid pegging the CPU in the demo
        std::thread::sleep(Duration::from_millis(5));
    }
}

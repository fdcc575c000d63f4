use hidpad::{Config, Manager};
use std::time::Duration;

/// Samples every device for a moment (so calibration has seen some input)
/// and dumps the registry as JSON.
fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let mut mgr = Manager::discover(&Config::default()).expect("open HID backend");
    for _ in 0..100 {
        mgr.update();
        std::thread::sleep(Duration::from_millis(10));
    }
    println!("{}", mgr.report_json().expect("encode report"));
}

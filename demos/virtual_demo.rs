use hidpad::backends::virtual_input::VirtualBackend;
use hidpad::element::{usage::*, ElementCookie, ElementType, RawElement};
use hidpad::{Config, DeviceProperties, Manager};

fn element(cookie: u32, kind: ElementType, page: u16, usage: u16, max: i64) -> RawElement {
    RawElement {
        cookie: ElementCookie(cookie),
        kind,
        usage_page: page,
        usage,
        logical_min: 0,
        logical_max: max,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let (backend, hub) = VirtualBackend::new();
    let pad = hub.plug(
        DeviceProperties {
            name: Some("Virtual Pad".into()),
            vendor_id: 0x045E,
            product_id: 0x028E,
            version: 0x0114,
            ..Default::default()
        },
        vec![
            element(0, ElementType::InputMisc, PAGE_GENERIC_DESKTOP, GD_X, 255),
            element(1, ElementType::InputMisc, PAGE_GENERIC_DESKTOP, GD_Y, 255),
            element(2, ElementType::InputButton, PAGE_BUTTON, 1, 1),
            element(3, ElementType::InputMisc, PAGE_GENERIC_DESKTOP, GD_HAT_SWITCH, 7),
        ],
    );

    let mut mgr = Manager::new(backend, &Config::default()).expect("open virtual backend");

    // Sweep the X axis and hat, toggling the button.
    for step in 0..=8i64 {
        pad.set(ElementCookie(0), step * 32);
        pad.set(ElementCookie(1), 128);
        pad.set(ElementCookie(2), step % 2);
        pad.set(ElementCookie(3), step);
        mgr.update();

        for (id, state) in mgr.snapshot().iter() {
            println!(
                "{id}: X={:+.2} Y={:+.2} A={} hat={:?}",
                state.axes[0], state.axes[1], state.buttons[0], state.hats[0]
            );
        }
    }

    println!("{}", mgr.report_json().expect("encode report"));

    pad.unplug();
    mgr.update();
    println!("after unplug: {} gamepad(s)", mgr.registry().len());
}

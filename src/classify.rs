//! Element classification.
//!
//! Buckets a device's raw elements into axes, buttons and hats by usage page and
//! usage, then stable-sorts each bucket by `(usage, discovery index)`. The same
//! raw sequence always produces the same buckets in the same order.

use crate::element::{usage::*, Elements, RawElement};

/// Which bucket an element lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    Axis,
    Button,
    Hat,
}

/// Result of classifying one device.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classified {
    pub axes: Elements,
    pub buttons: Elements,
    pub hats: Elements,
}

/// Bucket for a `(usage_page, usage)` pair, or `None` if the element is ignored.
pub fn bucket_for(usage_page: u16, usage: u16) -> Option<Bucket> {
    match usage_page {
        PAGE_GENERIC_DESKTOP => match usage {
            GD_X | GD_Y | GD_Z | GD_RX | GD_RY | GD_RZ | GD_SLIDER | GD_DIAL | GD_WHEEL => {
                Some(Bucket::Axis)
            }
            GD_HAT_SWITCH => Some(Bucket::Hat),
            GD_DPAD_UP | GD_DPAD_RIGHT | GD_DPAD_DOWN | GD_DPAD_LEFT | GD_SYSTEM_MAIN_MENU
            | GD_SELECT | GD_START => Some(Bucket::Button),
            _ => None,
        },
        PAGE_SIMULATION => match usage {
            SIM_ACCELERATOR | SIM_BRAKE | SIM_THROTTLE | SIM_RUDDER | SIM_STEERING => {
                Some(Bucket::Axis)
            }
            _ => None,
        },
        PAGE_BUTTON | PAGE_CONSUMER => Some(Bucket::Button),
        _ => None,
    }
}

/// Classify a device's full raw element list.
pub fn classify<'a, I>(raw: I) -> Classified
where
    I: IntoIterator<Item = &'a RawElement>,
{
    let mut out = Classified::default();

    for el in raw {
        if !el.kind.is_classifiable() {
            continue;
        }
        let bucket = match bucket_for(el.usage_page, el.usage) {
            Some(b) => b,
            None => continue,
        };
        match bucket {
            Bucket::Axis => out.axes.push_raw(el),
            Bucket::Button => out.buttons.push_raw(el),
            Bucket::Hat => out.hats.push_raw(el),
        }
    }

    out.axes.sort();
    out.buttons.sort();
    out.hats.sort();
    out
}

/// Friendly name for common usages, used in channel descriptions.
pub fn usage_name(usage_page: u16, usage: u16) -> String {
    let s = match (usage_page, usage) {
        (PAGE_GENERIC_DESKTOP, GD_X) => "X",
        (PAGE_GENERIC_DESKTOP, GD_Y) => "Y",
        (PAGE_GENERIC_DESKTOP, GD_Z) => "Z",
        (PAGE_GENERIC_DESKTOP, GD_RX) => "Rx",
        (PAGE_GENERIC_DESKTOP, GD_RY) => "Ry",
        (PAGE_GENERIC_DESKTOP, GD_RZ) => "Rz",
        (PAGE_GENERIC_DESKTOP, GD_SLIDER) => "Slider",
        (PAGE_GENERIC_DESKTOP, GD_DIAL) => "Dial",
        (PAGE_GENERIC_DESKTOP, GD_WHEEL) => "Wheel",
        (PAGE_GENERIC_DESKTOP, GD_HAT_SWITCH) => "Hat",
        (PAGE_GENERIC_DESKTOP, GD_START) => "Start",
        (PAGE_GENERIC_DESKTOP, GD_SELECT) => "Select",
        (PAGE_GENERIC_DESKTOP, GD_SYSTEM_MAIN_MENU) => "Menu",
        (PAGE_GENERIC_DESKTOP, GD_DPAD_UP) => "DPadUp",
        (PAGE_GENERIC_DESKTOP, GD_DPAD_DOWN) => "DPadDown",
        (PAGE_GENERIC_DESKTOP, GD_DPAD_RIGHT) => "DPadRight",
        (PAGE_GENERIC_DESKTOP, GD_DPAD_LEFT) => "DPadLeft",
        (PAGE_SIMULATION, SIM_RUDDER) => "Rudder",
        (PAGE_SIMULATION, SIM_THROTTLE) => "Throttle",
        (PAGE_SIMULATION, SIM_ACCELERATOR) => "Accelerator",
        (PAGE_SIMULATION, SIM_BRAKE) => "Brake",
        (PAGE_SIMULATION, SIM_CLUTCH) => "Clutch",
        (PAGE_SIMULATION, SIM_STEERING) => "Steering",
        (PAGE_BUTTON, u) => return format!("Button{u}"),
        (PAGE_CONSUMER, u) => return format!("Consumer_{u:#06x}"),
        (PAGE_GENERIC_DESKTOP, u) => return format!("GD_{u:#04x}"),
        (up, u) => return format!("UP_{up:04x}_U_{u:04x}"),
    };
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementCookie, ElementType};

    fn raw(cookie: u32, kind: ElementType, page: u16, usage: u16) -> RawElement {
        RawElement {
            cookie: ElementCookie(cookie),
            kind,
            usage_page: page,
            usage,
            logical_min: 0,
            logical_max: 255,
        }
    }

    fn cookies(e: &Elements) -> Vec<u32> {
        e.iter().map(|el| el.cookie().0).collect()
    }

    fn sample_device() -> Vec<RawElement> {
        use ElementType::*;
        vec![
            raw(1, InputMisc, PAGE_GENERIC_DESKTOP, GD_Y),
            raw(2, InputMisc, PAGE_GENERIC_DESKTOP, GD_X),
            raw(3, InputButton, PAGE_BUTTON, 2),
            raw(4, InputButton, PAGE_BUTTON, 1),
            raw(5, InputMisc, PAGE_GENERIC_DESKTOP, GD_HAT_SWITCH),
            raw(6, InputMisc, PAGE_SIMULATION, SIM_THROTTLE),
            raw(7, InputButton, PAGE_GENERIC_DESKTOP, GD_START),
            raw(8, InputButton, PAGE_CONSUMER, 0x223),
            raw(9, Output, PAGE_GENERIC_DESKTOP, GD_X),
            raw(10, Feature, PAGE_BUTTON, 3),
            raw(11, Collection, PAGE_GENERIC_DESKTOP, GD_GAMEPAD),
            raw(12, InputMisc, 0xFF00, 0x01),
            raw(13, InputMisc, PAGE_SIMULATION, SIM_CLUTCH),
            raw(14, InputAxis, PAGE_GENERIC_DESKTOP, GD_RZ),
        ]
    }

    #[test]
    fn buckets_follow_usage_tables() {
        let c = classify(&sample_device());
        // X(0x30), Y(0x31), Rz(0x35), Throttle(0xBB)
        assert_eq!(cookies(&c.axes), vec![2, 1, 14, 6]);
        // Button1, Button2, Start(0x3D), Consumer 0x223
        assert_eq!(cookies(&c.buttons), vec![4, 3, 7, 8]);
        assert_eq!(cookies(&c.hats), vec![5]);
    }

    #[test]
    fn index_is_discovery_order_within_bucket() {
        let c = classify(&sample_device());
        let idx: Vec<usize> = c.axes.iter().map(|e| e.desc.index).collect();
        // Discovery order was Y, X, Throttle, Rz.
        assert_eq!(idx, vec![1, 0, 3, 2]);
    }

    #[test]
    fn logical_range_seeds_calibration() {
        let mut els = sample_device();
        els[1].logical_min = -32768;
        els[1].logical_max = 32767;
        let c = classify(&els);
        let x = &c.axes[0];
        assert_eq!(x.calibration.min(), -32768);
        assert_eq!(x.calibration.max(), 32767);
    }

    #[test]
    fn classification_is_deterministic() {
        let els = sample_device();
        assert_eq!(classify(&els), classify(&els));
    }

    #[test]
    fn equal_usages_keep_discovery_order() {
        use ElementType::*;
        let els = vec![
            raw(30, InputButton, PAGE_BUTTON, 1),
            raw(10, InputButton, PAGE_BUTTON, 5),
            raw(20, InputButton, PAGE_BUTTON, 1),
            raw(40, InputButton, PAGE_CONSUMER, 1),
        ];
        let c = classify(&els);
        assert_eq!(cookies(&c.buttons), vec![30, 20, 40, 10]);
    }

    #[test]
    fn unknown_pages_and_types_are_ignored() {
        use ElementType::*;
        let els = vec![
            raw(1, InputScanCodes, PAGE_BUTTON, 1),
            raw(2, InputNull, PAGE_GENERIC_DESKTOP, GD_X),
            raw(3, InputMisc, PAGE_GENERIC_DESKTOP, 0x02),
            raw(4, InputMisc, 0x0F, 0x21),
        ];
        assert_eq!(classify(&els), Classified::default());
    }

    #[test]
    fn usage_names() {
        assert_eq!(usage_name(PAGE_GENERIC_DESKTOP, GD_RX), "Rx");
        assert_eq!(usage_name(PAGE_SIMULATION, SIM_BRAKE), "Brake");
        assert_eq!(usage_name(PAGE_BUTTON, 3), "Button3");
        assert_eq!(usage_name(0xFF00, 1), "UP_ff00_U_0001");
    }
}

//! Per-poll value sampling.
//!
//! One pass reads every classified element through a [`ValueSource`], widens
//! axis calibration, and writes normalized values into reused buffers.

use crate::device::ValueSource;
use crate::element::Elements;
use crate::event::HatState;

/// Growable buffer whose logical length is independent of its allocation.
///
/// The backing storage only grows; shrinking the logical length keeps the
/// allocation around for the next poll.
#[derive(Clone, Debug, Default)]
pub struct ValueBuffer<T> {
    buf: Vec<T>,
    len: usize,
}

impl<T: Copy + Default> ValueBuffer<T> {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            len: 0,
        }
    }

    /// Set the logical length, growing storage only when needed.
    pub fn set_len(&mut self, len: usize) {
        if self.buf.len() < len {
            self.buf.resize(len, T::default());
        }
        self.len = len;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated slots (never decreases).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<T> {
        self.as_slice().get(i).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buf[..self.len]
    }

    /// Reset every live slot to the default value.
    pub fn clear_values(&mut self) {
        self.as_mut_slice().fill(T::default());
    }
}

/// Sample every axis: widen calibration on successful reads, then normalize.
///
/// A failed read yields `0.0` and does not touch calibration.
pub fn sample_axes(source: &dyn ValueSource, axes: &mut Elements, out: &mut ValueBuffer<f64>) {
    out.set_len(axes.len());
    let values = out.as_mut_slice();
    for (slot, axis) in values.iter_mut().zip(axes.iter_mut()) {
        *slot = match source.value(axis.cookie()) {
            Some(raw) => {
                axis.calibration.observe(raw);
                axis.calibration.normalize(raw)
            }
            None => 0.0,
        };
    }
}

/// A button is pressed while its raw value is positive.
pub fn sample_buttons(source: &dyn ValueSource, buttons: &Elements, out: &mut ValueBuffer<bool>) {
    out.set_len(buttons.len());
    let values = out.as_mut_slice();
    for (slot, button) in values.iter_mut().zip(buttons.iter()) {
        *slot = source.value(button.cookie()).is_some_and(|raw| raw > 0);
    }
}

/// Decode every hat; unreadable hats are `Centered`.
pub fn sample_hats(source: &dyn ValueSource, hats: &Elements, out: &mut ValueBuffer<HatState>) {
    out.set_len(hats.len());
    let values = out.as_mut_slice();
    for (slot, hat) in values.iter_mut().zip(hats.iter()) {
        *slot = source
            .value(hat.cookie())
            .map_or(HatState::Centered, HatState::from_raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementCookie, ElementType, RawElement};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Stand-in for a device: cookie → raw value.
    #[derive(Default)]
    struct FakeSource(Mutex<HashMap<u32, i64>>);

    impl FakeSource {
        fn set(&self, cookie: u32, raw: i64) {
            self.0.lock().insert(cookie, raw);
        }
    }

    impl ValueSource for FakeSource {
        fn value(&self, element: ElementCookie) -> Option<i64> {
            self.0.lock().get(&element.0).copied()
        }
    }

    fn bucket(specs: &[(u32, i64, i64)]) -> Elements {
        let mut e = Elements::new();
        for &(cookie, lo, hi) in specs {
            e.push_raw(&RawElement {
                cookie: ElementCookie(cookie),
                kind: ElementType::InputMisc,
                usage_page: 1,
                usage: 0x30,
                logical_min: lo,
                logical_max: hi,
            });
        }
        e
    }

    #[test]
    fn buffer_grows_but_never_shrinks() {
        let mut b: ValueBuffer<f64> = ValueBuffer::new();
        assert!(b.is_empty());
        b.set_len(4);
        assert_eq!((b.len(), b.capacity()), (4, 4));
        b.as_mut_slice()[3] = 0.5;
        b.set_len(2);
        assert_eq!((b.len(), b.capacity()), (2, 4));
        assert_eq!(b.get(3), None);
        b.set_len(4);
        assert_eq!(b.capacity(), 4);
        b.clear_values();
        assert_eq!(b.as_slice(), &[0.0; 4]);
    }

    #[test]
    fn axis_values_stay_in_unit_interval_and_bounds_widen() {
        let src = FakeSource::default();
        let mut axes = bucket(&[(1, 0, 100)]);
        let mut out = ValueBuffer::new();

        let mut last = (0, 100);
        for raw in [50, -20, 130, 0, 400, -1000, 7] {
            src.set(1, raw);
            sample_axes(&src, &mut axes, &mut out);
            let v = out.get(0).unwrap();
            assert!((-1.0..=1.0).contains(&v), "raw={raw} v={v}");
            let c = axes[0].calibration;
            assert!(c.min() <= last.0 && c.max() >= last.1);
            last = (c.min(), c.max());
        }
        assert_eq!(last, (-1000, 400));
    }

    #[test]
    fn raw_below_minimum_lands_on_minus_one() {
        let src = FakeSource::default();
        let mut axes = bucket(&[(1, 0, 255)]);
        let mut out = ValueBuffer::new();
        src.set(1, -10);
        sample_axes(&src, &mut axes, &mut out);
        assert_eq!(out.get(0), Some(-1.0));
        assert_eq!(axes[0].calibration.min(), -10);
    }

    #[test]
    fn unreadable_elements_resolve_to_defaults() {
        let src = FakeSource::default();
        let mut axes = bucket(&[(1, 0, 255)]);
        let buttons = bucket(&[(2, 0, 1)]);
        let hats = bucket(&[(3, 0, 7)]);
        let (mut a, mut b, mut h) = (ValueBuffer::new(), ValueBuffer::new(), ValueBuffer::new());

        sample_axes(&src, &mut axes, &mut a);
        sample_buttons(&src, &buttons, &mut b);
        sample_hats(&src, &hats, &mut h);

        assert_eq!(a.as_slice(), &[0.0]);
        assert_eq!(b.as_slice(), &[false]);
        assert_eq!(h.as_slice(), &[HatState::Centered]);
        // A failed read is not an observation.
        assert_eq!(axes[0].calibration.min(), 0);
        assert_eq!(axes[0].calibration.max(), 255);
    }

    #[test]
    fn buttons_press_on_positive_raw() {
        let src = FakeSource::default();
        let buttons = bucket(&[(1, 0, 1), (2, 0, 1), (3, -1, 1)]);
        let mut out = ValueBuffer::new();
        src.set(1, 1);
        src.set(2, 0);
        src.set(3, -1);
        sample_buttons(&src, &buttons, &mut out);
        assert_eq!(out.as_slice(), &[true, false, false]);
    }
}

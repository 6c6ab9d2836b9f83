use crate::simple_ring_buffer::RingBuffer;
use lsm9ds1::PlaneAngles;

/// Middle element of the window in insertion order, or the zero value when
/// the window is empty. No sorting takes place.
pub fn positional_median<T: Copy + Default>(window: &RingBuffer<T>) -> T {
    window.middle().unwrap_or_default()
}

/// Peak-to-peak spread (`max - min`) of each plane across the window.
/// Zero when the window is empty.
pub fn peak_to_peak(window: &RingBuffer<PlaneAngles>) -> PlaneAngles {
    let mut it = window.iter();
    let Some(&first) = it.next() else {
        return PlaneAngles::default();
    };
    let (lo, hi) = it.fold((first, first), |(lo, hi), p| {
        (
            PlaneAngles::new(lo.a.min(p.a), lo.b.min(p.b), lo.c.min(p.c)),
            PlaneAngles::new(hi.a.max(p.a), hi.b.max(p.b), hi.c.max(p.c)),
        )
    });
    PlaneAngles::new(hi.a - lo.a, hi.b - lo.b, hi.c - lo.c)
}

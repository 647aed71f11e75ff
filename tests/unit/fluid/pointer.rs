use super::*;

fn mv(u: f32) -> Splat {
    Splat {
        kind: SplatKind::Move,
        u,
        v: 0.0,
        du: 0.0,
        dv: 0.0,
    }
}

#[test]
fn full_queue_drops_the_oldest() {
    let mut q = SplatQueue::new(2);
    q.push(mv(0.1));
    q.push(mv(0.2));
    q.push(mv(0.3));
    assert_eq!(q.len(), 2);
    assert_eq!(q.dropped(), 1);
    let us: Vec<f32> = q.drain().map(|s| s.u).collect();
    assert_eq!(us, vec![0.2, 0.3]);
    assert!(q.is_empty());
}

#[test]
fn zero_cap_still_holds_one() {
    let mut q = SplatQueue::new(0);
    assert_eq!(q.cap(), 1);
    q.push(mv(0.5));
    q.push(mv(0.6));
    assert_eq!(q.len(), 1);
}

#[test]
fn active_moves_splat_in_order() {
    let mut p = PointerInput::new(8, 1.0);
    p.set_viewport(100, 100);
    p.pointer(0.2, 0.3, 0.05, 0.0, true);
    p.click(0.7, 0.7);
    let drained = p.drain();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].kind, SplatKind::Move);
    assert_eq!(drained[1].kind, SplatKind::Click);
    assert!((p.speed_px() - 5.0).abs() < 1e-4);
    assert!(!p.has_pending());
}

#[test]
fn moves_below_the_noise_floor_do_not_splat() {
    let mut p = PointerInput::new(8, 2.0);
    p.set_viewport(100, 100);
    p.pointer(0.5, 0.5, 0.01, 0.01, true);
    assert!(!p.has_pending());
    assert_eq!(p.position(), [0.5, 0.5]);
    assert!(p.is_active());
    assert_eq!(p.speed_px(), 0.0);
}

#[test]
fn inactive_pointer_updates_position_only() {
    let mut p = PointerInput::new(8, 0.0);
    p.set_viewport(100, 100);
    p.pointer(0.1, 0.9, 0.5, 0.5, false);
    assert!(!p.has_pending());
    assert!(!p.is_active());
    assert!((p.position()[1] - 0.9).abs() < 1e-6);
}

#[test]
fn coordinates_are_clamped_and_non_finite_events_ignored() {
    let mut p = PointerInput::new(8, 0.0);
    p.pointer(1.5, -0.5, 0.1, 0.1, true);
    assert_eq!(p.position(), [1.0, 0.0]);
    p.pointer(f32::NAN, 0.5, 0.0, 0.0, true);
    assert_eq!(p.position(), [1.0, 0.0]);
    p.click(f32::INFINITY, 0.0);
    assert_eq!(p.queue().len(), 1);
}

#[test]
fn reset_forgets_everything_pending() {
    let mut p = PointerInput::new(8, 0.0);
    p.pointer(0.5, 0.5, 0.2, 0.0, true);
    p.click(0.5, 0.5);
    p.reset();
    assert!(!p.has_pending());
    assert!(!p.is_active());
}

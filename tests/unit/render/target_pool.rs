use super::*;
use crate::render::cpu::CpuDevice;

#[test]
fn released_entries_are_reused_exactly() {
    let mut dev = CpuDevice::default();
    let mut pool = RenderTargetPool::new();
    let opts = TargetOptions::default();
    let a = pool.acquire(&mut dev, 8, 8, opts).unwrap();
    pool.release(a);
    let b = pool.acquire(&mut dev, 8, 8, opts).unwrap();
    assert_eq!(a.texture, b.texture);
    assert_eq!(pool.stats().allocations, 1);
    assert_eq!(pool.stats().reuses, 1);
}

#[test]
fn mismatched_keys_allocate() {
    let mut dev = CpuDevice::default();
    let mut pool = RenderTargetPool::new();
    let opts = TargetOptions::default();
    let a = pool.acquire(&mut dev, 8, 8, opts).unwrap();
    pool.release(a);
    let b = pool
        .acquire(&mut dev, 8, 8, opts.with_filter(TextureFilter::Nearest))
        .unwrap();
    let c = pool
        .acquire(&mut dev, 8, 8, opts.with_format(TextureFormat::Rgba8Unorm))
        .unwrap();
    let d = pool.acquire(&mut dev, 8, 4, opts).unwrap();
    for t in [b, c, d] {
        assert_ne!(t.texture, a.texture);
    }
    assert_eq!(pool.stats().allocations, 4);
}

#[test]
fn acquiring_n_after_releasing_n_minus_one_allocates_at_most_one() {
    for n in 1..=6usize {
        let mut dev = CpuDevice::default();
        let mut pool = RenderTargetPool::new();
        let opts = TargetOptions::default();
        let first: Vec<_> = (0..n)
            .map(|_| pool.acquire(&mut dev, 16, 16, opts).unwrap())
            .collect();
        for t in &first[..n - 1] {
            pool.release(*t);
        }
        let before = pool.stats().allocations;
        let second: Vec<_> = (0..n)
            .map(|_| pool.acquire(&mut dev, 16, 16, opts).unwrap())
            .collect();
        assert!(pool.stats().allocations - before <= 1, "n = {n}");

        let mut ids: Vec<_> = second.iter().chain(&first[n - 1..]).map(|t| t.texture).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), n + 1, "no target is lent out twice");
    }
}

#[test]
fn double_and_foreign_release_are_ignored() {
    let mut dev = CpuDevice::default();
    let mut pool = RenderTargetPool::new();
    let a = pool
        .acquire(&mut dev, 4, 4, TargetOptions::default())
        .unwrap();
    pool.release(a);
    pool.release(a);
    assert_eq!(pool.stats().releases, 1);

    let foreign = RenderTarget {
        texture: TextureId(9999),
        ..a
    };
    pool.release(foreign);
    assert_eq!(pool.stats().free, 1);
}

#[test]
fn purge_and_teardown_destroy_device_textures() {
    let mut dev = CpuDevice::default();
    let mut pool = RenderTargetPool::new();
    let opts = TargetOptions::default();
    let a = pool.acquire(&mut dev, 4, 4, opts).unwrap();
    let b = pool.acquire(&mut dev, 4, 4, opts).unwrap();
    pool.release(a);
    assert_eq!(pool.purge_free(&mut dev), 1);
    assert!(dev.texture_size(a.texture).is_none());
    assert!(pool.is_in_use(&b));

    pool.teardown(&mut dev);
    assert!(pool.is_empty());
    assert_eq!(dev.stats().live_textures, 0);
    assert_eq!(pool.stats().destroyed, 2);
}

#[test]
fn purge_stale_keeps_sizes_still_in_use() {
    let mut dev = CpuDevice::default();
    let mut pool = RenderTargetPool::new();
    let opts = TargetOptions::default();
    let live = pool.acquire(&mut dev, 16, 16, opts).unwrap();
    let same_size = pool.acquire(&mut dev, 16, 16, opts).unwrap();
    let old = pool.acquire(&mut dev, 8, 8, opts).unwrap();
    pool.release(same_size);
    pool.release(old);

    assert_eq!(pool.purge_stale(&mut dev), 1);
    assert!(dev.texture_size(old.texture).is_none());
    assert!(dev.texture_size(same_size.texture).is_some());
    assert!(pool.is_in_use(&live));
    assert_eq!(pool.stats().free, 1);
    assert_eq!(pool.purge_stale(&mut dev), 0);
}

#[test]
fn zero_sizes_are_bumped_to_one() {
    let mut dev = CpuDevice::default();
    let mut pool = RenderTargetPool::new();
    let t = pool
        .acquire(&mut dev, 0, 3, TargetOptions::default())
        .unwrap();
    assert_eq!((t.width, t.height), (1, 3));
}

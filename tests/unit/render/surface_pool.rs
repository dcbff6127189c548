use super::*;

#[test]
fn pool_reuses_released_pixmaps() {
    let mut p = SurfacePool::new(SurfacePoolOpts::default());
    let a = p.borrow(8, 8).unwrap();
    p.release(a);
    let _b = p.borrow(8, 8).unwrap();

    let st = p.stats();
    assert_eq!(st.alloc_surfaces, 1);
    assert_eq!(st.retained_surfaces, 0);
}

#[test]
fn pool_honors_bucket_cap() {
    let mut p = SurfacePool::new(SurfacePoolOpts {
        max_pool_bytes: 1 << 30,
        max_surfaces_per_bucket: 1,
    });
    let a = p.borrow(8, 8).unwrap();
    let b = p.borrow(8, 8).unwrap();
    p.release(a);
    p.release(b);
    assert_eq!(p.stats().retained_surfaces, 1);
    assert_eq!(p.stats().dropped_on_release, 1);
}

#[test]
fn pool_honors_global_byte_cap() {
    let mut p = SurfacePool::new(SurfacePoolOpts {
        max_pool_bytes: 8 * 8 * 4,
        max_surfaces_per_bucket: 8,
    });
    let a = p.borrow(8, 8).unwrap();
    let b = p.borrow(8, 8).unwrap();
    p.release(a);
    p.release(b);

    let st = p.stats();
    assert_eq!(st.retained_bytes, 8 * 8 * 4);
    assert_eq!(st.retained_surfaces, 1);
    assert!(st.dropped_on_release >= 1);
}

#[test]
fn oversized_surface_is_an_error() {
    let mut p = SurfacePool::new(SurfacePoolOpts::default());
    assert!(p.borrow(70_000, 1).is_err());
}

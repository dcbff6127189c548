use super::*;

fn steps() -> SteppedProperty<&'static str> {
    SteppedProperty::new(vec![
        Step {
            time: 0.0,
            value: "a",
        },
        Step {
            time: 100.0,
            value: "b",
        },
    ])
}

#[test]
fn switches_at_step_time() {
    let p = steps();
    assert_eq!(*p.sample(SampleCtx::at(-10.0)).unwrap(), "a");
    assert_eq!(*p.sample(SampleCtx::at(99.9)).unwrap(), "a");
    assert_eq!(*p.sample(SampleCtx::at(100.0)).unwrap(), "b");
    assert_eq!(*p.sample(SampleCtx::at(1.0e6)).unwrap(), "b");
}

#[test]
fn respects_nested_offset() {
    let p = steps();
    let ctx = SampleCtx {
        time: 150.0,
        nested_offset: 100.0,
    };
    assert_eq!(*p.sample(ctx).unwrap(), "a");
}

#[test]
fn empty_is_rejected() {
    let p: SteppedProperty<u8> = SteppedProperty::new(Vec::new());
    assert!(p.sample(SampleCtx::at(0.0)).is_err());
    assert!(p.validate().is_err());
}

use crate::threshold::{Direction, Threshold, ThresholdSpec};
use std::sync::{Arc, Mutex};

type Fired = Arc<Mutex<Vec<(usize, f64, u64)>>>;

/// A threshold whose callback records (sample index, value, fire count).
fn recording(spec: ThresholdSpec) -> (Threshold, Fired, Arc<Mutex<usize>>) {
    let fired: Fired = Arc::default();
    let index = Arc::new(Mutex::new(0usize));
    let (log, at) = (Arc::clone(&fired), Arc::clone(&index));
    let threshold = Threshold::new(spec, move |f| {
        let i = *at.lock().unwrap();
        log.lock().unwrap().push((i, f.value, f.fire_count));
    })
    .unwrap();
    (threshold, fired, index)
}

fn feed(t: &mut Threshold, index: &Mutex<usize>, values: &[f64]) -> Vec<bool> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            *index.lock().unwrap() = i + 1;
            t.evaluate(*v)
        })
        .collect()
}

#[test]
fn sustained_crossing_fires_once_on_the_third_consecutive_hit() {
    let spec = ThresholdSpec::exceed("cpu-high", 80.0).with_required_hits(3);
    let (mut t, fired, index) = recording(spec);

    feed(&mut t, &index, &[85.0, 90.0, 70.0, 95.0, 95.0, 95.0]);

    assert_eq!(*fired.lock().unwrap(), vec![(6, 95.0, 1)]);
    assert_eq!(t.fire_count(), 1);
    assert_eq!(t.run_count(), 0);
}

#[test]
fn never_qualifying_values_never_fire() {
    let (mut t, fired, index) = recording(ThresholdSpec::exceed("x", 50.0));
    let values: Vec<f64> = (0..200).map(|i| (i % 50) as f64).collect();

    feed(&mut t, &index, &values);

    assert_eq!(t.fire_count(), 0);
    assert!(fired.lock().unwrap().is_empty());
}

#[test]
fn exactly_n_hits_then_a_miss_fires_once_and_resets() {
    for n in 1..=5u32 {
        let spec = ThresholdSpec::deceed("free-low", 10.0).with_required_hits(n);
        let (mut t, fired, index) = recording(spec);
        let mut values = vec![5.0; n as usize];
        values.push(50.0);

        let fires = feed(&mut t, &index, &values);

        assert_eq!(fired.lock().unwrap().len(), 1, "n = {n}");
        assert!(fires[n as usize - 1]);
        assert_eq!(t.run_count(), 0);
    }
}

#[test]
fn sustained_condition_fires_at_its_cadence() {
    let spec = ThresholdSpec::exceed("x", 0.0).with_required_hits(2);
    let (mut t, _fired, index) = recording(spec);

    let fires = feed(&mut t, &index, &[1.0; 7]);

    assert_eq!(fires, vec![false, true, false, true, false, true, false]);
    assert_eq!(t.run_count(), 1);
}

#[test]
fn single_hit_requirement_fires_on_every_qualifying_sample() {
    let values = [1.0, 9.0, 9.0, 2.0, 9.0, 5.0, 5.1, 4.9];
    let (mut t, fired, index) = recording(ThresholdSpec::exceed("edge", 5.0));

    let fires = feed(&mut t, &index, &values);

    let expected: Vec<bool> = values.iter().map(|v| *v > 5.0).collect();
    assert_eq!(fires, expected);
    let counts: Vec<u64> = fired.lock().unwrap().iter().map(|f| f.2).collect();
    assert_eq!(counts, vec![1, 2, 3, 4]);
}

#[test]
fn limit_caps_callback_invocations() {
    let spec = ThresholdSpec::new("capped", 1.0, Direction::Exceed).with_limit(2);
    let (mut t, fired, index) = recording(spec);

    let fires = feed(&mut t, &index, &[2.0; 5]);

    assert_eq!(fires, vec![true, true, false, false, false]);
    assert_eq!(fired.lock().unwrap().len(), 2);
    assert_eq!(t.fire_count(), 2);
    assert!(t.is_exhausted());
}

#[test]
fn firing_exposes_the_spec() {
    let names = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&names);
    let mut t = Threshold::new(ThresholdSpec::deceed("mem-free", 20.0), move |f| {
        seen.lock()
            .unwrap()
            .push(format!("{} {}", f.spec.name, f.spec.direction));
    })
    .unwrap();

    t.evaluate(10.0);

    assert_eq!(*names.lock().unwrap(), vec!["mem-free deceed".to_string()]);
    assert_eq!(t.spec().to_string(), "mem-free (deceed 20 x1)");
}

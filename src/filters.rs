//! Composable subscriber filters (§4.4.4): each wraps an inner
//! [`event_manager::Callback`] so it only fires when some condition holds,
//! and exposes itself as a `Callback` in turn so filters compose.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::event_manager::{BoxFuture, Callback};
use crate::value::Value;

const TOLERANCE: f64 = 0.1;

fn significantly_changed(old: &Option<Value>, new: &Value) -> bool {
    match old {
        None => true,
        Some(old) => old.significantly_differs_from(new),
    }
}

/// Fires the wrapped callback only when the dispatched value has
/// significantly changed from the last value this filter saw.
pub fn on_change(callback: Callback) -> Callback {
    let last = Arc::new(Mutex::new(None::<Value>));
    Arc::new(move |value| {
        let callback = callback.clone();
        let last = last.clone();
        Box::pin(async move {
            let mut last = last.lock().await;
            if significantly_changed(&last, &value) {
                *last = Some(value.clone());
                drop(last);
                return callback(value).await;
            }
            None
        }) as BoxFuture<Option<Value>>
    })
}

/// Fires only once the value has stabilized across `min_calls` consecutive
/// significant-change observations (or immediately, on the first value ever
/// seen).
pub fn debounce(callback: Callback, min_calls: u32) -> Callback {
    struct State {
        last: Option<Value>,
        calls: u32,
    }
    let state = Arc::new(Mutex::new(State { last: None, calls: 0 }));
    Arc::new(move |value| {
        let callback = callback.clone();
        let state = state.clone();
        Box::pin(async move {
            let mut state = state.lock().await;
            if significantly_changed(&state.last, &value) {
                state.calls += 1;
            } else {
                state.calls = 0;
            }

            if state.last.is_none() || state.calls >= min_calls {
                state.last = Some(value.clone());
                state.calls = 0;
                drop(state);
                return callback(value).await;
            }
            None
        }) as BoxFuture<Option<Value>>
    })
}

/// Fires at most once per `interval`, regardless of how often the dispatched
/// value changes in between.
pub fn throttle(callback: Callback, interval: std::time::Duration) -> Callback {
    let last_fired = Arc::new(Mutex::new(None::<std::time::Instant>));
    Arc::new(move |value| {
        let callback = callback.clone();
        let last_fired = last_fired.clone();
        Box::pin(async move {
            let mut last_fired = last_fired.lock().await;
            let now = std::time::Instant::now();
            let should_fire = match *last_fired {
                None => true,
                Some(last) => now.duration_since(last) >= interval,
            };
            if should_fire {
                *last_fired = Some(now);
                drop(last_fired);
                return callback(value).await;
            }
            None
        }) as BoxFuture<Option<Value>>
    })
}

fn difference_between(old: &Value, new: &Value) -> Option<Value> {
    match (old, new) {
        (Value::List(old), Value::List(new)) => {
            Some(Value::List(new.iter().filter(|v| !old.contains(v)).cloned().collect()))
        }
        _ => match (old.as_f64(), new.as_f64()) {
            (Some(old), Some(new)) => Some(Value::F64(new - old)),
            _ => None,
        },
    }
}

/// Emits the difference between the current and previous value rather than
/// the value itself: list difference for lists, arithmetic difference for
/// numerics.
pub fn delta(callback: Callback) -> Callback {
    let last = Arc::new(Mutex::new(None::<Value>));
    Arc::new(move |value| {
        let callback = callback.clone();
        let last = last.clone();
        Box::pin(async move {
            let mut last = last.lock().await;
            let result = match &*last {
                Some(previous) => difference_between(previous, &value),
                None => None,
            };
            *last = Some(value);
            drop(last);
            match result {
                Some(diff) => callback(diff).await,
                None => None,
            }
        }) as BoxFuture<Option<Value>>
    })
}

/// Sums numeric samples over a rolling window of `sample_size` values and
/// fires the wrapped callback with the running total once the window fills.
/// Non-numeric input is dropped rather than propagated.
pub fn aggregate(callback: Callback, sample_size: usize) -> Callback {
    let samples = Arc::new(Mutex::new(Vec::<f64>::with_capacity(sample_size)));
    Arc::new(move |value| {
        let callback = callback.clone();
        let samples = samples.clone();
        Box::pin(async move {
            let Some(sample) = value.as_f64() else { return None };
            let mut samples = samples.lock().await;
            samples.push(sample);
            if samples.len() < sample_size {
                return None;
            }
            let total: f64 = samples.drain(..).sum();
            drop(samples);
            callback(Value::F64(total)).await
        }) as BoxFuture<Option<Value>>
    })
}

/// Fires the wrapped callback only when `predicate(value)` holds.
pub fn custom(callback: Callback, predicate: Arc<dyn Fn(&Value) -> bool + Send + Sync>) -> Callback {
    Arc::new(move |value| {
        let callback = callback.clone();
        let predicate = predicate.clone();
        Box::pin(async move {
            if predicate(&value) {
                callback(value).await
            } else {
                None
            }
        }) as BoxFuture<Option<Value>>
    })
}

/// Clamps numeric values to `[min, max]` before forwarding.
pub fn clamp(callback: Callback, min: f64, max: f64) -> Callback {
    Arc::new(move |value| {
        let callback = callback.clone();
        Box::pin(async move {
            let clamped = match value.as_f64() {
                Some(v) => Value::F64(v.clamp(min, max)),
                None => value,
            };
            callback(clamped).await
        }) as BoxFuture<Option<Value>>
    })
}

/// Suppresses updates whose numeric value stays within `tolerance` of the
/// last value forwarded (as opposed to [`on_change`]'s fixed 0.1 tolerance).
pub fn deadband(callback: Callback, tolerance: f64) -> Callback {
    let last = Arc::new(Mutex::new(None::<f64>));
    Arc::new(move |value| {
        let callback = callback.clone();
        let last = last.clone();
        Box::pin(async move {
            let Some(sample) = value.as_f64() else { return callback(value).await };
            let mut last = last.lock().await;
            let should_fire = match *last {
                None => true,
                Some(previous) => (sample - previous).abs() > tolerance,
            };
            if should_fire {
                *last = Some(sample);
                drop(last);
                callback(value).await
            } else {
                None
            }
        }) as BoxFuture<Option<Value>>
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex as TokioMutex;

    fn recording_callback() -> (Callback, Arc<TokioMutex<Vec<Value>>>) {
        let seen = Arc::new(TokioMutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let callback: Callback = Arc::new(move |value| {
            let seen_cb = seen_cb.clone();
            Box::pin(async move {
                seen_cb.lock().await.push(value);
                None
            })
        });
        (callback, seen)
    }

    #[tokio::test]
    async fn on_change_suppresses_insignificant_changes() {
        let (inner, seen) = recording_callback();
        let filtered = on_change(inner);
        filtered(Value::F64(1.0)).await;
        filtered(Value::F64(1.01)).await;
        filtered(Value::F64(2.0)).await;
        assert_eq!(seen.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn debounce_waits_for_stable_value() {
        let (inner, seen) = recording_callback();
        let filtered = debounce(inner, 3);
        filtered(Value::F64(5.0)).await; // first value fires immediately
        filtered(Value::F64(6.0)).await;
        filtered(Value::F64(6.0)).await;
        filtered(Value::F64(6.0)).await; // third consecutive unchanged call fires
        assert_eq!(seen.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn aggregate_sums_over_window() {
        let (inner, seen) = recording_callback();
        let filtered = aggregate(inner, 3);
        filtered(Value::F64(1.0)).await;
        filtered(Value::F64(2.0)).await;
        filtered(Value::F64(3.0)).await;
        let seen = seen.lock().await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].as_f64().unwrap(), 6.0);
    }

    #[tokio::test]
    async fn clamp_bounds_numeric_values() {
        let (inner, seen) = recording_callback();
        let filtered = clamp(inner, 0.0, 10.0);
        filtered(Value::F64(15.0)).await;
        assert_eq!(seen.lock().await[0].as_f64().unwrap(), 10.0);
    }
}

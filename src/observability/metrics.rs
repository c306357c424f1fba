//! Dice metrics.
//!
//! # Metrics
//! - `dice.rolls` (counter, `{roll}`): number of rolls, labelled by `roll.value`
//!
//! Instruments are created from an explicitly passed [`Meter`], never from the
//! global meter provider.

use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::KeyValue;

/// Instrumentation scope name for everything the service records.
pub const SCOPE: &str = "rolldice";

/// Attribute key carrying the rolled value.
pub const ROLL_VALUE: &str = "roll.value";

/// Counters recorded by the dice handler.
#[derive(Debug, Clone)]
pub struct DiceMetrics {
    rolls: Counter<u64>,
}

impl DiceMetrics {
    pub fn new(meter: &Meter) -> Self {
        let rolls = meter
            .u64_counter("dice.rolls")
            .with_description("The number of rolls by roll value")
            .with_unit("{roll}")
            .build();
        Self { rolls }
    }

    /// Count one roll of `value`.
    pub fn record_roll(&self, value: u8) {
        self.rolls
            .add(1, &[KeyValue::new(ROLL_VALUE, i64::from(value))]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry::Value;
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    #[test]
    fn counts_rolls_per_value() {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let metrics = DiceMetrics::new(&provider.meter(SCOPE));

        metrics.record_roll(3);
        metrics.clone().record_roll(3);
        metrics.record_roll(5);
        provider.force_flush().unwrap();

        let exported = exporter.get_finished_metrics().unwrap();
        let metric = exported
            .iter()
            .flat_map(|rm| rm.scope_metrics())
            .filter(|sm| sm.scope().name() == SCOPE)
            .flat_map(|sm| sm.metrics())
            .find(|m| m.name() == "dice.rolls")
            .expect("dice.rolls was not exported");
        assert_eq!(metric.unit(), "{roll}");
        assert_eq!(metric.description(), "The number of rolls by roll value");

        let AggregatedMetrics::U64(MetricData::Sum(sum)) = metric.data() else {
            panic!("dice.rolls is not a u64 sum: {:?}", metric.data());
        };
        assert!(sum.is_monotonic());

        let mut counts: Vec<(i64, u64)> = sum
            .data_points()
            .map(|point| {
                let value = point
                    .attributes()
                    .find(|kv| kv.key.as_str() == ROLL_VALUE)
                    .map(|kv| kv.value.clone());
                match value {
                    Some(Value::I64(value)) => (value, point.value()),
                    other => panic!("unexpected roll.value {other:?}"),
                }
            })
            .collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![(3, 2), (5, 1)]);

        provider.shutdown().unwrap();
    }
}

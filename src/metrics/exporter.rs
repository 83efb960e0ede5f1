use std::sync::{Mutex, MutexGuard};

use super::collector::Collector;
use super::report::CycleReport;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("collector lock poisoned by an earlier panic")]
    Poisoned,
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}

/// Serializes scrapes over one [`Collector`].
///
/// Concurrent scrapes wait on the lock, so two cycles never interleave their
/// writes and every render sees the gauges of one complete or aborted cycle.
pub struct Exporter {
    collector: Mutex<Collector>,
}

impl Exporter {
    pub fn new(collector: Collector) -> Self {
        Exporter {
            collector: Mutex::new(collector),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collector>, ScrapeError> {
        self.collector.lock().map_err(|_| ScrapeError::Poisoned)
    }

    /// Collects, then renders. Blocks for the CPU sampling interval.
    ///
    /// A failed cycle is not an error here: the text carries whatever values
    /// the gauges hold.
    pub fn scrape(&self) -> Result<(CycleReport, String), ScrapeError> {
        let mut collector = self.lock()?;
        let report = collector.collect();
        let text = collector.registry().render()?;
        Ok((report, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CollectorSettings;
    use crate::platform::Posix;
    use crate::probe::fake::{ProbeCall, ScriptedProbe};
    use crate::probe::PartitionSample;
    use std::sync::Arc;
    use std::thread;

    fn exporter(probe: &ScriptedProbe) -> Exporter {
        let collector = Collector::new(
            Arc::new(Posix),
            Box::new(probe.clone()),
            CollectorSettings::default(),
        )
        .unwrap();
        Exporter::new(collector)
    }

    #[test]
    fn scrape_returns_fresh_values() {
        let probe = ScriptedProbe::new(1).with_partitions(vec![PartitionSample::new("/", 10, 1.0)]);
        let exporter = exporter(&probe);

        probe.set_cpu(vec![12.5], 12.5);
        let (report, text) = exporter.scrape().unwrap();

        assert!(report.is_success());
        assert!(text.contains("cpu_usage_0 12.5"));
        assert!(text.contains("total_cpu_usage 12.5"));
    }

    #[test]
    fn failed_cycle_still_renders() {
        let probe = ScriptedProbe::new(1);
        probe.fail(ProbeCall::Cpu);
        let exporter = exporter(&probe);

        let (report, text) = exporter.scrape().unwrap();

        assert!(report.completed.is_empty());
        assert!(text.contains("# TYPE cpu_core_count gauge"));
    }

    #[test]
    fn concurrent_scrapes_are_serialized() {
        let probe = ScriptedProbe::new(2);
        let exporter = Arc::new(exporter(&probe));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let exporter = exporter.clone();
                thread::spawn(move || exporter.scrape().map(|(report, _)| report.is_success()))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().unwrap());
        }
        assert_eq!(probe.cpu_intervals().len(), 4);
    }
}

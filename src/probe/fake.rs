//! Scripted probe used by tests in place of the live host.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{
    CpuSample, DiskIoSample, HostProbe, MemorySample, NetworkIoSample, PartitionSample,
    ProbeError,
};

/// The probe queries a script can make fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeCall {
    CoreCount,
    Cpu,
    Memory,
    Partitions,
    DiskIo,
    NetworkIo,
}

#[derive(Default)]
struct Script {
    cores: usize,
    cpu: CpuSample,
    memory: MemorySample,
    partitions: Vec<PartitionSample>,
    disk_io: DiskIoSample,
    network_io: NetworkIoSample,
    failing: HashSet<ProbeCall>,
    cpu_intervals: Vec<Duration>,
}

/// Returns canned readings. Clones share one script, so a test can keep a
/// handle and change readings after the probe has been handed to a
/// collector. CPU sampling records the interval instead of sleeping.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProbe {
    /// A host with `cores` idle cores and nothing else reported.
    pub fn new(cores: usize) -> Self {
        let probe = ScriptedProbe::default();
        {
            let mut script = probe.lock();
            script.cores = cores;
            script.cpu = CpuSample {
                per_core: vec![0.0; cores],
                total: 0.0,
            };
        }
        probe
    }

    pub fn with_partitions(self, partitions: Vec<PartitionSample>) -> Self {
        self.set_partitions(partitions);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the script from the others.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_cpu(&self, per_core: Vec<f64>, total: f64) {
        self.lock().cpu = CpuSample { per_core, total };
    }

    pub fn set_memory(&self, used_percent: f64, total_bytes: u64, swap_used_percent: f64) {
        self.lock().memory = MemorySample {
            used_percent,
            total_bytes,
            swap_used_percent,
        };
    }

    pub fn set_partitions(&self, partitions: Vec<PartitionSample>) {
        self.lock().partitions = partitions;
    }

    pub fn set_disk_io(&self, disk_io: DiskIoSample) {
        self.lock().disk_io = disk_io;
    }

    pub fn set_network_io(&self, network_io: NetworkIoSample) {
        self.lock().network_io = network_io;
    }

    /// Makes `call` fail until [`recover`](Self::recover) is called.
    pub fn fail(&self, call: ProbeCall) {
        self.lock().failing.insert(call);
    }

    pub fn recover(&self, call: ProbeCall) {
        self.lock().failing.remove(&call);
    }

    /// Intervals passed to every `cpu` call so far.
    pub fn cpu_intervals(&self) -> Vec<Duration> {
        self.lock().cpu_intervals.clone()
    }

    fn answer<T>(&self, call: ProbeCall, read: impl FnOnce(&Script) -> T) -> Result<T, ProbeError> {
        let script = self.lock();
        if script.failing.contains(&call) {
            return Err(ProbeError::Unavailable(format!("scripted {call:?}")));
        }
        Ok(read(&script))
    }
}

impl HostProbe for ScriptedProbe {
    fn core_count(&mut self) -> Result<usize, ProbeError> {
        self.answer(ProbeCall::CoreCount, |s| s.cores)
    }

    fn cpu(&mut self, interval: Duration) -> Result<CpuSample, ProbeError> {
        self.lock().cpu_intervals.push(interval);
        self.answer(ProbeCall::Cpu, |s| s.cpu.clone())
    }

    fn memory(&mut self) -> Result<MemorySample, ProbeError> {
        self.answer(ProbeCall::Memory, |s| s.memory.clone())
    }

    fn partitions(&mut self) -> Result<Vec<PartitionSample>, ProbeError> {
        self.answer(ProbeCall::Partitions, |s| s.partitions.clone())
    }

    fn disk_io(&mut self) -> Result<DiskIoSample, ProbeError> {
        self.answer(ProbeCall::DiskIo, |s| s.disk_io)
    }

    fn network_io(&mut self) -> Result<NetworkIoSample, ProbeError> {
        self.answer(ProbeCall::NetworkIo, |s| s.network_io)
    }
}

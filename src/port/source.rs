use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::Result;

/// Where fresh port numbers come from
pub trait PortSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn next_port(&self) -> Result<u16>;
}

/// Port range the test runner reserved for this job.
///
/// Runners hand every concurrent job a disjoint range, so pools drawing from
/// their own job's range never collide with other test processes on the
/// host. Running past `end` is fatal.
#[derive(Debug)]
pub struct JobPortRange {
    next: AtomicU32,
    end: u32,
}

impl JobPortRange {
    /// Ports `start..end`
    pub fn new(
        start: u16,
        end: u16,
    ) -> Self {
        Self {
            next: AtomicU32::new(start as u32),
            end: end as u32,
        }
    }
}

impl PortSource for JobPortRange {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn next_port(&self) -> Result<u16> {
        let port = self.next.fetch_add(1, Ordering::SeqCst);
        if port >= self.end {
            return Err(Error::Fatal(format!(
                "job port range exhausted at {}",
                self.end
            )));
        }
        u16::try_from(port).map_err(|_| Error::Fatal("job port range exhausted".into()))
    }
}

/// Monotonic counter starting at a fixed base
#[derive(Debug)]
pub struct SequentialPorts {
    next: AtomicU32,
}

impl SequentialPorts {
    pub fn new(base: u16) -> Self {
        Self {
            next: AtomicU32::new(base as u32),
        }
    }
}

impl PortSource for SequentialPorts {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn next_port(&self) -> Result<u16> {
        let port = self.next.fetch_add(1, Ordering::SeqCst);
        u16::try_from(port).map_err(|_| Error::Fatal("sequential port pool exhausted".into()))
    }
}

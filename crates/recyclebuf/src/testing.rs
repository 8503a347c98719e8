// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;

/// Formatted `tracing` events recorded on the current thread while running a closure.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<u8>>>);

impl EventLog {
    /// Runs `f` with a subscriber that records every event it emits on this thread.
    pub(crate) fn record(f: impl FnOnce()) -> Self {
        let log = Self::default();
        let writer = log.clone();

        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_writer(move || writer.clone())
                .with_ansi(false),
        );

        tracing::subscriber::with_default(subscriber, f);
        log
    }

    pub(crate) fn assert_contains(&self, expected: &str) {
        let output = String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned();

        assert!(output.contains(expected), "expected '{expected}' in event log:\n{output}");
    }
}

impl io::Write for EventLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#![allow(dead_code)]

pub mod recorder {
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Shared, ordered log of values observed by actions on any executor.
    #[derive(Clone, Default)]
    pub struct Recorder<T> {
        entries: Arc<Mutex<Vec<T>>>,
    }

    impl<T: Clone> Recorder<T> {
        pub fn new() -> Self {
            Self {
                entries: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn push(&self, value: T) {
            self.entries.lock().push(value);
        }

        pub fn snapshot(&self) -> Vec<T> {
            self.entries.lock().clone()
        }

        pub fn len(&self) -> usize {
            self.entries.lock().len()
        }
    }
}

pub mod responses {
    use cmdrouter::dispatcher::ResponseMessage;
    use may::sync::mpsc;
    use std::time::Duration;

    /// Collects responses delivered through dispatch callbacks.
    pub struct Responses {
        tx: mpsc::Sender<ResponseMessage>,
        rx: mpsc::Receiver<ResponseMessage>,
    }

    impl Responses {
        pub fn new() -> Self {
            let (tx, rx) = mpsc::channel();
            Self { tx, rx }
        }

        /// Reply callback feeding this collector.
        pub fn reply(&self) -> impl FnOnce(ResponseMessage) + Send + 'static {
            let tx = self.tx.clone();
            move |response| {
                tx.send(response).unwrap();
            }
        }

        /// Wait for `n` responses.
        pub fn take(&self, n: usize) -> Vec<ResponseMessage> {
            (0..n)
                .map(|_| self.rx.recv_timeout(Duration::from_secs(10)).unwrap())
                .collect()
        }
    }
}

pub mod config {
    use cmdrouter::affinity::{AffinityConfig, ExecutorMode};

    /// Joined-on-drop executors so tests do not leak threads.
    pub fn executors(count: usize, mode: ExecutorMode) -> AffinityConfig {
        AffinityConfig::new(count, "Test", false, 0x10000, mode)
    }
}

use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

pub struct Ticker {
    cancel: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn start<F>(interval: Duration, mut on_tick: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let interval = interval.max(Duration::from_millis(1));
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let join = thread::Builder::new()
            .name("ticker".to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + interval;
                loop {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    match cancel_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !on_tick() {
                                break;
                            }
                            deadline += interval;
                            let now = Instant::now();
                            while deadline <= now {
                                deadline += interval;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("ticker exited");
            })?;

        Ok(Self {
            cancel: Some(cancel_tx),
            join: Some(join),
        })
    }

    pub fn cancel(&mut self) {
        drop(self.cancel.take());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

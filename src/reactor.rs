//! Host reactor integration
//!
//! A single-threaded poll loop dispatching read readiness and a periodic
//! timer to one handler. The reactor holds the [`ReactorHandler`] capability
//! only for the duration of [`Reactor::run`]; registration and timer state
//! live in the reactor itself.

use crate::error::Result;
use log::trace;
use mio::event::Source;
use mio::{Events, Interest, Poll, Token};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Token under which the engine socket is registered
pub const ENGINE_TOKEN: Token = Token(0);

/// Maximum events drained per poll
const MAX_EVENTS: usize = 64;

/// Upper bound on one poll wait, so the stop flag is honored promptly
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Callbacks a reactor-driven service implements
///
/// Both are synchronous, non-reentrant calls on the reactor thread.
pub trait ReactorHandler {
    /// The registered I/O source became readable
    fn on_readable(&mut self);
    /// The periodic timer fired
    fn on_timeout(&mut self);
}

#[derive(Debug)]
struct PeriodicTimer {
    interval: Duration,
    deadline: Instant,
}

/// Single-handler poll loop
#[derive(Debug)]
pub struct Reactor {
    poll: Poll,
    events: Events,
    timer: Option<PeriodicTimer>,
    stop: Arc<AtomicBool>,
}

impl Reactor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(MAX_EVENTS),
            timer: None,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Register a source for read readiness under [`ENGINE_TOKEN`]
    pub fn register<S: Source + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        self.poll
            .registry()
            .register(source, ENGINE_TOKEN, Interest::READABLE)?;
        Ok(())
    }

    /// Remove a previously registered source
    pub fn deregister<S: Source + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        self.poll.registry().deregister(source)?;
        Ok(())
    }

    /// Arm the periodic timer; it re-arms itself after every firing
    pub fn schedule_timer(&mut self, interval: Duration) {
        self.timer = Some(PeriodicTimer {
            interval,
            deadline: Instant::now() + interval,
        });
    }

    pub fn cancel_timer(&mut self) {
        self.timer = None;
    }

    /// Flag that makes [`run`] return; shareable with signal handlers
    ///
    /// [`run`]: Reactor::run
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Drive the handler until the stop flag is set
    pub fn run(&mut self, handler: &mut dyn ReactorHandler) -> Result<()> {
        while !self.stop.load(Ordering::Relaxed) {
            let timeout = self
                .timer
                .as_ref()
                .map(|t| t.deadline.saturating_duration_since(Instant::now()))
                .map_or(DEFAULT_POLL_TIMEOUT, |until| until.min(DEFAULT_POLL_TIMEOUT));

            match self.poll.poll(&mut self.events, Some(timeout)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }

            for event in self.events.iter() {
                if event.token() == ENGINE_TOKEN && event.is_readable() {
                    handler.on_readable();
                }
            }

            if let Some(timer) = &mut self.timer
                && Instant::now() >= timer.deadline
            {
                trace!("periodic timer fired");
                timer.deadline = Instant::now() + timer.interval;
                handler.on_timeout();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHandler {
        readable: usize,
        timeouts: usize,
        stop: Arc<AtomicBool>,
    }

    impl ReactorHandler for CountingHandler {
        fn on_readable(&mut self) {
            self.readable += 1;
        }

        fn on_timeout(&mut self) {
            self.timeouts += 1;
            if self.timeouts >= 2 {
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn test_timer_fires_and_rearms() {
        let mut reactor = Reactor::new().unwrap();
        reactor.schedule_timer(Duration::from_millis(10));

        let mut handler = CountingHandler {
            readable: 0,
            timeouts: 0,
            stop: reactor.stop_handle(),
        };
        reactor.run(&mut handler).unwrap();

        assert_eq!(handler.timeouts, 2);
    }

    #[test]
    fn test_readiness_dispatch() {
        let mut reactor = Reactor::new().unwrap();
        let mut socket =
            mio::net::UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = socket.local_addr().unwrap();
        reactor.register(&mut socket).unwrap();

        let sender = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.send_to(b"ping", addr).unwrap();

        // records readiness and stops; the datagram stays queued
        struct ReadOnce {
            stop: Arc<AtomicBool>,
            readable: usize,
        }
        impl ReactorHandler for ReadOnce {
            fn on_readable(&mut self) {
                self.readable += 1;
                self.stop.store(true, Ordering::Relaxed);
            }
            fn on_timeout(&mut self) {}
        }

        let mut handler = ReadOnce {
            stop: reactor.stop_handle(),
            readable: 0,
        };
        reactor.run(&mut handler).unwrap();
        assert_eq!(handler.readable, 1);
    }
}

//! In-memory connections for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::TransportError;
use crate::transport::{Connection, Dialer, FrameSink, FrameSource};

/// What a mock write carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Text(String),
    Ping,
}

/// Write boundaries as observed by the mock connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteEvent {
    Begin(Write),
    End(Write),
    Closed,
}

pub type WriteLog = Arc<Mutex<Vec<WriteEvent>>>;

pub struct MockSink {
    log: WriteLog,
    delay: Duration,
    stall: bool,
    broken: bool,
}

impl MockSink {
    pub fn new() -> (Self, WriteLog) {
        let log = WriteLog::default();
        let sink = Self {
            log: log.clone(),
            delay: Duration::ZERO,
            stall: false,
            broken: false,
        };
        (sink, log)
    }

    /// Every write takes `delay` between its begin and end
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every write begins and never finishes
    pub fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }

    /// Every write begins and then fails
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    async fn write(&mut self, write: Write) -> Result<(), TransportError> {
        self.log.lock().unwrap().push(WriteEvent::Begin(write.clone()));
        if self.broken {
            return Err(TransportError::WebSocket("broken pipe".to_string()));
        }
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        self.log.lock().unwrap().push(WriteEvent::End(write));
        Ok(())
    }
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send_text(&mut self, frame: String) -> Result<(), TransportError> {
        self.write(Write::Text(frame)).await
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        self.write(Write::Ping).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.log.lock().unwrap().push(WriteEvent::Closed);
        Ok(())
    }
}

pub struct MockSource {
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
}

#[async_trait]
impl FrameSource for MockSource {
    async fn next_frame(&mut self) -> Result<Vec<u8>, TransportError> {
        self.rx.recv().await.unwrap_or(Err(TransportError::Closed))
    }
}

/// Test-side handle on a mock connection
pub struct MockLink {
    pub frames: mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>,
    pub log: WriteLog,
}

impl MockLink {
    pub fn push(&self, frame: impl Into<Vec<u8>>) {
        self.frames.send(Ok(frame.into())).unwrap();
    }

    pub fn fail(&self) {
        self.frames.send(Err(TransportError::Closed)).unwrap();
    }

    /// Completed text writes, in order
    pub fn texts(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                WriteEvent::End(Write::Text(t)) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

pub fn connection(sink: MockSink, log: WriteLog) -> (Connection, MockLink) {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = Connection {
        remote: "mock://relay".to_string(),
        sink: Box::new(sink),
        source: Box::new(MockSource { rx }),
    };
    (conn, MockLink { frames: tx, log })
}

pub fn mock_connection() -> (Connection, MockLink) {
    let (sink, log) = MockSink::new();
    connection(sink, log)
}

pub enum DialStep {
    Fail,
    Hang,
    Connect(Connection),
}

/// Replays a script of dial outcomes; hangs once the script runs out
#[derive(Default)]
pub struct MockDialer {
    script: Mutex<VecDeque<DialStep>>,
    attempts: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl MockDialer {
    pub fn new(steps: Vec<DialStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            attempts: Arc::default(),
        }
    }

    /// Shared view of (time, auth token) for every dial attempt
    pub fn attempts(&self) -> Arc<Mutex<Vec<(Instant, String)>>> {
        self.attempts.clone()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    async fn dial(&self, _url: &str, auth_token: &str) -> Result<Connection, TransportError> {
        self.attempts
            .lock()
            .unwrap()
            .push((Instant::now(), auth_token.to_string()));

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(DialStep::Connect(conn)) => Ok(conn),
            Some(DialStep::Fail) => Err(TransportError::Dial("connection refused".to_string())),
            Some(DialStep::Hang) | None => std::future::pending().await,
        }
    }
}

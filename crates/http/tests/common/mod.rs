//! A fake reactor connection and recording collaborators for driving a
//! [`ThrottlingServiceHandler`] from the test thread.
//!
//! The test thread plays the reactor: it calls the service handler callbacks the way
//! a reactor would on readiness, while worker tasks run on real threads.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use http::{HeaderMap, StatusCode, Version};
use micro_http_nio::codec::{ChunkedEncoder, ContentDecoder, ContentEncoder, IdentityEncoder, LengthDecoder, LengthEncoder};
use micro_http_nio::config::ServiceConfig;
use micro_http_nio::connection::{HttpSession, IoControl, ServerConnection};
use micro_http_nio::executor::{Executor, Task};
use micro_http_nio::listener::EventListener;
use micro_http_nio::protocol::{ExchangeError, HttpError, PayloadSize, RequestHeader, ResponseHead};
use micro_http_nio::service::{ServiceHandler, ThrottlingServiceHandler, ThrottlingServiceHandlerBuilder};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::DEBUG).try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RequestInput,
    SuspendInput,
    RequestOutput,
    SuspendOutput,
    Shutdown,
    Close,
    Submit(StatusCode),
    Execute,
}

/// Ordered record of what the connection and the executor were asked to do.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
    condition: Condvar,
}

impl EventLog {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
        self.condition.notify_all();
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == event)
    }

    /// Waits until `predicate` holds for the recorded events.
    pub fn wait_until(&self, predicate: impl Fn(&[Event]) -> bool) {
        let events = self.events.lock().unwrap();
        let (events, result) = self.condition.wait_timeout_while(events, TIMEOUT, |events| !predicate(events)).unwrap();
        assert!(!result.timed_out(), "timed out waiting for connection events, got {:?}", *events);
    }
}

#[derive(Debug, Clone)]
pub struct SubmittedResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub payload_size: PayloadSize,
}

#[derive(Debug)]
pub struct FakeConnection {
    log: Arc<EventLog>,
    responses: Mutex<Vec<SubmittedResponse>>,
    fail_submit: AtomicBool,
    remote: SocketAddr,
}

impl FakeConnection {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self { log, responses: Mutex::new(vec![]), fail_submit: AtomicBool::new(false), remote: SocketAddr::from(([127, 0, 0, 1], 40000)) }
    }

    /// Makes every later `submit_response` fail.
    pub fn fail_submit(&self) {
        self.fail_submit.store(true, Ordering::SeqCst);
    }

    pub fn responses(&self) -> Vec<SubmittedResponse> {
        self.responses.lock().unwrap().clone()
    }

    /// Waits for the `n`th (1-based) submitted response head.
    pub fn wait_for_response(&self, n: usize) -> SubmittedResponse {
        self.log.wait_until(|events| events.iter().filter(|e| matches!(e, Event::Submit(_))).count() >= n);
        self.responses.lock().unwrap()[n - 1].clone()
    }
}

impl IoControl for FakeConnection {
    fn request_input(&self) {
        self.log.push(Event::RequestInput);
    }

    fn suspend_input(&self) {
        self.log.push(Event::SuspendInput);
    }

    fn request_output(&self) {
        self.log.push(Event::RequestOutput);
    }

    fn suspend_output(&self) {
        self.log.push(Event::SuspendOutput);
    }

    fn shutdown(&self) -> io::Result<()> {
        self.log.push(Event::Shutdown);
        Ok(())
    }
}

impl ServerConnection for FakeConnection {
    fn submit_response(&self, head: ResponseHead, payload_size: PayloadSize) -> Result<(), ExchangeError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(HttpError::protocol("response submission rejected").into());
        }

        self.responses.lock().unwrap().push(SubmittedResponse {
            status: head.status(),
            version: head.version(),
            headers: head.headers().clone(),
            payload_size,
        });
        self.log.push(Event::Submit(head.status()));
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        self.log.push(Event::Close);
        Ok(())
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        Some(self.remote)
    }
}

/// Runs every task on its own thread and keeps the handles for joining.
#[derive(Debug)]
pub struct TrackingExecutor {
    log: Arc<EventLog>,
    reject: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TrackingExecutor {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self { log, reject: AtomicBool::new(false), handles: Mutex::new(vec![]) }
    }

    pub fn reject_tasks(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn submitted(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    /// Waits for every task submitted so far.
    pub fn join_all(&self) {
        let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}

impl Executor for TrackingExecutor {
    fn execute(&self, task: Task) -> io::Result<()> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(io::Error::other("executor is shut down"));
        }
        self.log.push(Event::Execute);
        let handle = thread::Builder::new().name("test-worker".into()).spawn(task)?;
        self.handles.lock().unwrap().push(handle);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Open(Option<SocketAddr>),
    Closed(Option<SocketAddr>),
    Timeout(Option<SocketAddr>),
    FatalIo(io::ErrorKind),
    FatalProtocol(String),
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingListener {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn fatal(&self) -> Vec<Notification> {
        self.notifications().into_iter().filter(|n| matches!(n, Notification::FatalIo(_) | Notification::FatalProtocol(_))).collect()
    }

    fn push(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

impl EventListener for RecordingListener {
    fn connection_open(&self, remote: Option<SocketAddr>) {
        self.push(Notification::Open(remote));
    }

    fn connection_closed(&self, remote: Option<SocketAddr>) {
        self.push(Notification::Closed(remote));
    }

    fn connection_timeout(&self, remote: Option<SocketAddr>) {
        self.push(Notification::Timeout(remote));
    }

    fn fatal_io_exception(&self, error: &io::Error) {
        self.push(Notification::FatalIo(error.kind()));
    }

    fn fatal_protocol_exception(&self, error: &HttpError) {
        self.push(Notification::FatalProtocol(error.to_string()));
    }
}

/// Non-blocking source handing out at most `step` bytes per read, every other read
/// would block.
#[derive(Debug)]
pub struct Trickle {
    data: Vec<u8>,
    pos: usize,
    step: usize,
    stalled: bool,
}

impl Trickle {
    pub fn new(data: &[u8], step: usize) -> Self {
        Self { data: data.to_vec(), pos: 0, step: step.max(1), stalled: false }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.stalled {
            self.stalled = false;
            return Err(io::ErrorKind::WouldBlock.into());
        }
        self.stalled = true;

        let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Non-blocking sink accepting at most `step` bytes per write, every other write
/// would block.
#[derive(Debug, Default)]
pub struct Throttle {
    pub written: Vec<u8>,
    step: usize,
    stalled: bool,
}

impl Throttle {
    pub fn new(step: usize) -> Self {
        Self { written: vec![], step: step.max(1), stalled: false }
    }
}

impl Write for Throttle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.stalled {
            self.stalled = false;
            return Err(io::ErrorKind::WouldBlock.into());
        }
        self.stalled = true;

        let n = self.step.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Wire encoder picked from the payload size of a submitted response.
#[derive(Debug)]
pub enum WireEncoder {
    Length(LengthEncoder<Throttle>),
    Chunked(ChunkedEncoder<Throttle>),
    Identity(IdentityEncoder<Throttle>),
}

impl WireEncoder {
    pub fn for_payload(payload_size: PayloadSize, step: usize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => WireEncoder::Length(LengthEncoder::new(Throttle::new(step), length)),
            PayloadSize::Chunked => WireEncoder::Chunked(ChunkedEncoder::new(Throttle::new(step))),
            PayloadSize::UntilClose => WireEncoder::Identity(IdentityEncoder::new(Throttle::new(step))),
            PayloadSize::Empty => WireEncoder::Length(LengthEncoder::new(Throttle::new(step), 0)),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            WireEncoder::Length(encoder) => encoder.into_inner().written,
            WireEncoder::Chunked(encoder) => encoder.into_inner().written,
            WireEncoder::Identity(encoder) => encoder.into_inner().written,
        }
    }
}

impl ContentEncoder for WireEncoder {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        match self {
            WireEncoder::Length(encoder) => encoder.write(src),
            WireEncoder::Chunked(encoder) => encoder.write(src),
            WireEncoder::Identity(encoder) => encoder.write(src),
        }
    }

    fn complete(&mut self) -> io::Result<()> {
        match self {
            WireEncoder::Length(encoder) => encoder.complete(),
            WireEncoder::Chunked(encoder) => encoder.complete(),
            WireEncoder::Identity(encoder) => encoder.complete(),
        }
    }

    fn is_completed(&self) -> bool {
        match self {
            WireEncoder::Length(encoder) => encoder.is_completed(),
            WireEncoder::Chunked(encoder) => encoder.is_completed(),
            WireEncoder::Identity(encoder) => encoder.is_completed(),
        }
    }
}

/// Parses a raw request head.
pub fn parse_head(raw: &str) -> RequestHeader {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut request = httparse::Request::new(&mut headers);
    let status = request.parse(raw.as_bytes()).unwrap();
    assert!(status.is_complete(), "incomplete request head");
    RequestHeader::try_from(request).unwrap()
}

/// A service handler and one connection, driven from the test thread.
pub struct Harness {
    pub log: Arc<EventLog>,
    pub conn: Arc<FakeConnection>,
    pub executor: Arc<TrackingExecutor>,
    pub listener: Arc<RecordingListener>,
    pub service: ThrottlingServiceHandler,
    pub session: HttpSession<FakeConnection>,
}

impl Harness {
    pub fn new(buffer_size: isize, configure: impl FnOnce(ThrottlingServiceHandlerBuilder) -> ThrottlingServiceHandlerBuilder) -> Self {
        init_tracing();

        let log = Arc::new(EventLog::default());
        let executor = Arc::new(TrackingExecutor::new(Arc::clone(&log)));
        let listener = Arc::new(RecordingListener::default());

        let builder = ThrottlingServiceHandler::builder()
            .executor(Arc::clone(&executor))
            .listener(Arc::clone(&listener))
            .config(ServiceConfig::new().with_content_buffer_size(buffer_size));
        let service = configure(builder).build().unwrap();

        let conn = Arc::new(FakeConnection::new(Arc::clone(&log)));
        let session = service.connected(Arc::clone(&conn));

        Self { log, conn, executor, listener, service, session }
    }

    pub fn request(&mut self, raw_head: &str) {
        self.service.request_received(&mut self.session, parse_head(raw_head));
    }

    /// Feeds `body` through the input callbacks, `step` bytes at most per read.
    pub fn feed_body(&mut self, body: &[u8], step: usize) {
        let mut decoder = LengthDecoder::new(Trickle::new(body, step), body.len() as u64);
        let deadline = Instant::now() + TIMEOUT;

        while !decoder.is_completed() && !self.session.input_buffer().is_shutdown() {
            assert!(self.session.input_buffer().available() <= self.session.input_buffer().capacity());
            self.service.input_ready(&mut self.session, &mut decoder);
            assert!(Instant::now() < deadline, "timed out feeding the request body");
            thread::yield_now();
        }
    }

    /// Feeds `part` of a body declared `declared` bytes long. The body stays
    /// incomplete, so a reader waits for the rest once it consumed `part`.
    pub fn feed_partial(&mut self, part: &[u8], declared: u64, step: usize) {
        assert!((part.len() as u64) < declared);
        let mut decoder = LengthDecoder::new(Trickle::new(part, step), declared);
        let target = declared - part.len() as u64;
        let deadline = Instant::now() + TIMEOUT;

        while decoder.remaining() > target && !self.session.input_buffer().is_shutdown() {
            self.service.input_ready(&mut self.session, &mut decoder);
            assert!(Instant::now() < deadline, "timed out feeding the request body");
            thread::yield_now();
        }
    }

    /// Waits for the `n`th response head and pumps its body through the output
    /// callbacks, `step` bytes at most per write.
    pub fn collect_response(&mut self, n: usize, step: usize) -> (SubmittedResponse, Vec<u8>) {
        let response = self.conn.wait_for_response(n);
        let mut encoder = WireEncoder::for_payload(response.payload_size, step);
        let deadline = Instant::now() + TIMEOUT;

        while !encoder.is_completed() {
            assert!(self.session.output_buffer().available() <= self.session.output_buffer().capacity());
            self.service.output_ready(&mut self.session, &mut encoder);
            assert!(Instant::now() < deadline, "timed out pumping the response body");
            thread::yield_now();
        }

        (response, encoder.into_bytes())
    }
}

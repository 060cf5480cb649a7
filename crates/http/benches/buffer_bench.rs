use std::hint::black_box;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use http::{Request, Response};
use micro_http_nio::buffer::{SharedInputBuffer, SharedOutputBuffer};
use micro_http_nio::codec::{ContentDecoder, ContentEncoder, LengthDecoder, LengthEncoder};
use micro_http_nio::connection::{IoControl, ServerConnection};
use micro_http_nio::executor::{Executor, Task};
use micro_http_nio::handler::{UriHandlerResolver, make_handler};
use micro_http_nio::protocol::body::ContentBody;
use micro_http_nio::protocol::{ExchangeError, PayloadSize, RequestHeader, ResponseHead};
use micro_http_nio::service::{ServiceHandler, ThrottlingServiceHandler};

const BODY_SIZE: usize = 1 << 20;

// Connection that ignores every control request
#[derive(Debug)]
struct NoopConnection;

impl IoControl for NoopConnection {
    fn request_input(&self) {}

    fn suspend_input(&self) {}

    fn request_output(&self) {}

    fn suspend_output(&self) {}

    fn shutdown(&self) -> io::Result<()> {
        Ok(())
    }
}

impl ServerConnection for NoopConnection {
    fn submit_response(&self, _head: ResponseHead, _payload_size: PayloadSize) -> Result<(), ExchangeError> {
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }
}

// Runs tasks on the calling thread
#[derive(Debug)]
struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) -> io::Result<()> {
        task();
        Ok(())
    }
}

fn bench_input_buffer(c: &mut Criterion) {
    let body = vec![b'x'; BODY_SIZE];
    let mut group = c.benchmark_group("input_buffer");
    group.throughput(Throughput::Bytes(BODY_SIZE as u64));

    for capacity in [1024, 8192, 20480] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let buffer = Arc::new(SharedInputBuffer::new(capacity, Arc::new(NoopConnection)));
                let reactor_buffer = Arc::clone(&buffer);
                let content = body.clone();

                let reactor = thread::spawn(move || {
                    let mut decoder = LengthDecoder::new(&content[..], content.len() as u64);
                    while !decoder.is_completed() {
                        reactor_buffer.consume_content(&mut decoder).unwrap();
                        thread::yield_now();
                    }
                });

                let mut chunk = vec![0; 4096];
                let mut total = 0;
                loop {
                    match buffer.read(&mut chunk).unwrap() {
                        0 => break,
                        n => total += n,
                    }
                }
                reactor.join().unwrap();
                black_box(total)
            });
        });
    }
    group.finish();
}

fn bench_output_buffer(c: &mut Criterion) {
    let body = vec![b'x'; BODY_SIZE];
    let mut group = c.benchmark_group("output_buffer");
    group.throughput(Throughput::Bytes(BODY_SIZE as u64));

    for capacity in [1024, 8192, 20480] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let buffer = Arc::new(SharedOutputBuffer::new(capacity, Arc::new(NoopConnection)));
                let worker_buffer = Arc::clone(&buffer);
                let content = body.clone();

                let worker = thread::spawn(move || {
                    for chunk in content.chunks(4096) {
                        worker_buffer.write(chunk).unwrap();
                    }
                    worker_buffer.write_completed().unwrap();
                });

                let mut encoder = LengthEncoder::new(io::sink(), BODY_SIZE as u64);
                while !encoder.is_completed() {
                    buffer.produce_content(&mut encoder).unwrap();
                    thread::yield_now();
                }
                worker.join().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_exchange(c: &mut Criterion) {
    let hello = make_handler(|_req: Request<ContentBody>| Response::builder().body("Hello World!"));
    let resolver = UriHandlerResolver::new().with("/", hello).unwrap();
    let service = ThrottlingServiceHandler::builder().executor(InlineExecutor).resolver(resolver).build().unwrap();
    let mut session = service.connected(Arc::new(NoopConnection));

    c.bench_function("process_simple_request", |b| {
        b.iter(|| {
            let request = RequestHeader::from(Request::builder().uri("/").body(()).unwrap());
            service.request_received(&mut session, request);

            let mut encoder = LengthEncoder::new(io::sink(), 12);
            while !encoder.is_completed() {
                service.output_ready(&mut session, &mut encoder);
            }
            black_box(session.state())
        });
    });
}

criterion_group!(benches, bench_input_buffer, bench_output_buffer, bench_exchange);
criterion_main!(benches);


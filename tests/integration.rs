//! Integration tests for pingwire.
//!
//! These tests verify the integration between the codec, the dispatcher,
//! and the HTTP server and client over real TCP.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use pingwire::codec::TextCodec;
use pingwire::protocol::{build_frame, flags, parse_trailers, FrameBuffer, ENVELOPE_SIZE};
use pingwire::service::{echo_handler, handler_fn, CallEvent, Dispatcher, METHOD_PATH};
use pingwire::{Code, DecodeError, EchoClient, PingwireError, Server, Status, TransportError};

async fn start_server() -> Server {
    Server::builder().bind("127.0.0.1:0").start().await.unwrap()
}

fn endpoint(server: &Server) -> String {
    format!("http://{}", server.local_addr())
}

/// Send a hand-written HTTP/1.1 request and return the raw response text.
async fn raw_request(server: &Server, request: &str) -> String {
    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).to_ascii_lowercase()
}

/// Client encodes, server decodes, handler echoes, server encodes, client decodes.
#[tokio::test]
async fn test_end_to_end_in_memory() {
    let dispatcher = Dispatcher::new(echo_handler());

    let request = TextCodec::encode_framed("Hello, Server!");
    let server_side = TextCodec::decode(&request, true).unwrap();
    assert_eq!(server_side, "Hello, Server!");

    let response = dispatcher.dispatch(METHOD_PATH, &request).await;

    let frames = FrameBuffer::new().push(&response).unwrap();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].is_data());
    assert!(frames[1].is_trailers());

    assert_eq!(
        TextCodec::decode(frames[0].payload(), false).unwrap(),
        "Hello, Server!"
    );
    assert!(parse_trailers(frames[1].payload()).is_ok());
}

/// Response body split into tiny chunks still yields both frames.
#[tokio::test]
async fn test_response_body_in_fragments() {
    let dispatcher = Dispatcher::new(echo_handler());
    let text = "x".repeat(300);
    let response = dispatcher
        .dispatch(METHOD_PATH, &TextCodec::encode_framed(&text))
        .await;

    let mut buffer = FrameBuffer::new();
    let mut frames = Vec::new();
    for chunk in response.chunks(7) {
        frames.extend(buffer.push(chunk).unwrap());
    }

    assert_eq!(frames.len(), 2);
    assert_eq!(TextCodec::decode(frames[0].payload(), false).unwrap(), text);
    assert!(buffer.is_idle());
}

#[test]
fn test_long_message_wire_layout() {
    let text = "A".repeat(1000);
    let framed = TextCodec::encode_framed(&text);

    // envelope: uncompressed, 1003 bytes = tag + 2-byte varint + payload
    assert_eq!(&framed[..ENVELOPE_SIZE], &[0x00, 0x00, 0x00, 0x03, 0xEB]);
    assert_eq!(&framed[ENVELOPE_SIZE..ENVELOPE_SIZE + 3], &[0x0A, 0xE8, 0x07]);
    assert_eq!(framed.len(), ENVELOPE_SIZE + 3 + 1000);

    assert_eq!(TextCodec::decode(&framed, true).unwrap(), text);
}

#[test]
fn test_hand_built_frame_decodes() {
    let mut message = vec![0x0A, 0x05];
    message.extend_from_slice(b"hello");
    let frame = build_frame(flags::NONE, &message);

    assert_eq!(TextCodec::decode(&frame, true).unwrap(), "hello");
}

#[test]
fn test_decode_errors() {
    let framed = TextCodec::encode_framed("hello");

    assert_eq!(
        TextCodec::decode(&framed[..framed.len() - 2], true),
        Err(DecodeError::Truncated)
    );

    let mut wrong_tag = framed.to_vec();
    wrong_tag[ENVELOPE_SIZE] = 0x0B;
    assert_eq!(
        TextCodec::decode(&wrong_tag, true),
        Err(DecodeError::UnsupportedTag(0x0B))
    );
}

#[tokio::test]
async fn test_server_and_client_round_trip() {
    let server = start_server().await;
    let client = EchoClient::new(&endpoint(&server)).unwrap();

    assert_eq!(client.ping("Hello, Server!").await.unwrap(), "Hello, Server!");

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_and_client_assorted_messages() {
    let server = start_server().await;
    let client = EchoClient::new(&endpoint(&server)).unwrap();

    let long = "A".repeat(1000);
    for message in ["", "Hello, gRPC World!", "Hello 世界! 🌍 @#$%^&*()", long.as_str()] {
        assert_eq!(client.ping(message).await.unwrap(), message);
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_observer_logs_each_call() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let server = Server::builder()
        .bind("127.0.0.1:0")
        .observer(move |event: &CallEvent<'_>| {
            if let CallEvent::Request { message, .. } = event {
                sink.lock().unwrap().push(message.to_string());
            }
        })
        .start()
        .await
        .unwrap();
    let client = EchoClient::new(&endpoint(&server)).unwrap();

    client.ping("one").await.unwrap();
    client.ping("two").await.unwrap();

    assert_eq!(seen.lock().unwrap().as_slice(), ["one", "two"]);
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_custom_handler_over_http() {
    let server = Server::builder()
        .bind("127.0.0.1:0")
        .handler(handler_fn(|message: String| async move {
            Ok(message.to_uppercase())
        }))
        .start()
        .await
        .unwrap();
    let client = EchoClient::new(&endpoint(&server)).unwrap();

    assert_eq!(client.ping("shout").await.unwrap(), "SHOUT");
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_handler_error_surfaces_as_rpc_error() {
    let server = Server::builder()
        .bind("127.0.0.1:0")
        .handler(handler_fn(|_message: String| async {
            Err(Status::internal("handler failed"))
        }))
        .start()
        .await
        .unwrap();
    let client = EchoClient::new(&endpoint(&server)).unwrap();

    match client.ping("hi").await {
        Err(PingwireError::Rpc(status)) => {
            assert_eq!(status.code(), Code::Internal);
            assert_eq!(status.message(), "handler failed");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_method_is_unimplemented() {
    let server = start_server().await;
    let client = EchoClient::new(&endpoint(&server))
        .unwrap()
        .with_method_path("/ping.PingService/Missing");

    match client.ping("hi").await {
        Err(PingwireError::Rpc(status)) => assert_eq!(status.code(), Code::Unimplemented),
        other => panic!("unexpected result: {:?}", other),
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_oversized_request_is_http_error() {
    let server = Server::builder()
        .bind("127.0.0.1:0")
        .max_message_size(16)
        .start()
        .await
        .unwrap();
    let client = EchoClient::new(&endpoint(&server)).unwrap();

    let err = client.ping(&"x".repeat(64)).await.unwrap_err();
    assert!(matches!(
        err,
        PingwireError::Transport(TransportError::Status(413))
    ));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_requests_after_shutdown_fail() {
    let server = start_server().await;
    let client = EchoClient::new(&endpoint(&server)).unwrap();
    server.shutdown().await.unwrap();

    let err = client.ping("late").await.unwrap_err();
    assert!(matches!(err, PingwireError::Transport(_)));
}

#[tokio::test]
async fn test_http_get_is_method_not_allowed() {
    let server = start_server().await;

    let response = raw_request(
        &server,
        "GET /ping.PingService/Ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("http/1.1 405"), "{}", response);
    assert!(response.contains("access-control-allow-origin: *"));
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_http_wrong_content_type_is_unsupported() {
    let server = start_server().await;

    for content_type in ["application/json", "application/grpc-web-text"] {
        let request = format!(
            "POST /ping.PingService/Ping HTTP/1.1\r\nHost: localhost\r\n\
             Content-Type: {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}",
            content_type
        );
        let response = raw_request(&server, &request).await;

        assert!(response.starts_with("http/1.1 415"), "{}", response);
        assert!(response.contains("access-control-allow-origin: *"));
    }

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_http_preflight() {
    let server = start_server().await;

    let response = raw_request(
        &server,
        "OPTIONS /ping.PingService/Ping HTTP/1.1\r\nHost: localhost\r\n\
         Origin: http://localhost:3000\r\nAccess-Control-Request-Method: POST\r\n\
         Connection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("http/1.1 204"), "{}", response);
    assert!(response.contains("access-control-allow-origin: *"));
    assert!(response.contains("access-control-allow-methods: post, options"));
    assert!(response.contains("access-control-allow-headers:"));
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_http_post_carries_grpc_web_headers() {
    let server = start_server().await;
    let body = TextCodec::encode_framed("hi");

    let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
    let head = format!(
        "POST /ping.PingService/Ping HTTP/1.1\r\nHost: localhost\r\n\
         Content-Type: application/grpc-web+proto\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    stream.write_all(&body).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let text = String::from_utf8_lossy(&response).to_ascii_lowercase();

    assert!(text.starts_with("http/1.1 200"), "{}", text);
    assert!(text.contains("content-type: application/grpc-web+proto"));
    assert!(text.contains("access-control-allow-origin: *"));
    assert!(text.contains("access-control-expose-headers: grpc-status,grpc-message"));
    server.shutdown().await.unwrap();
}

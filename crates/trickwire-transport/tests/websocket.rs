//! Loopback tests for the WebSocket links.
//!
//! Each test spins up a minimal in-process WebSocket server playing the
//! backend's part, then drives a client link against it.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use trickwire_transport::{
    ControlLink, EventLink, Frame, LinkSecurity, WsControlLink, WsEventLink,
};

fn frame(parts: &[&str]) -> Frame {
    parts.iter().map(|p| p.to_string()).collect()
}

fn text(frame: &Frame) -> Message {
    Message::Text(serde_json::to_string(frame).unwrap().into())
}

/// Polls `try_recv` until a frame arrives or the deadline passes.
async fn recv_eventually<F>(mut try_recv: F) -> Frame
where
    F: FnMut() -> Option<Frame>,
{
    for _ in 0..200 {
        if let Some(frame) = try_recv() {
            return frame;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("no frame arrived within the deadline");
}

#[tokio::test]
async fn test_control_link_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        // Expect the hello command, then reply to it.
        let msg = ws.next().await.unwrap().unwrap();
        let sent: Frame =
            serde_json::from_str(msg.to_text().unwrap()).unwrap();
        assert_eq!(sent[0], "bridgehlo");

        ws.send(text(&frame(&["success", "bridgehlo"]))).await.unwrap();
    });

    let mut link = WsControlLink::connect(
        &format!("ws://{addr}"),
        &LinkSecurity::default(),
    )
    .await
    .unwrap();

    link.send(frame(&["bridgehlo", "version", "\"0.1\"", "role", "\"client\""]))
        .unwrap();

    let reply = recv_eventually(|| link.try_recv().unwrap()).await;
    assert_eq!(reply, frame(&["success", "bridgehlo"]));

    server.await.unwrap();
}

#[tokio::test]
async fn test_event_link_subscribes_and_filters() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        // Expect the subscribe frame before any events flow.
        let msg = ws.next().await.unwrap().unwrap();
        let sub: Frame =
            serde_json::from_str(msg.to_text().unwrap()).unwrap();
        assert_eq!(sub, frame(&["subscribe", "g1"]));

        // One event for another game, one for ours.
        ws.send(text(&frame(&["g2:turn", "position", "\"east\""])))
            .await
            .unwrap();
        ws.send(text(&frame(&["g1:turn", "position", "\"north\""])))
            .await
            .unwrap();
    });

    let mut link = WsEventLink::connect(
        &format!("ws://{addr}"),
        &LinkSecurity::default(),
    )
    .await
    .unwrap();
    link.subscribe("g1").unwrap();

    let event = recv_eventually(|| link.try_recv().unwrap()).await;
    assert_eq!(event[0], "g1:turn");

    server.await.unwrap();
}

#[tokio::test]
async fn test_closed_socket_surfaces_as_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        drop(ws); // immediate hang-up
    });

    let mut link = WsControlLink::connect(
        &format!("ws://{addr}"),
        &LinkSecurity::default(),
    )
    .await
    .unwrap();

    // The reader task notices the hang-up shortly; poll until it does.
    for _ in 0..200 {
        match link.try_recv() {
            Err(trickwire_transport::TransportError::Closed) => return,
            Ok(None) => {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
    panic!("link never reported closed");
}

//! WebSocket bridging between a client, the proxy and an origin.

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::{
    proxy_config, start_proxy, start_ws_dropping_origin, start_ws_echo_origin,
    start_ws_observed_origin,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Next text or binary message, skipping control frames.
async fn next_data(client: &mut Client) -> Message {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("read error");
        if msg.is_text() || msg.is_binary() {
            return msg;
        }
    }
}

/// True once the connection is closed or errors, false if data arrives first.
async fn wait_for_close(client: &mut Client) -> bool {
    let outcome = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return true,
                Some(Ok(msg)) if msg.is_text() || msg.is_binary() => return false,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    outcome.unwrap_or(false)
}

#[tokio::test]
async fn test_messages_relayed_in_order_with_types() {
    let origin = start_ws_echo_origin().await;
    let (proxy, shutdown) = start_proxy(proxy_config(origin)).await;

    let (mut client, _) = connect_async(format!("ws://{}/chat?room=1", proxy))
        .await
        .unwrap();

    // The origin reports the URI it was dialed with.
    assert_eq!(next_data(&mut client).await, Message::Text("/chat?room=1".into()));

    let sent = vec![
        Message::Text("first".into()),
        Message::Binary(vec![0u8, 1, 2, 255].into()),
        Message::Text("third".into()),
        Message::Binary(vec![42u8; 1024].into()),
    ];
    for msg in &sent {
        client.send(msg.clone()).await.unwrap();
    }

    for expected in sent {
        assert_eq!(next_data(&mut client).await, expected);
    }

    client.close(None).await.unwrap();
    shutdown.trigger();
}

#[tokio::test]
async fn test_origin_drop_closes_client() {
    let origin = start_ws_dropping_origin().await;
    let (proxy, shutdown) = start_proxy(proxy_config(origin)).await;

    let (mut client, _) = connect_async(format!("ws://{}/socket", proxy))
        .await
        .unwrap();
    client.send(Message::Text("hello".into())).await.unwrap();

    assert!(wait_for_close(&mut client).await);

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_drop_closes_origin() {
    let (origin, mut origin_ended) = start_ws_observed_origin().await;
    let (proxy, shutdown) = start_proxy(proxy_config(origin)).await;

    let (mut client, _) = connect_async(format!("ws://{}/socket", proxy))
        .await
        .unwrap();
    client.send(Message::Text("ping me".into())).await.unwrap();
    assert_eq!(next_data(&mut client).await, Message::Text("ping me".into()));

    // No close handshake: the TCP connection just goes away.
    drop(client);

    let ended = tokio::time::timeout(Duration::from_secs(5), origin_ended.recv()).await;
    assert!(matches!(ended, Ok(Some(()))));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_origin_closes_client() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = listener.local_addr().unwrap();
    drop(listener);

    let (proxy, shutdown) = start_proxy(proxy_config(origin)).await;

    let (mut client, _) = connect_async(format!("ws://{}/socket", proxy))
        .await
        .unwrap();

    assert!(wait_for_close(&mut client).await);

    shutdown.trigger();
}

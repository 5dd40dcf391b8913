use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use cadence::playback::{Liquidsoap, PlaybackEngine, PlaybackError};

/// One-connection telnet fake: records the command line and answers with
/// `reply` followed by END.
async fn fake_server(reply: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        let command = lines.next_line().await.unwrap().unwrap();
        write
            .write_all(format!("{reply}\r\nEND\r\n").as_bytes())
            .await
            .unwrap();
        // Client closes with quit.
        let quit = lines.next_line().await.unwrap();
        assert_eq!(quit.as_deref(), Some("quit"));
        command
    });
    (addr, handle)
}

fn engine(addr: String) -> Liquidsoap {
    Liquidsoap::new(addr, "request", "cadence1", Duration::from_secs(2))
}

#[tokio::test]
async fn submit_pushes_to_the_request_queue() {
    let (addr, server) = fake_server("17").await;
    engine(addr)
        .submit(Path::new("/music/Only My Railgun.flac"))
        .await
        .unwrap();
    assert_eq!(server.await.unwrap(), "request.push /music/Only My Railgun.flac");
}

#[tokio::test]
async fn skip_targets_the_output() {
    let (addr, server) = fake_server("Done").await;
    engine(addr).skip().await.unwrap();
    assert_eq!(server.await.unwrap(), "cadence1.skip");
}

#[tokio::test]
async fn error_reply_is_a_rejection() {
    let (addr, server) = fake_server("ERROR: queue is full").await;
    let result = engine(addr).submit(Path::new("/music/a.flac")).await;
    assert!(matches!(result, Err(PlaybackError::Rejected(msg)) if msg.contains("queue is full")));
    server.await.unwrap();
}

#[tokio::test]
async fn path_with_newline_is_never_sent() {
    // Nothing listens here; a connection attempt would fail with Io instead.
    let result = engine("127.0.0.1:9".to_string())
        .submit(Path::new("/music/a.flac\nrequest.skip"))
        .await;
    assert!(matches!(result, Err(PlaybackError::Rejected(_))));
}

#[tokio::test]
async fn silent_engine_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let _held = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let engine = Liquidsoap::new(addr, "request", "cadence1", Duration::from_millis(100));
    let result = engine.submit(Path::new("/music/a.flac")).await;
    assert!(matches!(result, Err(PlaybackError::Timeout(_))));
}

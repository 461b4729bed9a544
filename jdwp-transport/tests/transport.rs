// End-to-end transport tests over loopback sockets

use jdwp_transport::{SocketTransportService, TransportError, TransportService};
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("jdwp_transport=debug")
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn listen_accept_attach_exchange_bytes() {
    init_tracing();

    let mut debugger = SocketTransportService::new();
    let key = debugger.start_listening(Some("localhost:0")).await.unwrap();
    assert!(key.address().starts_with("localhost:"));
    assert_ne!(key.port(), Some(0));

    let address = key.address().to_string();
    let vm = tokio::spawn(async move {
        let mut vm = SocketTransportService::new();
        let conn = vm.attach(&address, WAIT, WAIT).await.unwrap();
        conn.write_all(b"\x07").await.unwrap();
        let mut one = [0u8; 1];
        assert_eq!(conn.read(&mut one).await.unwrap(), 1);
        one[0]
    });

    let conn = debugger.accept(&key, WAIT, WAIT).await.unwrap();
    let mut one = [0u8; 1];
    assert_eq!(conn.read(&mut one).await.unwrap(), 1);
    assert_eq!(one, [0x07]);
    conn.write_all(&one).await.unwrap();

    assert_eq!(vm.await.unwrap(), 0x07);

    debugger.stop_listening(&key);
    debugger.close().await;
    assert!(!conn.is_open());
}

#[tokio::test]
async fn accept_after_stop_listening_fails_cleanly() {
    let mut service = SocketTransportService::new();
    let key = service.start_listening(Some("127.0.0.1:0")).await.unwrap();
    service.stop_listening(&key);
    // Stopping twice is harmless
    service.stop_listening(&key);

    let result = tokio::time::timeout(WAIT, service.accept(&key, Duration::ZERO, Duration::ZERO))
        .await
        .expect("accept hung after stop_listening");
    assert!(matches!(result, Err(TransportError::NotListening(_))));
}

#[tokio::test]
async fn invalid_address_does_no_io() {
    let mut service = SocketTransportService::new();
    let started = Instant::now();
    let err = service.attach("abc", WAIT, WAIT).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidAddress(_)), "{err:?}");
    assert!(started.elapsed() < WAIT);
    assert!(service.connection().is_none());

    let err = service.start_listening(Some("host:port")).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidAddress(_)), "{err:?}");
    assert!(service.listen_key().is_none());
}

#[tokio::test]
async fn address_forms_are_equivalent() {
    let service = SocketTransportService::new();
    assert_eq!(
        service.parse_address("localhost:9000").unwrap(),
        service.parse_address("9000").unwrap()
    );
}

#[tokio::test]
async fn bind_conflict_is_io_error() {
    let mut first = SocketTransportService::new();
    let key = first.start_listening(Some("127.0.0.1:0")).await.unwrap();

    let mut second = SocketTransportService::new();
    let err = second.start_listening(Some(key.address())).await.unwrap_err();
    assert!(matches!(err, TransportError::Io(_)), "{err:?}");
}

#[tokio::test]
async fn mismatched_peer_is_invalid_handshake() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let mut service = SocketTransportService::new();
    let key = service.start_listening(Some("127.0.0.1:0")).await.unwrap();
    let port = key.port().unwrap();

    tokio::spawn(async move {
        let mut peer = tokio::net::TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let mut buf = [0u8; 14];
        peer.read_exact(&mut buf).await.unwrap();
        peer.write_all(b"GET / HTTP/1.1").await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let err = service.accept(&key, WAIT, WAIT).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidHandshake), "{err:?}");
    assert!(service.connection().is_none());

    // The same instance can accept again
    let address = key.address().to_string();
    let vm = tokio::spawn(async move {
        let mut vm = SocketTransportService::new();
        vm.attach(&address, WAIT, WAIT).await.map(|_| ())
    });
    service.accept(&key, WAIT, WAIT).await.unwrap();
    vm.await.unwrap().unwrap();
}

#[tokio::test]
async fn reused_for_sequential_sessions() {
    let mut debugger = SocketTransportService::new();

    for _ in 0..2 {
        let key = debugger.start_listening(Some("127.0.0.1:0")).await.unwrap();
        let address = key.address().to_string();
        let vm = tokio::spawn(async move {
            let mut vm = SocketTransportService::new();
            vm.attach(&address, WAIT, WAIT).await.unwrap()
        });

        let conn = debugger.accept(&key, WAIT, WAIT).await.unwrap();
        let remote = vm.await.unwrap();
        assert_eq!(conn.peer_addr(), remote.local_addr());

        debugger.close().await;
        assert!(debugger.listen_key().is_none());
        assert!(debugger.connection().is_none());
    }
}

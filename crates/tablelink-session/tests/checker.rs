//! Integration tests for the HTTP room existence check.
//!
//! A raw TCP listener plays the game server and answers the `GET` with a
//! canned status line, so no HTTP server crate is needed.

#[cfg(feature = "http")]
mod http {
    use tablelink_session::{
        HttpRoomChecker, RoomChecker, RoomEndpoint, RoomStatus, SessionError,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one request with `status` and returns the endpoint
    /// plus a handle yielding the request line the server saw.
    async fn serve_once(
        status: &'static str,
    ) -> (RoomEndpoint, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("should accept");
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.expect("should read request");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            stream
                .write_all(response.as_bytes())
                .await
                .expect("should write response");
            stream.shutdown().await.ok();
            request.lines().next().unwrap_or_default().to_string()
        });

        let endpoint =
            RoomEndpoint::new(addr.to_string(), "lobby", false).expect("valid endpoint");
        (endpoint, handle)
    }

    #[tokio::test]
    async fn test_http_checker_ok_is_available() {
        let (endpoint, server) = serve_once("200 OK").await;
        let status = HttpRoomChecker::new().check(&endpoint).await.unwrap();
        assert_eq!(status, RoomStatus::Available);
        assert_eq!(server.await.unwrap(), "GET /room/lobby HTTP/1.1");
    }

    #[tokio::test]
    async fn test_http_checker_forbidden_is_locked() {
        let (endpoint, _server) = serve_once("403 Forbidden").await;
        let status = HttpRoomChecker::new().check(&endpoint).await.unwrap();
        assert_eq!(status, RoomStatus::Locked);
    }

    #[tokio::test]
    async fn test_http_checker_not_found_is_gone() {
        let (endpoint, _server) = serve_once("404 Not Found").await;
        let status = HttpRoomChecker::new().check(&endpoint).await.unwrap();
        assert_eq!(status, RoomStatus::NotFound);
    }

    #[tokio::test]
    async fn test_http_checker_server_error_is_check_failure() {
        let (endpoint, _server) = serve_once("500 Internal Server Error").await;
        let result = HttpRoomChecker::new().check(&endpoint).await;
        assert!(matches!(result, Err(SessionError::CheckFailed(_))));
    }

    #[tokio::test]
    async fn test_http_checker_unreachable_host_is_check_failure() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = RoomEndpoint::new(addr.to_string(), "lobby", false).unwrap();
        let result = HttpRoomChecker::new().check(&endpoint).await;
        assert!(matches!(result, Err(SessionError::CheckFailed(_))));
    }
}

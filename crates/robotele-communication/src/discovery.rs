//! Robot server discovery
//!
//! The robot server answers a UDP request on its status port. The first
//! datagram that comes back identifies the server by its source address.

use async_trait::async_trait;
use robotele_core::error::ConnectionError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;

/// Finds a robot server on the local network
#[async_trait]
pub trait ServerDiscovery: Send + Sync {
    /// Ask on `port` and return the address of the first server that answers,
    /// or `None` when nothing answers in time.
    async fn find_server(&self, port: u16) -> Result<Option<IpAddr>, ConnectionError>;
}

/// Discovery by UDP broadcast
#[derive(Debug, Clone)]
pub struct UdpBroadcastDiscovery {
    request: Vec<u8>,
    target: IpAddr,
    timeout: Duration,
}

impl UdpBroadcastDiscovery {
    /// Create a discovery that broadcasts `request` and waits up to `timeout`
    pub fn new(request: impl Into<Vec<u8>>, timeout: Duration) -> Self {
        Self {
            request: request.into(),
            target: IpAddr::V4(Ipv4Addr::BROADCAST),
            timeout,
        }
    }

    /// Send the request to a specific address instead of broadcasting
    pub fn with_target(mut self, target: IpAddr) -> Self {
        self.target = target;
        self
    }

    async fn ask(&self, port: u16) -> std::io::Result<Option<IpAddr>> {
        let socket = UdpSocket::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)).await?;
        socket.set_broadcast(true)?;
        socket
            .send_to(&self.request, SocketAddr::new(self.target, port))
            .await?;

        let mut buf = [0u8; 512];
        match tokio::time::timeout(self.timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, from))) => {
                tracing::debug!("Discovery reply from {} ({} bytes)", from, len);
                Ok(Some(from.ip()))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }
}

#[async_trait]
impl ServerDiscovery for UdpBroadcastDiscovery {
    async fn find_server(&self, port: u16) -> Result<Option<IpAddr>, ConnectionError> {
        tracing::info!("Looking for robot server on UDP port {}", port);
        self.ask(port)
            .await
            .map_err(|e| ConnectionError::Discovery {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_server_reports_responder() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let responder = tokio::spawn(async move {
            let mut buf = [0u8; 64];
            let (len, from) = server.recv_from(&mut buf).await.unwrap();
            assert_eq!(&buf[..len], b"who-is-robot");
            server.send_to(b"robot", from).await.unwrap();
        });

        let discovery = UdpBroadcastDiscovery::new(b"who-is-robot".to_vec(), Duration::from_secs(2))
            .with_target(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let found = discovery.find_server(port).await.unwrap();

        assert_eq!(found, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_find_server_times_out() {
        // Bound but silent
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();

        let discovery = UdpBroadcastDiscovery::new(b"ping".to_vec(), Duration::from_millis(100))
            .with_target(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(discovery.find_server(port).await.unwrap(), None);
    }
}

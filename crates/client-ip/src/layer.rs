use std::{
    net::SocketAddr,
    sync::Arc,
    task::{Context, Poll},
};

use axum::extract::ConnectInfo;
use http::Request;
use tower::Layer;

use crate::TrustedProxies;

/// Middleware attaching the resolved client IP to every request as a
/// [`ClientIp`] extension.
#[derive(Clone)]
pub struct ClientIpLayer {
    trusted_proxies: Arc<TrustedProxies>,
}

impl ClientIpLayer {
    pub fn new(trusted_proxies: TrustedProxies) -> Self {
        Self {
            trusted_proxies: Arc::new(trusted_proxies),
        }
    }
}

impl<Service> Layer<Service> for ClientIpLayer {
    type Service = ClientIpService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        ClientIpService {
            next,
            trusted_proxies: self.trusted_proxies.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ClientIpService<Service> {
    next: Service,
    trusted_proxies: Arc<TrustedProxies>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for ClientIpService<Service>
where
    Service: tower::Service<Request<ReqBody>>,
{
    type Response = Service::Response;
    type Error = Service::Error;
    type Future = Service::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip())
            .expect("the server must expose the peer address through ConnectInfo");

        let header_value = req
            .headers()
            .get(self.trusted_proxies.header_name())
            .and_then(|value| value.to_str().ok());

        let client_ip = self.trusted_proxies.resolve(header_value, peer);
        req.extensions_mut().insert(client_ip);

        self.next.call(req)
    }
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, net::SocketAddr};

    use axum::extract::ConnectInfo;
    use http::Request;
    use tower::{Layer, ServiceExt};

    use crate::{ClientIp, ClientIpLayer, TrustedProxies};

    fn request(header: Option<&str>, peer: &str) -> Request<()> {
        let mut builder = Request::builder();

        if let Some(value) = header {
            builder = builder.header("X-Forwarded-For", value);
        }

        let mut req = builder.body(()).unwrap();
        let peer: SocketAddr = peer.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));

        req
    }

    async fn resolve(trusted_hosts: &[&str], req: Request<()>) -> Option<ClientIp> {
        let trusted_proxies = TrustedProxies::new("X-Forwarded-For", trusted_hosts).unwrap();

        let service = ClientIpLayer::new(trusted_proxies).layer(tower::service_fn(
            |req: Request<()>| async move { Ok::<_, Infallible>(req.extensions().get::<ClientIp>().cloned()) },
        ));

        service.oneshot(req).await.unwrap()
    }

    #[tokio::test]
    async fn attaches_forwarded_address() {
        let req = request(Some("10.0.0.1, 10.0.0.4, 10.0.0.11"), "127.0.0.1:45000");
        let resolved = resolve(&[], req).await;

        assert_eq!(resolved, Some(ClientIp("10.0.0.11".to_owned())));
    }

    #[tokio::test]
    async fn attaches_peer_address_when_header_is_missing() {
        let req = request(None, "127.0.0.1:45000");
        let resolved = resolve(&[], req).await;

        assert_eq!(resolved, Some(ClientIp("127.0.0.1".to_owned())));
    }

    #[tokio::test]
    async fn attaches_peer_address_for_untrusted_peer() {
        let req = request(Some("10.0.0.1"), "192.168.1.100:45000");
        let resolved = resolve(&["192.168.1.1", "192.168.0.0/24"], req).await;

        assert_eq!(resolved, Some(ClientIp("192.168.1.100".to_owned())));
    }
}

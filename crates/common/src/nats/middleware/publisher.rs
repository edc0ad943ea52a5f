use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use super::types::{PublishRequest, PublishResponse};
use super::{NatsPublishLoggingLayer, NatsPublishLoggingService};
use crate::nats::CorePublisher;
use anyhow::Result;
use tower::{Service, ServiceBuilder};

/// Inner service that performs the actual NATS publish
#[derive(Clone)]
pub struct NatsPublishService {
    publisher: Arc<dyn CorePublisher>,
}

impl NatsPublishService {
    pub fn new(publisher: Arc<dyn CorePublisher>) -> Self {
        Self { publisher }
    }
}

impl Service<PublishRequest> for NatsPublishService {
    type Response = PublishResponse;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: PublishRequest) -> Self::Future {
        let publisher = Arc::clone(&self.publisher);
        let PublishRequest { subject, payload } = req;
        let payload_bytes = payload.len();

        Box::pin(async move {
            publisher.publish(subject.clone(), payload).await?;
            Ok(PublishResponse {
                subject,
                payload_bytes,
            })
        })
    }
}

/// Builder for creating a layered NATS publisher service
pub struct NatsPublisherBuilder {
    publisher: Arc<dyn CorePublisher>,
    with_logging: bool,
}

impl NatsPublisherBuilder {
    pub fn new(publisher: Arc<dyn CorePublisher>) -> Self {
        Self {
            publisher,
            with_logging: false,
        }
    }

    pub fn with_logging(mut self) -> Self {
        self.with_logging = true;
        self
    }

    /// Build the layered publisher service
    /// Layer order (outermost first): Logging -> Publish
    pub fn build(self) -> LayeredPublisher<NatsPublishService> {
        let inner = NatsPublishService::new(self.publisher);

        if self.with_logging {
            let svc = ServiceBuilder::new()
                .layer(NatsPublishLoggingLayer::new())
                .service(inner);
            LayeredPublisher::Logging(svc)
        } else {
            LayeredPublisher::None(inner)
        }
    }
}

/// Enum to hold different layer combinations
/// This allows the builder to return a concrete type that implements Service
#[derive(Clone)]
pub enum LayeredPublisher<S> {
    Logging(NatsPublishLoggingService<NatsPublishService>),
    None(S),
}

impl<S> Service<PublishRequest> for LayeredPublisher<S>
where
    S: Service<PublishRequest, Response = PublishResponse, Error = anyhow::Error>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = PublishResponse;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self {
            LayeredPublisher::Logging(svc) => svc.poll_ready(cx),
            LayeredPublisher::None(svc) => svc.poll_ready(cx),
        }
    }

    fn call(&mut self, req: PublishRequest) -> Self::Future {
        match self {
            LayeredPublisher::Logging(svc) => svc.call(req),
            LayeredPublisher::None(svc) => Box::pin(svc.call(req)),
        }
    }
}

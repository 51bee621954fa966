//! modgate: a private Go module proxy and release publisher.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod protocol;
pub mod publish;
pub mod repository;
pub mod routing;
pub mod toolchain;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use publish::PublishPipeline;
pub use routing::PatternRouter;

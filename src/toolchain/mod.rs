//! Build tool wrapper.
//!
//! # Data Flow
//! ```text
//! modgate go <args>
//!     → bind translator on 127.0.0.1:0
//!     → env.rs (GOPROXY / GONOSUMDB with the proxy injected)
//!     → go.rs (run `go <args>`, wait)
//!     → stop translator, exit with go's status
//! ```

pub mod env;
pub mod go;

pub use env::{proxy_env, DEFAULT_GOPROXY};
pub use go::{run_go, ToolchainError};

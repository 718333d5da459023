//! Link services.
//!
//! Every stage of the pipeline is a [`tower::Service`] from [`link::Request`] to
//! [`link::Response`]. Terminating stages produce results; the split service routes each operation
//! to one of two links.

pub mod http_link;
pub mod link;
pub mod split;

pub use link::Request;
pub use link::Response;
pub use link::ResultStream;
pub use split::SplitService;
pub use split::is_subscription;

/// Application middleware: coarse authentication and request logging.

mod auth;
mod logging;

pub use auth::{AuthMiddleware, PublicPaths};
pub use logging::RequestLogger;

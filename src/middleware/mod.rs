/// Middleware module
///
/// Bearer authentication and request logging.

mod jwt_middleware;
mod request_logging;

pub use jwt_middleware::JwtMiddleware;
pub use request_logging::RequestLogging;

pub mod timing;

pub use timing::{telemetry_middleware, AuthenticatedUser};

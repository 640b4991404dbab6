mod base;
mod middleware;

pub use self::middleware::*;

pub mod handlers;

pub use handlers::{ApiState, create_router};

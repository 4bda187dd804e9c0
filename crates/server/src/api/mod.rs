pub mod document;
pub mod handlers;
pub mod middleware;
pub mod operations;
pub mod routes;
pub mod viewer;
pub mod ws;

pub use document::{CONTENT_SHA256_HEADER, OPERATION_ID_HEADER};
pub use routes::create_router;
pub use ws::WsMessage;

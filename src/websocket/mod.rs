// WebSocket module: the /ws/{code} duplex channel

pub mod handler;

pub use handler::websocket_handler;

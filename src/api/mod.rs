pub mod routes;
mod server;
pub use server::{app, serve};
pub mod public;
pub mod session;
mod state;
pub use state::{AppState, Session};

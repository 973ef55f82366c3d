pub mod encoding;
pub mod server;

pub use server::Server;

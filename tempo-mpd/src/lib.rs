pub mod client;
pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod errors;
pub mod filter;
pub mod from_mpd;
pub mod mode;
pub mod model;
pub mod parser;
pub mod version;

pub use client::Mpd;
pub use config::{ArtworkGetter, MpdPassword, Server};
pub use connection::ConnectionState;
pub use errors::{MpdError, MpdResult};
pub use mode::Profile;

#[cfg(test)]
mod tests {
    pub mod fixtures;
}

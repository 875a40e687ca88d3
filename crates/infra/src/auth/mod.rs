//! EVE SSO authorization
//!
//! - [`AuthStateStore`]: single-use CSRF state tokens with a TTL
//! - [`SsoClient`]: authorization-code, refresh-token and verify calls
//! - [`EsiOAuthProvider`]: login URL and callback handling
//! - [`TokenInjectingClient`]: [`auspex_core::EsiClient`] decorator that
//!   supplies a valid access token per owner

mod client;
mod errors;
mod provider;
mod state;
mod token;

pub use client::TokenInjectingClient;
pub use errors::AuthError;
pub use provider::{AuthSettings, EsiOAuthProvider, ESI_SCOPES};
pub use state::AuthStateStore;
pub use token::{SsoClient, TokenResponse, VerifiedCharacter};

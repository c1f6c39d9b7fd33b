//! Business logic between the routes and the repositories.
//!
//! # Services
//!
//! - `auth` - Owner registration and login (argon2id)
//! - `bookings` - Booking form validation and open-slot lookup
//! - `chat` - Deciding who is speaking on a message thread
//! - `chatbot` - Premium business assistant over a chat-completions API
//! - `orders` - Order form validation and line merging
//! - `storefront` - Cached public store payload

pub mod auth;
pub mod bookings;
pub mod chat;
pub mod chatbot;
pub mod orders;
pub mod storefront;

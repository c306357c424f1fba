//! Client SDK for the roll-a-die service.

pub mod client;

pub use client::DiceClient;

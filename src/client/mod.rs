mod client;

pub use client::{Client, HOUNDIFY_TEXT_URL, HOUNDIFY_VOICE_URL};

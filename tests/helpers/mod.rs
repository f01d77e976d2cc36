#![allow(dead_code)]
pub mod payloads;

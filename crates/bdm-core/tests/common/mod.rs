#![allow(dead_code)]

pub mod fake_tool;
pub mod header_server;

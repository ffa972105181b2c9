//! Content parsers

pub mod m3u8_parser;

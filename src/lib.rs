//! textlens: find text in an image, then transliterate, translate and explain it
//! with a multimodal AI model.
//!
//! The server side is [`server`] in front of [`analysis::Analyzer`], which asks an
//! [`oracle::Oracle`] whether the image holds text and, if it does, asks for a
//! section-labelled answer that [`parser`] turns into a [`parser::ParsedResult`].
//! The [`client`] module is the uploader and its progress state machine.

pub mod analysis;
pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod oracle;
pub mod oracles;
pub mod parser;
pub mod prompts;
pub mod server;
pub mod upload;

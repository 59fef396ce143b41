//! Dubclient - Upload Client for a Video Dubbing Service
//!
//! Sends a video and a target language to a remote dubbing backend as a
//! multipart upload, then shows the dubbed video it returns.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod backend;
pub mod form;
pub mod handler;
pub mod media;
pub mod view;
pub mod error;
pub mod logging;

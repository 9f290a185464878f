// QSOlive Library
// Re-export modules for use in main.rs

pub mod adif;
pub mod config;
pub mod contact;
pub mod delivery;
pub mod logging;
pub mod reference;
pub mod replay;
pub mod udp;

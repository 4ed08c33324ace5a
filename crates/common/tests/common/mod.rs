//! Shared test utilities for seal/open integration tests
#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::custodian::{AssumePresent, AuthContext, DeviceKey, PresenceVerifier, SoftwareCustodian};

/// Set up a software custodian with a fresh device key and a context that never prompts
pub fn setup_custodian() -> (SoftwareCustodian, AuthContext) {
    let custodian = SoftwareCustodian::new(DeviceKey::generate().unwrap());
    (custodian, AuthContext::new(AssumePresent))
}

/// Declines every presence check
pub struct Deny;

impl PresenceVerifier for Deny {
    fn confirm(&self, _reason: &str) -> io::Result<bool> {
        Ok(false)
    }
}

/// Approves every presence check and counts how often it was asked
#[derive(Clone, Default)]
pub struct Counting(pub Arc<AtomicUsize>);

impl Counting {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl PresenceVerifier for Counting {
    fn confirm(&self, _reason: &str) -> io::Result<bool> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Hand-encode a CBOR map of byte strings, in the given key order
pub fn cbor_byte_map(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = head(5, entries.len());
    for (key, value) in entries {
        out.extend(head(3, key.len()));
        out.extend_from_slice(key.as_bytes());
        out.extend(head(2, value.len()));
        out.extend_from_slice(value);
    }
    out
}

fn head(major: u8, len: usize) -> Vec<u8> {
    match len {
        0..=23 => vec![(major << 5) | len as u8],
        24..=255 => vec![(major << 5) | 24, len as u8],
        256..=65535 => vec![(major << 5) | 25, (len >> 8) as u8, len as u8],
        _ => {
            let mut out = vec![(major << 5) | 26];
            out.extend_from_slice(&(len as u32).to_be_bytes());
            out
        }
    }
}

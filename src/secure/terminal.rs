use std::collections::HashSet;

use crate::error::RenderError;
use crate::secure::{LayoutMode, SecureRenderClient};

/// One call received from the untrusted side, in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecureCall {
    EncryptedMode(bool),
    Cipher(Vec<u8>),
    KeyHandle(i32),
    TextLength(usize),
    LayoutMode(LayoutMode),
    Clear,
}

/// What the secure surface currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecureSurface {
    pub encrypted_mode: bool,
    pub cipher_len: usize,
    pub key_handle: Option<i32>,
    pub text_length: usize,
    pub layout_mode: LayoutMode,
    /// Bumped every time a full ciphertext upload completes.
    pub generation: u64,
}

impl SecureSurface {
    pub fn is_showing(&self) -> bool {
        self.encrypted_mode && self.generation > 0 && self.key_handle.is_some()
    }
}

/// Stand-in for the trusted path when running in a terminal. It holds no keys
/// and never decrypts; it tracks the surface state so the UI can paint a mask
/// of the declared length in its place.
#[derive(Clone, Debug, Default)]
pub struct TerminalSecurePath {
    key_slots: HashSet<i32>,
    surface: SecureSurface,
    journal: Vec<SecureCall>,
}

impl TerminalSecurePath {
    pub fn new(key_slots: impl IntoIterator<Item = i32>) -> Self {
        Self {
            key_slots: key_slots.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn surface(&self) -> &SecureSurface {
        &self.surface
    }

    pub fn journal(&self) -> &[SecureCall] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<SecureCall> {
        std::mem::take(&mut self.journal)
    }
}

impl SecureRenderClient for TerminalSecurePath {
    fn set_encrypted_mode(&mut self, enabled: bool) -> Result<(), RenderError> {
        self.journal.push(SecureCall::EncryptedMode(enabled));
        self.surface.encrypted_mode = enabled;
        Ok(())
    }

    fn set_cipher(&mut self, ciphertext: &[u8]) -> Result<(), RenderError> {
        self.journal.push(SecureCall::Cipher(ciphertext.to_vec()));
        self.surface.cipher_len = ciphertext.len();
        Ok(())
    }

    fn set_key_handle(&mut self, handle: i32) -> Result<(), RenderError> {
        self.journal.push(SecureCall::KeyHandle(handle));
        if !self.key_slots.contains(&handle) {
            self.surface.key_handle = None;
            return Err(RenderError::UnknownKeyHandle(handle));
        }
        self.surface.key_handle = Some(handle);
        Ok(())
    }

    fn set_encrypted_text_length(&mut self, length: usize) -> Result<(), RenderError> {
        self.journal.push(SecureCall::TextLength(length));
        self.surface.text_length = length;
        self.surface.generation += 1;
        Ok(())
    }

    fn set_encrypted_layout_mode(&mut self, mode: LayoutMode) -> Result<(), RenderError> {
        self.journal.push(SecureCall::LayoutMode(mode));
        self.surface.layout_mode = mode;
        Ok(())
    }

    fn clear_encrypted_text(&mut self) -> Result<(), RenderError> {
        self.journal.push(SecureCall::Clear);
        self.surface = SecureSurface {
            layout_mode: self.surface.layout_mode,
            generation: self.surface.generation,
            ..SecureSurface::default()
        };
        Ok(())
    }
}

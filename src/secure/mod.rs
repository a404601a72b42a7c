pub mod layout_mode;
pub mod terminal;
pub mod widget;

pub use layout_mode::LayoutMode;
pub use widget::{CiphertextRecord, EncryptedTextWidget, LayoutHost, WidgetRenderState};

use crate::error::RenderError;

/// Entry points of the trusted render path. Implementations hold the keys and
/// draw plaintext themselves; callers only ever see success or an opaque error.
pub trait SecureRenderClient {
    fn set_encrypted_mode(&mut self, enabled: bool) -> Result<(), RenderError>;
    fn set_cipher(&mut self, ciphertext: &[u8]) -> Result<(), RenderError>;
    fn set_key_handle(&mut self, handle: i32) -> Result<(), RenderError>;
    fn set_encrypted_text_length(&mut self, length: usize) -> Result<(), RenderError>;
    fn set_encrypted_layout_mode(&mut self, mode: LayoutMode) -> Result<(), RenderError>;
    fn clear_encrypted_text(&mut self) -> Result<(), RenderError>;
}

use crate::engine::FrequencyModel;
use crate::engine::width;
use crate::error::RenderError;
use crate::secure::{LayoutMode, SecureRenderClient};

/// Filler used for the placeholder that ordinary layout code sees.
pub const PLACEHOLDER_CHAR: char = 'X';

/// Everything needed to ask the trusted path for a fresh render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CiphertextRecord {
    pub ciphertext: Vec<u8>,
    pub ciphertext_size: usize,
    pub text_length: usize,
    pub key_handle: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidgetRenderState {
    #[default]
    Plain,
    Encrypted,
}

/// Hooks back into the hosting layout system.
pub trait LayoutHost {
    /// The placeholder changed length, so the widget must be measured again.
    fn request_layout(&mut self) {}
    /// The widget needs repainting.
    fn invalidate(&mut self) {}
}

impl LayoutHost for () {}

/// Text widget whose real content only ever exists on the trusted path.
///
/// The widget keeps the ciphertext metadata, replays it to the
/// [`SecureRenderClient`] on demand, and exposes a placeholder of the declared
/// plaintext length to everything else.
pub struct EncryptedTextWidget<C, H = ()> {
    client: C,
    host: H,
    record: Option<CiphertextRecord>,
    state: WidgetRenderState,
    display_text: String,
    layout_mode: LayoutMode,
}

impl<C: SecureRenderClient> EncryptedTextWidget<C> {
    pub fn new(client: C) -> Self {
        Self::with_host(client, ())
    }
}

impl<C: SecureRenderClient, H: LayoutHost> EncryptedTextWidget<C, H> {
    pub fn with_host(client: C, host: H) -> Self {
        Self {
            client,
            host,
            record: None,
            state: WidgetRenderState::Plain,
            display_text: String::new(),
            layout_mode: LayoutMode::Standard,
        }
    }

    /// Store a new record and hand it to the trusted path.
    ///
    /// The record and the `Encrypted` state are committed before the trusted
    /// path is called, so a failure leaves them in place for a later
    /// [`redraw_encrypted_text`](Self::redraw_encrypted_text).
    pub fn set_ciphertext(
        &mut self,
        ciphertext: Vec<u8>,
        ciphertext_size: usize,
        text_length: usize,
        key_handle: i32,
    ) -> Result<(), RenderError> {
        self.install(CiphertextRecord {
            ciphertext,
            ciphertext_size,
            text_length,
            key_handle,
        })
    }

    /// Replay the last stored record. Does nothing if none was ever stored.
    pub fn redraw_encrypted_text(&mut self) -> Result<(), RenderError> {
        match self.record.take() {
            Some(record) => self.install(record),
            None => Ok(()),
        }
    }

    /// Remove the rendered content from the trusted surface.
    ///
    /// The stored record is kept, so a later redraw brings the same content
    /// back.
    pub fn clear_ciphertext(&mut self) -> Result<(), RenderError> {
        self.client.clear_encrypted_text().inspect_err(|err| {
            tracing::warn!(error = %err, "secure path failed to clear text");
        })?;
        self.state = WidgetRenderState::Plain;
        if !self.display_text.is_empty() {
            self.display_text.clear();
            self.host.request_layout();
        }
        self.host.invalidate();
        Ok(())
    }

    /// Resolve `mode` and forward it to the trusted path.
    pub fn set_layout_mode(&mut self, mode: &str) -> Result<LayoutMode, RenderError> {
        let resolved = LayoutMode::parse(mode);
        self.layout_mode = resolved;
        self.client.set_encrypted_layout_mode(resolved)?;
        Ok(resolved)
    }

    pub fn render_state(&self) -> WidgetRenderState {
        self.state
    }

    pub fn is_encrypted(&self) -> bool {
        self.state == WidgetRenderState::Encrypted
    }

    /// Placeholder shown to the ordinary layout path.
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn record(&self) -> Option<&CiphertextRecord> {
        self.record.as_ref()
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Layout width of the hidden text, predicted from the frequency model
    /// instead of measuring the placeholder.
    pub fn estimated_width(&self, model: &FrequencyModel, widths: &[f64]) -> f64 {
        match (&self.record, self.state) {
            (Some(record), WidgetRenderState::Encrypted) => {
                width::estimate_line_width(model, widths, record.text_length)
            }
            _ => 0.0,
        }
    }

    fn install(&mut self, record: CiphertextRecord) -> Result<(), RenderError> {
        let record = self.record.insert(record);
        self.state = WidgetRenderState::Encrypted;

        tracing::debug!(
            ciphertext_size = record.ciphertext_size,
            text_length = record.text_length,
            key_handle = record.key_handle,
            "installing ciphertext"
        );

        if let Err(err) = upload(&mut self.client, record) {
            tracing::warn!(
                error = %err,
                key_handle = record.key_handle,
                "secure path rejected ciphertext"
            );
            return Err(err);
        }

        let placeholder_len = self.display_text.chars().count();
        if placeholder_len != record.text_length {
            self.host.request_layout();
        }
        self.display_text = PLACEHOLDER_CHAR.to_string().repeat(record.text_length);
        self.host.invalidate();
        Ok(())
    }
}

fn upload<C: SecureRenderClient>(
    client: &mut C,
    record: &CiphertextRecord,
) -> Result<(), RenderError> {
    client.set_encrypted_mode(true)?;
    client.set_cipher(&record.ciphertext)?;
    client.set_key_handle(record.key_handle)?;
    client.set_encrypted_text_length(record.text_length)
}

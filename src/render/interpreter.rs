//! # Interpreter
//!
//! The dispatch loop: folds each parsed command into [`RenderState`] and
//! routes drawing commands to text layout, primitives, graphics, and
//! barcodes.
//!
//! ## Barcode Protocol
//!
//! ```text
//!              setup (^BC, ^BQ, ...)
//!   ┌──────┐ ─────────────────────────► ┌─────────┐
//!   │ Idle │                            │ Pending │ ◄─┐ setup replaces
//!   └──────┘ ◄───────────────────────── └─────────┘ ──┘
//!        ^FD: draw barcode │ any other command: cancel (warn),
//!                          │ then process it normally
//! ```
//!
//! No single command can abort the render: handler errors, and panics
//! raised inside a handler, are logged at warn level and the loop moves on.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use log::{debug, warn};

use super::graphics::{self, GraphicStore};
use super::layout::layout_block;
use super::primitives;
use super::state::{FieldBlock, RenderState};
use super::surface::{Point, Rotation, Surface, TextAlign, Tone};
use crate::barcode::{self, BarcodeSetup, SymbolEncoder};
use crate::error::EtiquetaError;
use crate::protocol::hex::decode_field_escapes;
use crate::protocol::{Command, CommandKind, commands};

/// Barcode interpreter state between a setup command and its data.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BarcodeSlot {
    #[default]
    Idle,
    Pending {
        command: Command,
        setup: BarcodeSetup,
    },
}

impl BarcodeSlot {
    pub fn is_pending(&self) -> bool {
        matches!(self, BarcodeSlot::Pending { .. })
    }
}

/// Executes commands against a drawing surface.
pub struct Interpreter<'a> {
    state: RenderState,
    store: &'a mut GraphicStore,
    encoder: &'a dyn SymbolEncoder,
    slot: BarcodeSlot,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        state: RenderState,
        store: &'a mut GraphicStore,
        encoder: &'a dyn SymbolEncoder,
    ) -> Self {
        Self {
            state,
            store,
            encoder,
            slot: BarcodeSlot::Idle,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn slot(&self) -> &BarcodeSlot {
        &self.slot
    }

    /// Tokenize `source` and execute every command in order.
    pub fn run(&mut self, source: &str, surface: &mut dyn Surface) {
        for command in commands(source) {
            self.execute(&command, surface);
        }
        if let BarcodeSlot::Pending { command, .. } = std::mem::take(&mut self.slot) {
            warn!("Barcode {} cancelled: no field data before end of input", command.raw);
        }
    }

    /// Execute one command, applying the barcode protocol first.
    pub fn execute(&mut self, command: &Command, surface: &mut dyn Surface) {
        if !command.is_valid() {
            warn!("Skipping malformed command {:?}", command.raw);
            return;
        }
        let kind = CommandKind::from_code(&command.code);

        if self.slot.is_pending() {
            let pending = std::mem::take(&mut self.slot);
            if let BarcodeSlot::Pending { command: setup_command, setup } = pending {
                if kind == Some(CommandKind::FieldData) {
                    let drawn = isolated(|| self.draw_barcode(&setup, &command.parameters, surface));
                    if let Err(e) = drawn {
                        warn!("Barcode {} not drawn: {}", setup_command.raw, e);
                    }
                    return;
                }
                warn!(
                    "Barcode {} cancelled by {} before field data",
                    setup_command.raw, command.raw
                );
            }
        }

        if let Err(e) = isolated(|| self.dispatch(kind, command, surface)) {
            warn!("{} skipped: {}", command.raw, e);
        }
    }

    fn dispatch(
        &mut self,
        kind: Option<CommandKind>,
        command: &Command,
        surface: &mut dyn Surface,
    ) -> Result<(), EtiquetaError> {
        let params = command.parameters.as_str();
        let Some(kind) = kind else {
            warn!("Unsupported command {}", command.raw);
            return Ok(());
        };

        match kind {
            CommandKind::FormatStart | CommandKind::FormatEnd | CommandKind::Comment => {}
            CommandKind::LabelHome => self.state.set_home(params),
            CommandKind::FieldOrigin => self.state.set_origin(params),
            CommandKind::ChangeDefaultFont => self.state.set_default_font(params),
            CommandKind::SelectFont(font) => self.state.select_font(font, params),
            CommandKind::BarcodeDefaults => self.state.barcode.apply(params),
            CommandKind::BarcodeSetup(symbology) => {
                self.slot = BarcodeSlot::Pending {
                    command: command.clone(),
                    setup: BarcodeSetup::parse(symbology, params),
                };
            }
            CommandKind::FieldBlock => self.state.block = FieldBlock::parse(params),
            CommandKind::FieldReverse => self.state.toggle_reverse(),
            CommandKind::FieldHex => self.state.set_hex_indicator(params),
            CommandKind::FieldData => return self.draw_field(params, surface),
            CommandKind::FieldSeparator => self.state.end_field(),
            CommandKind::GraphicBox => return primitives::draw_box(&mut self.state, surface, params),
            CommandKind::GraphicCircle => {
                return primitives::draw_circle(&mut self.state, surface, params);
            }
            CommandKind::GraphicEllipse => {
                return primitives::draw_ellipse(&mut self.state, surface, params);
            }
            CommandKind::GraphicDiagonal => {
                return primitives::draw_diagonal(&mut self.state, surface, params);
            }
            CommandKind::DownloadGraphic => {
                graphics::download_graphic(self.store, params)?;
            }
            CommandKind::RecallGraphic => {
                return graphics::recall_graphic(&mut self.state, self.store, surface, params);
            }
            CommandKind::GraphicField => {
                return graphics::graphic_field(&mut self.state, surface, params);
            }
        }
        Ok(())
    }

    /// Field data with `^FH` escapes applied.
    fn field_text(&self, data: &str) -> String {
        match self.state.hex_indicator {
            Some(indicator) => decode_field_escapes(data, indicator),
            None => data.to_string(),
        }
    }

    fn draw_field(&mut self, data: &str, surface: &mut dyn Surface) -> Result<(), EtiquetaError> {
        let text = self.field_text(data);
        if self.state.block.is_active() {
            let result = self.draw_block(&text, surface);
            self.state.end_block();
            return result;
        }
        self.draw_single_line(&text, surface)
    }

    fn no_font(&self) -> EtiquetaError {
        EtiquetaError::Font(format!(
            "no typeface available for {:?}",
            self.state.font.identifier
        ))
    }

    fn draw_single_line(&mut self, text: &str, surface: &mut dyn Surface) -> Result<(), EtiquetaError> {
        let font = self.state.font_spec().ok_or_else(|| self.no_font())?;
        let tone = self.state.take_tone(Tone::Black);
        let cursor = self.state.cursor;
        let baseline = Point::new(cursor.x, cursor.y + font.height);
        let rotation = self.state.font.rotation;

        if rotation == Rotation::Normal {
            return surface.draw_text(text, baseline, TextAlign::Left, &font, tone);
        }
        surface.save_rotated(cursor, rotation);
        let result = surface.draw_text(text, baseline, TextAlign::Left, &font, tone);
        surface.restore();
        result
    }

    fn draw_block(&mut self, text: &str, surface: &mut dyn Surface) -> Result<(), EtiquetaError> {
        if self.state.font.rotation != Rotation::Normal {
            warn!("Rotation is not supported inside a field block, drawing unrotated");
        }
        let font = self.state.font_spec().ok_or_else(|| self.no_font())?;
        let block = self.state.block;
        let lines = layout_block(text, &block, font.height, |run| surface.measure_text(run, &font))?;
        debug!("Field block laid out {} line(s)", lines.len());

        let tone = self.state.take_tone(Tone::Black);
        let cursor = self.state.cursor;
        for line in lines.iter().filter(|l| !l.text.is_empty()) {
            let at = Point::new(cursor.x + line.x, cursor.y + font.height + line.y);
            surface.draw_text(&line.text, at, TextAlign::Left, &font, tone)?;
        }
        Ok(())
    }

    fn draw_barcode(
        &mut self,
        setup: &BarcodeSetup,
        data: &str,
        surface: &mut dyn Surface,
    ) -> Result<(), EtiquetaError> {
        let payload = self.field_text(data);
        if self.state.reverse {
            warn!("Reverse is not supported for barcodes, ignoring");
        }

        let caption = if setup.prints_interpretation() && setup.orientation == Rotation::Normal {
            let height = barcode::draw::caption_height(self.state.font.height as f32);
            self.state.font_spec_sized(height, 0.0)
        } else {
            None
        };

        barcode::draw_barcode(
            surface,
            self.encoder,
            setup,
            &self.state.barcode,
            self.state.cursor,
            &payload,
            caption.as_ref(),
        )
        .map(|_| ())
    }
}

/// Run one handler, turning a panic into an error for that command alone.
fn isolated(handler: impl FnOnce() -> Result<(), EtiquetaError>) -> Result<(), EtiquetaError> {
    catch_unwind(AssertUnwindSafe(handler)).unwrap_or_else(|payload| {
        Err(EtiquetaError::Draw(format!(
            "handler panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================

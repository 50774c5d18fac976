//! Interactive form fields and the document AcroForm dictionary.
//!
//! Field widgets arrive with their appearance content already resolved
//! by the layout collaborator; this module only encodes them. Each
//! widget serializes its appearance-state streams as Form XObjects under
//! an /AP dictionary (Normal, Over, Down mapping to N, R, D) before the
//! field dictionary that references them is closed.

use super::{ArtefactToken, Color};
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::writer::PdfWriter;
use indexmap::IndexMap;
use std::io::Write;

bitflags::bitflags! {
    /// Field flags written as the /Ff entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u32 {
        /// The user may not change the value
        const READ_ONLY = 1;
        /// The field must have a value at submit time
        const REQUIRED = 1 << 1;
        /// The value is not exported by submit actions
        const NO_EXPORT = 1 << 2;
        /// Text field: multiple lines
        const MULTILINE = 1 << 12;
        /// Text field: password entry
        const PASSWORD = 1 << 13;
        /// Button: radio group
        const RADIO = 1 << 15;
        /// Button: push button (no value)
        const PUSH_BUTTON = 1 << 16;
        /// Choice: combo box instead of list box
        const COMBO = 1 << 17;
    }
}

/// Interactive field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Text input
    Text,
    /// Push button, checkbox, or radio button
    Button,
    /// List or combo box
    Choice,
    /// Digital signature field
    Signature,
}

impl FieldType {
    fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "Tx",
            FieldType::Button => "Btn",
            FieldType::Choice => "Ch",
            FieldType::Signature => "Sig",
        }
    }
}

/// Appearance states a widget can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppearanceState {
    /// Resting appearance
    Normal,
    /// Pointer-over (rollover) appearance
    Over,
    /// Pressed appearance
    Down,
}

impl AppearanceState {
    fn state_name(&self) -> &'static str {
        match self {
            AppearanceState::Normal => "N",
            AppearanceState::Over => "R",
            AppearanceState::Down => "D",
        }
    }
}

/// A resolved appearance stream: a Form XObject's bounds and content.
#[derive(Debug, Clone)]
pub struct AppearanceStream {
    /// Bounding box `[llx, lly, urx, ury]`
    pub bbox: [f64; 4],
    /// Raw content-stream operators
    pub content: Vec<u8>,
}

impl AppearanceStream {
    /// Create an appearance stream.
    pub fn new(bbox: [f64; 4], content: Vec<u8>) -> Self {
        Self { bbox, content }
    }

    fn write_to<W: Write>(&self, writer: &mut PdfWriter<W>) -> Result<ObjectRef> {
        let oref = writer.begin_object()?;
        writer.begin_stream(oref)?;
        writer.write_raw_bytes(&self.content)?;
        let info = writer.end_stream()?;
        writer.begin_dictionary()?;
        writer.write_dictionary_name_entry("Type", "XObject")?;
        writer.write_dictionary_name_entry("Subtype", "Form")?;
        writer.write_dictionary_number_entry("FormType", 1)?;
        writer.begin_dictionary_entry("BBox")?;
        writer.write_array_real_entries(&self.bbox)?;
        writer.end_dictionary_entry()?;
        writer.write_stream_meta(&info)?;
        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(oref)
    }
}

/// One form field widget.
#[derive(Debug, Clone)]
pub struct FieldWidget {
    /// Partial field name (/T)
    pub name: String,
    /// Current value (/V)
    pub value: Option<String>,
    /// Default value (/DV)
    pub default_value: Option<String>,
    /// Field type (/FT)
    pub field_type: FieldType,
    /// Field flags (/Ff)
    pub flags: FieldFlags,
    /// Widget rectangle on its page
    pub rect: [f64; 4],
    /// Default appearance string (/DA), e.g. `/Helv 12 Tf 0 g`
    pub default_appearance: String,
    /// Border color for the /MK dictionary
    pub border_color: Option<Color>,
    /// Background color for the /MK dictionary
    pub background_color: Option<Color>,
    appearances: IndexMap<AppearanceState, AppearanceStream>,
}

impl FieldWidget {
    /// Create a widget with no value and default appearance string.
    pub fn new(name: impl Into<String>, field_type: FieldType, rect: [f64; 4]) -> Self {
        Self {
            name: name.into(),
            value: None,
            default_value: None,
            field_type,
            flags: FieldFlags::empty(),
            rect,
            default_appearance: "/Helv 12 Tf 0 g".to_string(),
            border_color: None,
            background_color: None,
            appearances: IndexMap::new(),
        }
    }

    /// Set the current value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the default value.
    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the field flags.
    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the appearance stream for one state.
    pub fn set_appearance(&mut self, state: AppearanceState, stream: AppearanceStream) {
        self.appearances.insert(state, stream);
    }

    /// Serialize the widget as its own indirect object.
    pub fn write_to<W: Write>(&self, writer: &mut PdfWriter<W>) -> Result<ObjectRef> {
        let root = writer.begin_object()?;
        writer.begin_dictionary()?;
        writer.write_dictionary_name_entry("Type", "Annot")?;
        writer.write_dictionary_name_entry("Subtype", "Widget")?;
        writer.write_dictionary_string_entry("T", &self.name)?;
        if let Some(value) = &self.value {
            writer.write_dictionary_string_entry("V", value)?;
        }
        if let Some(default) = &self.default_value {
            writer.write_dictionary_string_entry("DV", default)?;
        }
        writer.write_dictionary_name_entry("FT", self.field_type.type_name())?;
        if !self.flags.is_empty() {
            writer.write_dictionary_number_entry("Ff", self.flags.bits() as i64)?;
        }
        writer.write_dictionary_string_entry("DA", &self.default_appearance)?;
        writer.begin_dictionary_entry("Rect")?;
        writer.write_array_real_entries(&self.rect)?;
        writer.end_dictionary_entry()?;

        if self.border_color.is_some() || self.background_color.is_some() {
            writer.begin_dictionary_entry("MK")?;
            writer.begin_dictionary()?;
            if let Some(border) = self.border_color {
                writer.begin_dictionary_entry("BC")?;
                super::write_color_array(writer, border)?;
                writer.end_dictionary_entry()?;
            }
            if let Some(background) = self.background_color {
                writer.begin_dictionary_entry("BG")?;
                super::write_color_array(writer, background)?;
                writer.end_dictionary_entry()?;
            }
            writer.end_dictionary()?;
            writer.end_dictionary_entry()?;
        }

        if !self.appearances.is_empty() {
            writer.begin_dictionary_entry("AP")?;
            writer.begin_dictionary()?;
            for (state, stream) in &self.appearances {
                let oref = stream.write_to(writer)?;
                writer.write_dictionary_object_ref_entry(state.state_name(), oref)?;
            }
            writer.end_dictionary()?;
            writer.end_dictionary_entry()?;
        }

        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(root)
    }
}

/// The document-level interactive form collection.
#[derive(Debug)]
pub struct AcroForm {
    name: &'static str,
    fields: Vec<FieldWidget>,
    need_appearances: bool,
    default_appearance: String,
}

impl AcroForm {
    /// Create an empty form.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
            need_appearances: true,
            default_appearance: "/Helv 12 Tf 0 g".to_string(),
        }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// True when no fields have been registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Register a field widget.
    pub fn register(&mut self, field: FieldWidget) -> ArtefactToken {
        self.fields.push(field);
        ArtefactToken(self.fields.len() - 1)
    }

    /// Close a registration; the token only has to be one this form issued.
    pub fn close(&mut self, token: ArtefactToken) -> Result<()> {
        if token.0 < self.fields.len() {
            Ok(())
        } else {
            Err(Error::UnbalancedArtefact(self.name.to_string()))
        }
    }

    /// Serialize the AcroForm dictionary and every field under it.
    pub fn write_to<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<Option<ObjectRef>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        let form = writer.begin_object()?;
        writer.begin_dictionary()?;
        writer.begin_dictionary_entry("Fields")?;
        writer.begin_array()?;
        for field in &self.fields {
            writer.begin_array_entry()?;
            let oref = field.write_to(writer)?;
            writer.write_object_ref(oref)?;
            writer.end_array_entry()?;
        }
        writer.end_array()?;
        writer.end_dictionary_entry()?;
        writer.write_dictionary_boolean_entry("NeedAppearances", self.need_appearances)?;
        writer.write_dictionary_string_entry("DA", &self.default_appearance)?;
        if self
            .fields
            .iter()
            .any(|f| f.field_type == FieldType::Signature)
        {
            writer.write_dictionary_number_entry("SigFlags", 3)?;
        }
        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(Some(form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;

    fn writer() -> PdfWriter<Vec<u8>> {
        PdfWriter::new(Vec::new(), WriterConfig::default())
    }

    fn output(w: PdfWriter<Vec<u8>>) -> String {
        String::from_utf8_lossy(&w.into_inner()).into_owned()
    }

    #[test]
    fn test_empty_form_returns_none() {
        let mut form = AcroForm::new("AcroForm");
        let mut w = writer();
        assert!(form.write_to(&mut w).unwrap().is_none());
    }

    #[test]
    fn test_widget_dictionary_entries() {
        let mut form = AcroForm::new("AcroForm");
        let field = FieldWidget::new("surname", FieldType::Text, [72.0, 600.0, 244.0, 618.0])
            .with_value("Bloggs")
            .with_default_value("")
            .with_flags(FieldFlags::REQUIRED);
        form.register(field);

        let mut w = writer();
        form.write_to(&mut w).unwrap().unwrap();
        let text = output(w);
        assert!(text.contains("/Subtype /Widget"));
        assert!(text.contains("/T (surname)"));
        assert!(text.contains("/V (Bloggs)"));
        assert!(text.contains("/FT /Tx"));
        assert!(text.contains("/Ff 2"));
        assert!(text.contains("/Rect [72 600 244 618]"));
        assert!(text.contains("/NeedAppearances true"));
    }

    #[test]
    fn test_appearance_states_map_to_n_r_d() {
        let mut form = AcroForm::new("AcroForm");
        let mut field = FieldWidget::new("ok", FieldType::Button, [0.0, 0.0, 40.0, 18.0]);
        for state in [
            AppearanceState::Normal,
            AppearanceState::Over,
            AppearanceState::Down,
        ] {
            field.set_appearance(
                state,
                AppearanceStream::new([0.0, 0.0, 40.0, 18.0], b"0 0 40 18 re f".to_vec()),
            );
        }
        form.register(field);

        let mut w = writer();
        form.write_to(&mut w).unwrap().unwrap();
        let text = output(w);
        // the appearance streams land before the field dictionary closes
        assert!(text.contains("/Subtype /Form"));
        assert!(text.contains("/N 3 0 R"));
        assert!(text.contains("/R 4 0 R"));
        assert!(text.contains("/D 5 0 R"));
        assert_eq!(text.matches("/FormType 1").count(), 3);
    }

    #[test]
    fn test_signature_field_sets_sig_flags() {
        let mut form = AcroForm::new("AcroForm");
        form.register(FieldWidget::new("sig", FieldType::Signature, [0.0; 4]));
        let mut w = writer();
        form.write_to(&mut w).unwrap();
        assert!(output(w).contains("/SigFlags 3"));
    }
}

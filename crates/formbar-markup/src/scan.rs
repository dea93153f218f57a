//! Form-load scan.
//!
//! Walks well-formed (X)HTML form markup once and collects the field,
//! conditional and computed-field declarations in document order. HTML void
//! elements (`<input>`, `<br>`, ...) may be left unclosed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use formbar_model::{
    ComputedField, ConditionalId, ConditionalMode, ConditionalRecord, Datatype, FieldKind,
    FieldName, FieldRecord, FieldValue,
};

use crate::error::{MarkupError, Result};
use crate::rules::parse_rules;

const CONDITIONAL_CLASS: &str = "formbar-conditional";
const COMPUTED_CLASS: &str = "formbar-evaluate";
const READONLY_CLASS: &str = "readonly";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

type Attrs = BTreeMap<String, String>;

/// Declarations found in one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormMarkup {
    /// `evalurl` attribute of the enclosing `<form>`.
    pub eval_url: Option<String>,
    /// One record per distinct field name, in document order.
    pub fields: Vec<FieldRecord>,
    /// Conditionals in document order.
    pub conditionals: Vec<ConditionalRecord>,
    pub computed: Vec<ComputedField>,
}

impl FormMarkup {
    /// Scan form markup from a string.
    pub fn parse(markup: &str) -> Result<Self> {
        Scanner::default().run(markup)
    }

    /// Scan form markup from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let markup = fs::read_to_string(path).map_err(|source| MarkupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&markup)
    }

    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.fields.iter().find(|f| f.name.as_str() == name)
    }

    pub fn conditional(&self, id: &str) -> Option<&ConditionalRecord> {
        self.conditionals.iter().find(|c| c.id.as_str() == id)
    }
}

struct Frame {
    tag: String,
    conditional: Option<usize>,
    group: Option<String>,
}

#[derive(Default)]
struct Scanner {
    form: FormMarkup,
    field_positions: HashMap<String, usize>,
    conditional_ids: HashSet<String>,
    stack: Vec<Frame>,
    /// Field index of the `<select>` currently open, for its `<option>`s.
    select: Option<usize>,
}

impl Scanner {
    fn run(mut self, markup: &str) -> Result<FormMarkup> {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(true);
        reader.config_mut().check_end_names = false;

        loop {
            let position = byte_position(&reader);
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let tag = tag_name(&e);
                    let attrs = attributes(&e, &reader, position)?;
                    let (frame, field) = self.open(&tag, &attrs, position)?;
                    if tag == "textarea" {
                        let end = e.to_end().into_owned();
                        let text = reader
                            .read_text(end.name())
                            .map_err(|source| MarkupError::Xml { position, source })?;
                        if let Some(index) = field {
                            self.form.fields[index].value = FieldValue::scalar(text.trim());
                        }
                    } else if !VOID_ELEMENTS.contains(&tag.as_str()) {
                        self.stack.push(frame);
                    }
                }
                Ok(Event::Empty(e)) => {
                    let tag = tag_name(&e);
                    let attrs = attributes(&e, &reader, position)?;
                    self.open(&tag, &attrs, position)?;
                }
                Ok(Event::End(e)) => {
                    let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                    self.close(&tag);
                }
                Ok(Event::Eof) => break,
                Err(source) => {
                    return Err(MarkupError::Xml {
                        position: byte_position(&reader),
                        source,
                    });
                }
                _ => {}
            }
        }

        for field in &mut self.form.fields {
            field.refresh_decoration();
        }
        info!(
            fields = self.form.fields.len(),
            conditionals = self.form.conditionals.len(),
            computed = self.form.computed.len(),
            "scanned form markup"
        );
        Ok(self.form)
    }

    fn open(
        &mut self,
        tag: &str,
        attrs: &Attrs,
        position: u64,
    ) -> Result<(Frame, Option<usize>)> {
        let classes: Vec<&str> = attrs
            .get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        let group = attrs
            .get("formgroup")
            .cloned()
            .or_else(|| self.stack.last().and_then(|f| f.group.clone()));

        if tag == "form" {
            if let Some(url) = attrs.get("evalurl") {
                self.form.eval_url = Some(url.clone());
            }
        }

        let conditional = if classes.contains(&CONDITIONAL_CLASS) {
            Some(self.add_conditional(tag, attrs, &classes, position)?)
        } else {
            None
        };
        if classes.contains(&COMPUTED_CLASS) {
            self.add_computed(tag, attrs, position)?;
        }

        let field = self.add_field(tag, attrs, group.as_deref())?;
        match tag {
            "select" => self.select = field,
            "option" if flag(attrs, "selected") => {
                if let (Some(index), Some(value)) = (self.select, attrs.get("value")) {
                    self.form.fields[index].value = FieldValue::scalar(value.as_str());
                }
            }
            _ => {}
        }

        let frame = Frame {
            tag: tag.to_string(),
            conditional,
            group,
        };
        Ok((frame, field))
    }

    fn close(&mut self, tag: &str) {
        if VOID_ELEMENTS.contains(&tag) {
            return;
        }
        if let Some(pos) = self.stack.iter().rposition(|f| f.tag == tag) {
            for frame in self.stack.drain(pos..) {
                if frame.tag == "select" {
                    self.select = None;
                }
            }
        }
    }

    fn add_conditional(
        &mut self,
        tag: &str,
        attrs: &Attrs,
        classes: &[&str],
        position: u64,
    ) -> Result<usize> {
        let expr = attrs
            .get("expr")
            .ok_or_else(|| MarkupError::MissingExpr {
                element: tag.to_string(),
                position,
            })?
            .trim()
            .to_string();
        let index = self.form.conditionals.len();
        let id = match attrs.get("id") {
            Some(id) => ConditionalId::new(id.as_str())?,
            None => ConditionalId::generated(index),
        };
        if !self.conditional_ids.insert(id.as_str().to_string()) {
            return Err(MarkupError::DuplicateConditional(id.as_str().to_string()));
        }
        let mode = if classes.contains(&READONLY_CLASS) {
            ConditionalMode::ReadOnly
        } else {
            ConditionalMode::Visibility
        };
        let reset_on_deactivate = attrs.get("reset-value").map(String::as_str) == Some("true");
        debug!(conditional = %id, %mode, reset_on_deactivate, "found conditional");
        self.form.conditionals.push(ConditionalRecord {
            id,
            expr,
            governs: Vec::new(),
            reset_on_deactivate,
            mode,
            position: index,
        });
        Ok(index)
    }

    fn add_computed(&mut self, tag: &str, attrs: &Attrs, position: u64) -> Result<()> {
        let expr = attrs.get("expr").ok_or_else(|| MarkupError::MissingExpr {
            element: tag.to_string(),
            position,
        })?;
        let id = attrs
            .get("id")
            .cloned()
            .unwrap_or_else(|| format!("computed-{}", self.form.computed.len()));
        self.form.computed.push(ComputedField {
            id,
            expr: expr.trim().to_string(),
        });
        Ok(())
    }

    fn add_field(&mut self, tag: &str, attrs: &Attrs, group: Option<&str>) -> Result<Option<usize>> {
        let Some(raw_name) = attrs.get("name") else {
            return Ok(None);
        };
        let kind = match tag {
            "input" => {
                let input_type = attrs.get("type").map_or("text", String::as_str);
                match input_type.parse::<FieldKind>() {
                    Ok(kind) => kind,
                    Err(_) => {
                        debug!(name = %raw_name, input_type, "skipping non-field input");
                        return Ok(None);
                    }
                }
            }
            "select" => FieldKind::Select,
            "textarea" => FieldKind::Textarea,
            "div" | "span" => FieldKind::Static,
            _ => return Ok(None),
        };

        let name = FieldName::new(raw_name.as_str())?;
        let index = match self.field_positions.get(name.as_str()) {
            Some(&index) => index,
            None => {
                let record = new_record(name.clone(), kind, attrs, group);
                let index = self.form.fields.len();
                self.form.fields.push(record);
                self.field_positions.insert(name.as_str().to_string(), index);
                index
            }
        };

        let record = &mut self.form.fields[index];
        if record.kind == kind {
            apply_initial_value(record, attrs);
        }
        for frame in &self.stack {
            if let Some(ci) = frame.conditional {
                let conditional = &mut self.form.conditionals[ci];
                if !conditional.governs_field(name.as_str()) {
                    conditional.governs.push(name.clone());
                }
            }
        }
        Ok(Some(index))
    }
}

fn new_record(name: FieldName, kind: FieldKind, attrs: &Attrs, group: Option<&str>) -> FieldRecord {
    let mut record = FieldRecord::new(name, kind);
    record.required = flag(attrs, "required");
    record.desired = flag(attrs, "desired");
    record.group = group.map(str::to_string);
    if let Some(raw) = attrs.get("datatype") {
        record.datatype = raw.parse::<Datatype>().unwrap_or_else(|err| {
            warn!(field = %record.name, "{err}; treating as unset");
            Datatype::Unset
        });
    }
    if let Some(rules) = attrs.get("rules") {
        record.rules = parse_rules(rules);
    }
    record
}

fn apply_initial_value(record: &mut FieldRecord, attrs: &Attrs) {
    let value = attrs.get("value").map(String::as_str);
    match record.kind {
        FieldKind::Checkbox => {
            if let (true, Some(value)) = (flag(attrs, "checked"), value) {
                if let FieldValue::List(items) = &mut record.value {
                    if !value.is_empty() {
                        items.push(value.to_string());
                    }
                }
            }
        }
        FieldKind::Radio => {
            if let (true, Some(value)) = (flag(attrs, "checked"), value) {
                record.value = FieldValue::scalar(value);
            }
        }
        FieldKind::Text | FieldKind::Hidden | FieldKind::Static => {
            if let Some(value) = value {
                record.value = FieldValue::scalar(value);
            }
        }
        FieldKind::Select | FieldKind::Textarea => {}
    }
}

/// HTML boolean attribute: present and not spelled `false`.
fn flag(attrs: &Attrs, key: &str) -> bool {
    attrs
        .get(key)
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("false"))
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase()
}

fn attributes(e: &BytesStart<'_>, reader: &Reader<&[u8]>, position: u64) -> Result<Attrs> {
    let mut attrs = Attrs::new();
    for attr in e.html_attributes() {
        let attr = attr.map_err(|err| MarkupError::Attribute {
            position,
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|source| MarkupError::Xml { position, source })?;
        attrs.insert(key, value.into_owned());
    }
    Ok(attrs)
}

fn byte_position(reader: &Reader<&[u8]>) -> u64 {
    u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX)
}

//! Manifest parsing.
//!
//! Manifests are XML documents of the form:
//!
//! ```text
//! <package xmlns="...">
//!   <metadata>
//!     <id>Newtonsoft.Json</id>
//!     <version>13.0.3</version>
//!     <title>Json.NET</title>
//!     <authors>James Newton-King</authors>
//!     <description>Json.NET is a popular high-performance JSON framework</description>
//!   </metadata>
//! </package>
//! ```
//!
//! Element names are matched on their local name, so namespace prefixes and
//! schema versions do not matter. Elements outside `package/metadata` and
//! unknown metadata elements are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::core::PackageIdentity;
use super::error::{PackageError, PackageResult};
use super::id::PackageId;
use super::version::PackageVersion;

/// Path of the element holding the identity fields.
const METADATA_PATH: [&str; 2] = ["package", "metadata"];

/// Depth of a field element: `package/metadata/<field>`.
const FIELD_DEPTH: usize = METADATA_PATH.len() + 1;

/// Metadata elements the parser reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Version,
    Title,
    Authors,
    Description,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "version" => Some(Self::Version),
            "title" => Some(Self::Title),
            "authors" => Some(Self::Authors),
            "description" => Some(Self::Description),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Version => "version",
            Self::Title => "title",
            Self::Authors => "authors",
            Self::Description => "description",
        }
    }

    /// Identity fields may appear only once.
    fn is_identity(self) -> bool {
        matches!(self, Self::Id | Self::Version)
    }
}

/// Raw text of the recognised metadata fields, exactly as written.
#[derive(Debug, Default)]
struct RawMetadata {
    id: Option<String>,
    version: Option<String>,
    title: Option<String>,
    authors: Option<String>,
    description: Option<String>,
}

impl RawMetadata {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Id => &mut self.id,
            Field::Version => &mut self.version,
            Field::Title => &mut self.title,
            Field::Authors => &mut self.authors,
            Field::Description => &mut self.description,
        }
    }
}

/// Parse manifest bytes into a validated [`PackageIdentity`].
///
/// Pure function, no I/O. Surrounding whitespace is trimmed from `id` and
/// `version` only; descriptive fields are returned verbatim. When a
/// descriptive field is repeated the first occurrence wins.
///
/// # Errors
///
/// Returns [`PackageError::InvalidManifest`] if the XML is malformed, if `id`
/// or `version` is missing, empty or repeated, or if either fails
/// validation.
pub fn parse_manifest(bytes: &[u8]) -> PackageResult<PackageIdentity> {
    let raw = read_metadata(bytes)?;

    let id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PackageError::InvalidManifest("manifest has no <id>".to_string()))?;
    let version = raw
        .version
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PackageError::InvalidManifest("manifest has no <version>".to_string()))?;

    let mut identity = PackageIdentity::new(PackageId::parse(id)?, PackageVersion::parse(version)?);
    identity.title = raw.title;
    identity.authors = raw.authors;
    identity.description = raw.description;
    Ok(identity)
}

fn read_metadata(bytes: &[u8]) -> PackageResult<RawMetadata> {
    let mut reader = Reader::from_reader(bytes);

    let mut raw = RawMetadata::default();
    let mut path: Vec<String> = Vec::new();
    // Field currently collecting text; `None` inside ignored or repeated elements.
    let mut current: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) => {
                let name = start.local_name();
                path.push(String::from_utf8_lossy(name.as_ref()).into_owned());
                if let Some(field) = metadata_field(&path) {
                    current = open_field(&mut raw, field)?;
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
                if path.len() < FIELD_DEPTH {
                    current = None;
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(field) = collecting(current, &path) {
                    let value = text.unescape().map_err(|e| malformed(&reader, e))?;
                    push_text(&mut raw, field, &value);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(field) = collecting(current, &path) {
                    push_text(&mut raw, field, &String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(&reader, e)),
        }
        buf.clear();
    }

    Ok(raw)
}

/// The recognised field named by `path`, if it sits directly under metadata.
fn metadata_field(path: &[String]) -> Option<Field> {
    let [package, metadata, field] = path else {
        return None;
    };
    if package != METADATA_PATH[0] || metadata != METADATA_PATH[1] {
        return None;
    }
    Field::from_name(field)
}

/// Start collecting a field, or skip it if it was already seen.
fn open_field(raw: &mut RawMetadata, field: Field) -> PackageResult<Option<Field>> {
    let slot = raw.slot(field);
    if slot.is_some() {
        if field.is_identity() {
            return Err(PackageError::InvalidManifest(format!(
                "manifest has more than one <{}>",
                field.tag()
            )));
        }
        return Ok(None);
    }
    *slot = Some(String::new());
    Ok(Some(field))
}

/// Text belongs to a field only at the field's own depth, not in children.
fn collecting(current: Option<Field>, path: &[String]) -> Option<Field> {
    current.filter(|_| path.len() == FIELD_DEPTH)
}

/// Text can arrive in several events (text around a CDATA section).
fn push_text(raw: &mut RawMetadata, field: Field, value: &str) {
    if let Some(text) = raw.slot(field) {
        text.push_str(value);
    }
}

fn malformed<R>(reader: &Reader<R>, err: impl std::fmt::Display) -> PackageError {
    PackageError::InvalidManifest(format!(
        "malformed XML at byte {}: {}",
        reader.buffer_position(),
        err
    ))
}

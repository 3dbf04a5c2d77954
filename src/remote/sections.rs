//! Plex `/library/sections` listing parser.
//!
//! The listing looks like:
//!
//! ```xml
//! <MediaContainer size="1">
//!   <Directory key="3" title="Movies" type="movie">
//!     <Location id="1" path="/media/movies"/>
//!   </Directory>
//! </MediaContainer>
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::RemoteError;
use crate::Result;

/// A library section as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySection {
    /// Section key used in refresh requests.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Library type (`movie`, `show`, `artist`, ...).
    pub kind: Option<String>,
    /// Storage paths backing this library.
    pub locations: Vec<String>,
}

impl LibrarySection {
    /// Create a section with the given locations.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        locations: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: None,
            locations: locations.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parse a section listing.
///
/// `<Directory>` elements without a `key` cannot be refreshed and are
/// dropped. Locations outside a `<Directory>` are ignored.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML.
pub fn parse_sections(xml: &str) -> Result<Vec<LibrarySection>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut sections = Vec::new();
    let mut current: Option<LibrarySection> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"Directory" => {
                current = section_from(e)?;
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"Directory" => {
                if let Some(section) = section_from(e)? {
                    sections.push(section);
                }
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e)) if e.name().as_ref() == b"Location" => {
                if let (Some(section), Some(path)) = (current.as_mut(), attribute(e, "path")?) {
                    section.locations.push(path);
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"Directory" => {
                if let Some(section) = current.take() {
                    sections.push(section);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(RemoteError::Parse(format!(
                    "invalid section listing at byte {}: {e}",
                    reader.error_position()
                ))
                .into());
            }
            _ => {}
        }
    }

    tracing::debug!(count = sections.len(), "Parsed library sections");
    Ok(sections)
}

fn section_from(e: &BytesStart<'_>) -> Result<Option<LibrarySection>> {
    let Some(id) = attribute(e, "key")? else {
        tracing::debug!("Skipping library section without key");
        return Ok(None);
    };
    Ok(Some(LibrarySection {
        id,
        title: attribute(e, "title")?.unwrap_or_default(),
        kind: attribute(e, "type")?,
        locations: Vec::new(),
    }))
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|err| RemoteError::Parse(format!("bad attribute '{name}': {err}")))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|err| {
                crate::Error::from(RemoteError::Parse(format!("bad value for '{name}': {err}")))
            })
    })
    .transpose()
}

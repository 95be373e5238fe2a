//! Pad definition parser.
//!
//! Pad files describe the custom character tables shown next to the keyboard:
//!
//! ```xml
//! <input-pad>
//!   <pad>
//!     <group>
//!       <name>Latin</name>
//!       <table column="10">
//!         <name>Accented</name>
//!         <chars>0xc0 0xc1 0xc2</chars>
//!       </table>
//!     </group>
//!   </pad>
//! </input-pad>
//! ```
//!
//! Parsing is strict: a missing required element fails the whole file, and a
//! failing file fails the whole directory scan. Callers treat that as "custom
//! characters unavailable" and keep the rest of the panel running.

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_TABLE_COLUMN, PAD_FILE_EXTENSION, PAD_SYSTEM_DIR, USER_PAD_SUBDIR};
use crate::i18n::Translator;
use crate::models::{PadCommand, PadGroup, PadString, PadTable, TablePayload};

/// Structural problems inside a pad document.
#[derive(Debug, Error)]
pub enum PadSyntaxError {
    /// The XML itself is not well formed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    /// An attribute could not be parsed
    #[error("attribute error: {0}")]
    Attribute(#[from] AttrError),
    /// The document has no root element
    #[error("document has no root element")]
    MissingRoot,
    /// The root element is not `<input-pad>`
    #[error("the first tag should be <input-pad>, found <{0}>")]
    UnexpectedRoot(String),
    /// A required child element is missing
    #[error("<{parent}> does not contain a <{child}> element")]
    MissingElement {
        /// Element that should contain `child`
        parent: &'static str,
        /// The missing element
        child: &'static str,
    },
    /// An element that must have content is empty
    #[error("<{0}> does not have content")]
    EmptyElement(String),
    /// The column setting is not a positive integer
    #[error("invalid column value {0:?}")]
    InvalidColumn(String),
    /// A table mixes several content kinds
    #[error("table {table:?} mixes <{first}> with <{second}>")]
    MixedTableContent {
        /// Table name, when already known
        table: String,
        /// Kind seen first
        first: &'static str,
        /// Conflicting kind
        second: &'static str,
    },
    /// The document ended inside an element
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
}

/// Failure to load pad definitions from disk.
#[derive(Debug, Error)]
pub enum PadError {
    /// The file could not be read
    #[error("failed to read pad file {}", .path.display())]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
    /// The file is not a valid pad definition
    #[error("malformed pad file {} at byte {position}: {source}", .path.display())]
    Malformed {
        /// File being parsed
        path: PathBuf,
        /// Byte offset reached when the error was detected
        position: usize,
        /// What was wrong
        #[source]
        source: PadSyntaxError,
    },
}

impl PadError {
    /// File the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}

type SyntaxResult<T> = Result<T, PadSyntaxError>;

/// Parses pad definition files into [`PadGroup`]s.
pub struct PadParser<'t> {
    translator: &'t dyn Translator,
    domain: Option<String>,
}

impl<'t> PadParser<'t> {
    /// Creates a parser that runs user-facing text through `translator`.
    pub fn new(translator: &'t dyn Translator) -> Self {
        Self {
            translator,
            domain: None,
        }
    }

    /// Sets the message domain passed to the translator.
    #[must_use]
    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    /// Parses an in-memory pad document.
    pub fn parse_str(&self, xml: &str) -> SyntaxResult<Vec<PadGroup>> {
        self.parse_document(xml).map_err(|(_, err)| err)
    }

    /// Parses one pad file.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<PadGroup>, PadError> {
        let content = fs::read_to_string(path).map_err(|source| PadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.parse_document(&content)
            .map_err(|(position, source)| PadError::Malformed {
                path: path.to_path_buf(),
                position,
                source,
            })
    }

    /// Parses `path` and appends its groups to `groups`.
    ///
    /// On failure `groups` is left untouched. Returns the number of groups
    /// added.
    pub fn append_from_file(&self, path: &Path, groups: &mut Vec<PadGroup>) -> Result<usize, PadError> {
        let parsed = self.parse_file(path)?;
        let added = parsed.len();
        groups.extend(parsed);
        debug!("Loaded {} pad group(s) from {}", added, path.display());
        Ok(added)
    }

    /// Parses every pad file of `system_dir` and then `user_dir`.
    ///
    /// Missing directories contribute nothing. Any malformed file fails the
    /// whole scan.
    pub fn parse_directory(&self, system_dir: &Path, user_dir: Option<&Path>) -> Result<Vec<PadGroup>, PadError> {
        let files = collect_pad_files(system_dir, user_dir);

        let mut groups = Vec::new();
        for file in &files {
            self.append_from_file(file, &mut groups)?;
        }
        Ok(groups)
    }

    fn parse_document(&self, xml: &str) -> Result<Vec<PadGroup>, (usize, PadSyntaxError)> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc = PadDocument {
            reader,
            parser: self,
        };
        doc.parse_root()
            .map_err(|err| (doc.reader.buffer_position(), err))
    }

    fn translate(&self, text: &str) -> String {
        self.translator.translate(self.domain.as_deref(), text)
    }
}

/// Streaming walk over one document.
struct PadDocument<'x, 'p, 't> {
    reader: Reader<&'x [u8]>,
    parser: &'p PadParser<'t>,
}

impl<'x> PadDocument<'x, '_, '_> {
    fn parse_root(&mut self) -> SyntaxResult<Vec<PadGroup>> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    let name = element_name(&e);
                    if name != "input-pad" {
                        return Err(PadSyntaxError::UnexpectedRoot(name));
                    }
                    return self.parse_input_pad();
                }
                Event::Empty(e) => {
                    let name = element_name(&e);
                    if name != "input-pad" {
                        return Err(PadSyntaxError::UnexpectedRoot(name));
                    }
                    return Err(PadSyntaxError::EmptyElement(name));
                }
                Event::Eof => return Err(PadSyntaxError::MissingRoot),
                _ => {}
            }
        }
    }

    fn parse_input_pad(&mut self) -> SyntaxResult<Vec<PadGroup>> {
        let mut groups = None;

        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"pad" => {
                    if groups.is_some() {
                        debug!("Ignoring additional <pad> section");
                        self.skip(&e)?;
                    } else {
                        groups = Some(self.parse_pad()?);
                    }
                }
                Event::Empty(e) if e.name().as_ref() == b"pad" => {
                    return Err(PadSyntaxError::EmptyElement(element_name(&e)));
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof("input-pad".into())),
                _ => {}
            }
        }

        groups.ok_or(PadSyntaxError::MissingElement {
            parent: "input-pad",
            child: "pad",
        })
    }

    fn parse_pad(&mut self) -> SyntaxResult<Vec<PadGroup>> {
        let mut groups = Vec::new();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"group" => {
                    groups.push(self.parse_group()?);
                }
                Event::Empty(e) if e.name().as_ref() == b"group" => {
                    return Err(PadSyntaxError::EmptyElement(element_name(&e)));
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof("pad".into())),
                _ => {}
            }
        }

        if groups.is_empty() {
            return Err(PadSyntaxError::MissingElement {
                parent: "pad",
                child: "group",
            });
        }
        Ok(groups)
    }

    fn parse_group(&mut self) -> SyntaxResult<PadGroup> {
        let mut name = None;
        let mut tables = Vec::new();

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"name" => {
                        let text = self.read_text("name")?;
                        name = Some(self.parser.translate(&text));
                    }
                    b"table" => tables.push(self.parse_table(&e)?),
                    _ => self.skip(&e)?,
                },
                Event::Empty(e) if matches!(e.name().as_ref(), b"name" | b"table") => {
                    return Err(PadSyntaxError::EmptyElement(element_name(&e)));
                }
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof("group".into())),
                _ => {}
            }
        }

        let name = name.ok_or(PadSyntaxError::MissingElement {
            parent: "group",
            child: "name",
        })?;
        if tables.is_empty() {
            return Err(PadSyntaxError::MissingElement {
                parent: "group",
                child: "table",
            });
        }
        Ok(PadGroup { name, tables })
    }

    fn parse_table(&mut self, start: &BytesStart<'_>) -> SyntaxResult<PadTable> {
        let mut name: Option<String> = None;
        let mut column = DEFAULT_TABLE_COLUMN;
        let mut payload: Option<TablePayload> = None;

        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"column" {
                column = parse_column(&attr.unescape_value()?)?;
            }
        }

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"name" => {
                        let text = self.read_text("name")?;
                        name = Some(self.parser.translate(&text));
                    }
                    b"column" => column = parse_column(&self.read_text("column")?)?,
                    b"chars" => {
                        ensure_no_payload(&payload, name.as_deref(), "chars")?;
                        payload = Some(TablePayload::Chars(self.read_text("chars")?));
                    }
                    b"keys" => {
                        ensure_no_payload(&payload, name.as_deref(), "keys")?;
                        payload = Some(TablePayload::Keysyms(self.parse_keys()?));
                    }
                    b"string" => {
                        let entry = self.parse_string()?;
                        match payload.as_mut() {
                            None => payload = Some(TablePayload::Strings(vec![entry])),
                            Some(TablePayload::Strings(entries)) => entries.push(entry),
                            Some(other) => return Err(mixed(name.as_deref(), other, "string")),
                        }
                    }
                    b"command" => {
                        let entry = self.parse_command()?;
                        match payload.as_mut() {
                            None => payload = Some(TablePayload::Commands(vec![entry])),
                            Some(TablePayload::Commands(entries)) => entries.push(entry),
                            Some(other) => return Err(mixed(name.as_deref(), other, "command")),
                        }
                    }
                    _ => self.skip(&e)?,
                },
                Event::Empty(e)
                    if matches!(
                        e.name().as_ref(),
                        b"name" | b"column" | b"chars" | b"keys" | b"string" | b"command"
                    ) =>
                {
                    return Err(PadSyntaxError::EmptyElement(element_name(&e)));
                }
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof("table".into())),
                _ => {}
            }
        }

        let name = name.ok_or(PadSyntaxError::MissingElement {
            parent: "table",
            child: "name",
        })?;
        let payload = payload.ok_or(PadSyntaxError::MissingElement {
            parent: "table",
            child: "chars",
        })?;
        Ok(PadTable {
            name,
            column,
            payload,
        })
    }

    fn parse_keys(&mut self) -> SyntaxResult<String> {
        let mut keysyms = None;

        loop {
            match self.reader.read_event()? {
                Event::Start(e) if e.name().as_ref() == b"keysyms" => {
                    keysyms = Some(self.read_text("keysyms")?);
                }
                Event::Empty(e) if e.name().as_ref() == b"keysyms" => {
                    return Err(PadSyntaxError::EmptyElement(element_name(&e)));
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof("keys".into())),
                _ => {}
            }
        }

        keysyms.ok_or(PadSyntaxError::MissingElement {
            parent: "keys",
            child: "keysyms",
        })
    }

    fn parse_string(&mut self) -> SyntaxResult<PadString> {
        let mut label = None;
        let mut comment = None;
        let mut rawtext = None;

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    // The label is the character itself and stays untranslated.
                    b"label" => label = Some(self.read_text("label")?),
                    b"comment" => {
                        let text = self.read_text("comment")?;
                        comment = Some(self.parser.translate(&text));
                    }
                    b"rawtext" => {
                        let text = self.read_text("rawtext")?;
                        rawtext = Some(self.parser.translate(&text));
                    }
                    _ => self.skip(&e)?,
                },
                Event::Empty(e) if matches!(e.name().as_ref(), b"label" | b"comment" | b"rawtext") => {
                    return Err(PadSyntaxError::EmptyElement(element_name(&e)));
                }
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof("string".into())),
                _ => {}
            }
        }

        let label = label.ok_or(PadSyntaxError::MissingElement {
            parent: "string",
            child: "label",
        })?;
        Ok(PadString {
            label,
            comment,
            rawtext,
        })
    }

    fn parse_command(&mut self) -> SyntaxResult<PadCommand> {
        let mut label = None;
        let mut execl = None;

        loop {
            match self.reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"label" => {
                        let text = self.read_text("label")?;
                        label = Some(self.parser.translate(&text));
                    }
                    b"execl" => execl = Some(self.read_text("execl")?),
                    _ => self.skip(&e)?,
                },
                Event::Empty(e) if matches!(e.name().as_ref(), b"label" | b"execl") => {
                    return Err(PadSyntaxError::EmptyElement(element_name(&e)));
                }
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof("command".into())),
                _ => {}
            }
        }

        let execl = execl.ok_or(PadSyntaxError::MissingElement {
            parent: "command",
            child: "execl",
        })?;
        Ok(PadCommand { label, execl })
    }

    /// Reads the text content of the element just opened.
    fn read_text(&mut self, element: &str) -> SyntaxResult<String> {
        let mut text = String::new();

        loop {
            match self.reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::CData(c) => text.push_str(&self.reader.decoder().decode(&c)?),
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => break,
                Event::Eof => return Err(PadSyntaxError::UnexpectedEof(element.to_string())),
                _ => {}
            }
        }

        if text.trim().is_empty() {
            return Err(PadSyntaxError::EmptyElement(element.to_string()));
        }
        Ok(text)
    }

    fn skip(&mut self, start: &BytesStart<'x>) -> SyntaxResult<()> {
        self.reader.read_to_end(start.name())?;
        Ok(())
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn parse_column(value: &str) -> SyntaxResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(column) if column > 0 => Ok(column),
        _ => Err(PadSyntaxError::InvalidColumn(value.to_string())),
    }
}

fn ensure_no_payload(payload: &Option<TablePayload>, table: Option<&str>, tag: &'static str) -> SyntaxResult<()> {
    match payload {
        Some(existing) => Err(mixed(table, existing, tag)),
        None => Ok(()),
    }
}

fn mixed(table: Option<&str>, existing: &TablePayload, tag: &'static str) -> PadSyntaxError {
    PadSyntaxError::MixedTableContent {
        table: table.unwrap_or_default().to_string(),
        first: existing.kind().tag(),
        second: tag,
    }
}

/// Per-user pad directory: `$HOME/.config/input-pad/pad`.
///
/// Falls back to the platform home directory and finally to `/`.
#[must_use]
pub fn user_pad_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/"));
    home.join(USER_PAD_SUBDIR)
}

/// System pad directory.
#[must_use]
pub fn system_pad_dir() -> PathBuf {
    PathBuf::from(PAD_SYSTEM_DIR)
}

/// Orders pad file paths: non-empty first, then paths under `system_prefix`,
/// then lexicographically.
#[must_use]
pub fn compare_pad_paths(a: &Path, b: &Path, system_prefix: &Path) -> Ordering {
    let a_empty = a.as_os_str().is_empty();
    let b_empty = b.as_os_str().is_empty();
    match (a_empty, b_empty) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        _ => {}
    }

    let a_system = a.starts_with(system_prefix);
    let b_system = b.starts_with(system_prefix);
    match (a_system, b_system) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.cmp(b),
    }
}

/// Lists the `*.xml` files of `dir` in pad order.
///
/// A missing or unreadable directory yields an empty list.
#[must_use]
pub fn list_pad_files(dir: &Path, system_prefix: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() == io::ErrorKind::NotFound {
                debug!("Pad directory not found: {}", dir.display());
            } else {
                warn!("Cannot open pad directory {}: {}", dir.display(), err);
            }
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            let is_pad = path
                .extension()
                .is_some_and(|ext| ext == PAD_FILE_EXTENSION);
            if !is_pad {
                warn!("File extension is not {}: {}", PAD_FILE_EXTENSION, path.display());
            }
            is_pad && path.is_file()
        })
        .collect();

    files.sort_by(|a, b| compare_pad_paths(a, b, system_prefix));
    files
}

/// All pad files to load: system directory first, then the user directory.
#[must_use]
pub fn collect_pad_files(system_dir: &Path, user_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut files = list_pad_files(system_dir, system_dir);
    if let Some(user_dir) = user_dir {
        if user_dir != system_dir {
            files.extend(list_pad_files(user_dir, system_dir));
        }
    }
    files
}

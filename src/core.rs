use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::parsers::encoding::decode_document;
use crate::parsers::link_rewriter::{MarkupRewriter, RewriteOutcome};
use crate::parsers::mime::{read_archive_parts, ArchivePart, DEFAULT_CONTENT_TYPE};
use crate::resources::fonts::FontResolver;
use crate::resources::mapping::ResourceMap;
use crate::resources::output::{OutputTree, PRIMARY_DOCUMENT_NAME};
use crate::resources::writer::ResourceWriter;

/// Errors that can occur while unpacking an archive
#[derive(Debug, Error)]
pub enum UnpackError {
    #[error("cannot read archive {}: {source}", .path.display())]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input is not a MIME archive")]
    InvalidArchive,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error(
        "unsupported part (content type: {content_type}, location: {location:?}, content id: {content_id:?})"
    )]
    UnsupportedPart {
        content_type: String,
        location: String,
        content_id: String,
    },

    #[error("cannot decode HTML part {0}")]
    Decode(String),

    #[error("cannot serialize document: {0}")]
    Serialize(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Where the output tree is created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// Under the configured output directory
    #[default]
    Fixed,
    /// Next to the archive, in a directory named after the archive
    CoLocated,
}

impl FromStr for OutputLayout {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(OutputLayout::Fixed),
            "co-located" | "colocated" => Ok(OutputLayout::CoLocated),
            other => Err(format!(
                "unknown output layout \"{other}\" (expected fixed or co-located)"
            )),
        }
    }
}

/// How resource file names are chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FilenamePolicy {
    /// Sanitized original names, suffixed on collision
    #[default]
    PreserveReadable,
    /// Random tokens that keep only the extension
    AlwaysRandom,
}

impl FromStr for FilenamePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "readable" | "preserve-readable" => Ok(FilenamePolicy::PreserveReadable),
            "random" | "always-random" => Ok(FilenamePolicy::AlwaysRandom),
            other => Err(format!(
                "unknown filename policy \"{other}\" (expected readable or random)"
            )),
        }
    }
}

/// Configuration options for unpacking
///
/// Every toggle is passed explicitly to the components that need it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnpackOptions {
    pub output_layout: OutputLayout,
    /// Output directory for [`OutputLayout::Fixed`]; `%name%` and `%timestamp%` are substituted
    pub output_dir: String,
    pub filename_policy: FilenamePolicy,
    /// Fetch fonts referenced by style sheets but missing from the archive
    pub download_fonts: bool,
    /// Replace `<link rel="stylesheet">` pointing at saved style sheets with `<style>` elements
    pub inline_stylesheets: bool,
    /// Font fetch timeout in seconds
    pub timeout: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        UnpackOptions {
            output_layout: OutputLayout::default(),
            output_dir: ".".to_string(),
            filename_policy: FilenamePolicy::default(),
            download_fonts: false,
            inline_stylesheets: false,
            timeout: None,
            user_agent: None,
        }
    }
}

/// Per-document rewrite statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub title: Option<String>,
    pub replacements: usize,
    pub unresolved: BTreeSet<String>,
}

/// Result of one unpacking run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnpackSummary {
    pub output_root: PathBuf,
    /// `None` when the archive contained no usable HTML part
    pub primary_document: Option<PathBuf>,
    pub secondary_documents: Vec<PathBuf>,
    pub resources_written: usize,
    pub parts_skipped: usize,
    pub documents: Vec<DocumentReport>,
    pub total_replacements: usize,
}

impl UnpackSummary {
    pub fn unresolved_count(&self) -> usize {
        self.documents.iter().map(|d| d.unresolved.len()).sum()
    }
}

/// Stages of one unpacking run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingStage {
    WalkingParts,
    RewritingPrimary,
    RewritingSecondary,
    Done,
}

/// HTML part seen after the primary one, rewritten once the mapping table is complete
struct DeferredDocument {
    html: String,
    original: Vec<u8>,
    output_path: String,
}

impl DeferredDocument {
    /// Output path, bytes to write and rewrite result; a failed rewrite keeps the original bytes
    fn finish(
        self,
        rewritten: Result<RewriteOutcome, UnpackError>,
    ) -> (String, Vec<u8>, RewriteOutcome) {
        match rewritten {
            Ok(mut outcome) => {
                let contents = std::mem::take(&mut outcome.html).into_bytes();
                (self.output_path, contents, outcome)
            }
            Err(err) => {
                warn!("Writing {} unmodified: {}", self.output_path, err);
                (self.output_path, self.original, RewriteOutcome::default())
            }
        }
    }
}

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";
const FILE_SIGNATURES: [(&[u8], &str); 10] = [
    // Image
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"<svg", "image/svg+xml"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    // Font
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"OTTO", "font/otf"),
    (b"\x00\x01\x00\x00", "font/ttf"),
];

/// Guesses the media type of a payload from its leading bytes
pub fn detect_media_type(data: &[u8]) -> Option<&'static str> {
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    FILE_SIGNATURES
        .iter()
        .find(|(signature, _)| data.starts_with(signature))
        .map(|(_, media_type)| *media_type)
}

/// Parses Content-Type header value
pub fn parse_content_type(content_type: &str) -> (String, String, bool) {
    let mut media_type = String::new();
    let mut charset = String::new();
    let mut is_base64 = false;

    let parts: Vec<&str> = content_type.split(';').collect();

    if !parts.is_empty() {
        media_type = parts[0].trim().to_lowercase();
    }

    for part in parts.iter().skip(1) {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            if key.trim().eq_ignore_ascii_case("charset") {
                charset = value.trim().trim_matches(['"', '\'']).trim().to_string();
            }
        } else if part.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        }
    }

    (media_type, charset, is_base64)
}

/// Formats output path with archive name and timestamp substitution
pub fn format_output_path(path: &str, archive_name: &str) -> String {
    let datetime: &str = &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    path.replace("%timestamp%", &datetime.replace(':', "_"))
        .replace(
            "%name%",
            archive_name
                .replace(['/', '\\'], "_")
                .replace(':', "_")
                .trim_start_matches('.'),
        )
}

/// Decides where the output tree of an archive is created
pub fn resolve_output_root(archive_path: &Path, options: &UnpackOptions) -> PathBuf {
    let archive_name = archive_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());

    match options.output_layout {
        OutputLayout::Fixed => PathBuf::from(format_output_path(&options.output_dir, &archive_name)),
        OutputLayout::CoLocated => archive_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(archive_name),
    }
}

/// Unpacks an archive file into its output tree
///
/// ```no_run
/// use mhtml_unpack::core::{unpack_archive, UnpackOptions};
///
/// let summary = unpack_archive("page.mhtml".as_ref(), &UnpackOptions::default()).unwrap();
/// println!("{} references rewritten", summary.total_replacements);
/// ```
pub fn unpack_archive(archive_path: &Path, options: &UnpackOptions) -> Result<UnpackSummary, UnpackError> {
    let data = fs::read(archive_path).map_err(|source| UnpackError::ArchiveRead {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let output_root = resolve_output_root(archive_path, options);
    info!("Unpacking {} into {}", archive_path.display(), output_root.display());

    unpack_archive_data(&data, &output_root, options)
}

/// Unpacks archive bytes into `output_root`
pub fn unpack_archive_data(
    data: &[u8],
    output_root: &Path,
    options: &UnpackOptions,
) -> Result<UnpackSummary, UnpackError> {
    let parts = read_archive_parts(data)?;
    let processor = ArchiveProcessor::new(output_root, options)?;
    processor.process(parts)
}

/// Drives one unpacking run through its stages
///
/// The mapping table is only written while walking the parts and is read-only
/// once rewriting starts.
pub struct ArchiveProcessor {
    writer: ResourceWriter,
    map: ResourceMap,
    stage: ProcessingStage,
    inline_stylesheets: bool,
    summary: UnpackSummary,
}

impl ArchiveProcessor {
    pub fn new(output_root: &Path, options: &UnpackOptions) -> Result<Self, UnpackError> {
        let tree = OutputTree::create(output_root)?;
        let fonts = FontResolver::new(options)?;

        Ok(ArchiveProcessor {
            writer: ResourceWriter::new(tree, options.filename_policy, fonts),
            map: ResourceMap::new(),
            stage: ProcessingStage::WalkingParts,
            inline_stylesheets: options.inline_stylesheets,
            summary: UnpackSummary {
                output_root: output_root.to_path_buf(),
                ..UnpackSummary::default()
            },
        })
    }

    pub fn stage(&self) -> ProcessingStage {
        self.stage
    }

    fn enter(&mut self, stage: ProcessingStage) {
        debug!("{:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    /// Processes all parts and returns the run summary
    pub fn process(mut self, parts: Vec<ArchivePart>) -> Result<UnpackSummary, UnpackError> {
        let mut primary: Option<String> = None;
        let mut deferred: Vec<DeferredDocument> = Vec::new();

        for part in parts {
            let part = with_detected_media_type(part);

            if part.is_html() {
                self.capture_document(part, &mut primary, &mut deferred);
                continue;
            }

            match self.writer.write_part(&part, &mut self.map) {
                Ok(Some(_)) => self.summary.resources_written += 1,
                Ok(None) => {
                    debug!("Skipping empty part {}", describe_part(&part));
                    self.summary.parts_skipped += 1;
                }
                Err(err) => {
                    warn!("Skipping part: {}", err);
                    self.summary.parts_skipped += 1;
                }
            }
        }

        self.enter(ProcessingStage::RewritingPrimary);
        let Some(primary_html) = primary else {
            info!("No HTML processed");
            self.enter(ProcessingStage::Done);
            return Ok(self.summary);
        };

        let mut inlined: HashSet<String> = HashSet::new();
        let rewriter = MarkupRewriter::new(&self.map, self.writer.tree().root())
            .inline_stylesheets(self.inline_stylesheets);

        let outcome = rewriter.rewrite(&primary_html)?;
        let primary_path = self.writer.write_file(PRIMARY_DOCUMENT_NAME, outcome.html.as_bytes())?;
        inlined.extend(outcome.inlined_stylesheets);
        self.summary.primary_document = Some(primary_path.clone());
        self.summary.documents.push(report(
            primary_path,
            outcome.title,
            outcome.replacements,
            outcome.unresolved,
        ));

        self.stage = ProcessingStage::RewritingSecondary;
        debug!("{:?} -> {:?}", ProcessingStage::RewritingPrimary, self.stage);

        for document in deferred {
            let rewritten = rewriter.rewrite(&document.html);
            let (output_path, contents, outcome) = document.finish(rewritten);
            inlined.extend(outcome.inlined_stylesheets);

            match self.writer.write_file(&output_path, &contents) {
                Ok(path) => {
                    self.summary.secondary_documents.push(path.clone());
                    self.summary.documents.push(report(
                        path,
                        outcome.title,
                        outcome.replacements,
                        outcome.unresolved,
                    ));
                }
                Err(err) => warn!("Skipping nested document: {}", err),
            }
        }

        for stylesheet in inlined {
            if let Err(err) = self.writer.remove_file(&stylesheet) {
                warn!("Cannot remove inlined style sheet: {}", err);
            }
        }

        self.enter(ProcessingStage::Done);
        self.summary.total_replacements = self.summary.documents.iter().map(|d| d.replacements).sum();
        info!("Total replacements: {}", self.summary.total_replacements);

        Ok(self.summary)
    }

    /// Captures an HTML part as the primary document or defers it
    fn capture_document(
        &mut self,
        part: ArchivePart,
        primary: &mut Option<String>,
        deferred: &mut Vec<DeferredDocument>,
    ) {
        if part.payload.is_empty() {
            debug!("Skipping empty part {}", describe_part(&part));
            self.summary.parts_skipped += 1;
            return;
        }

        let Some(html) = decode_document(&part.payload, part.charset.as_deref()) else {
            warn!("Dropping part: {}", UnpackError::Decode(describe_part(&part)));
            self.summary.parts_skipped += 1;
            return;
        };

        if primary.is_none() {
            self.map.register(
                part.location.as_deref(),
                part.content_id.as_deref(),
                PRIMARY_DOCUMENT_NAME,
            );
            *primary = Some(html);
        } else {
            let output_path = self.writer.reserve_document(&part, &mut self.map);
            deferred.push(DeferredDocument {
                html,
                original: part.payload,
                output_path,
            });
        }
    }
}

/// Parts declared as generic binary data get a media type sniffed from their content
fn with_detected_media_type(mut part: ArchivePart) -> ArchivePart {
    if part.content_type == DEFAULT_CONTENT_TYPE {
        if let Some(media_type) = detect_media_type(&part.payload) {
            debug!("Detected {} for {}", media_type, describe_part(&part));
            part.content_type = media_type.to_string();
        }
    }
    part
}

fn describe_part(part: &ArchivePart) -> String {
    format!(
        "{} (location: {}, content id: {})",
        part.content_type,
        part.location.as_deref().unwrap_or("-"),
        part.content_id.as_deref().unwrap_or("-"),
    )
}

fn report(
    path: PathBuf,
    title: Option<String>,
    replacements: usize,
    unresolved: BTreeSet<String>,
) -> DocumentReport {
    match &title {
        Some(title) => info!("{} ({}): {} replacements", path.display(), title, replacements),
        None => info!("{}: {} replacements", path.display(), replacements),
    }
    if !unresolved.is_empty() {
        warn!("{} unresolved references in {}:", unresolved.len(), path.display());
        for reference in unresolved.iter() {
            warn!("  {}", reference);
        }
    }

    DocumentReport {
        path,
        title,
        replacements,
        unresolved,
    }
}

/// Prints an error message to stderr
pub fn print_error_message(msg: &str, use_color: bool) {
    if use_color {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    } else {
        eprintln!("{msg}");
    }
}

/// Prints an info message to stdout
pub fn print_info_message(msg: &str) {
    println!("{msg}");
}

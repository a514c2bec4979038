//! Editor session: one loaded map, its label inputs and its uploads.
//!
//! Loads and submissions complete asynchronously in the browser. Both carry the
//! generation they were started under, and a completion whose generation is no
//! longer current is dropped instead of applied.

use crate::config::EditorConfig;
use crate::error::{ExportError, IngestError, SubmitError};
use crate::export::{build_payload, ExportPayload};
use crate::highlight::{paint_plan, EmphasisState, Interaction, RegionPaint, Transition};
use crate::ingest::{self, MapDocument};
use crate::model::{file_stem, IncomingFile, Region};
use crate::store::RegionStore;
use serde::Serialize;

pub const EXCLUDE_GLYPH: &str = "X";
pub const EXCLUDE_COLOR: &str = "#ff4d4f";
pub const RESTORE_GLYPH: &str = "↺";
pub const RESTORE_COLOR: &str = "#f0ad4e";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ToggleAffordance {
    pub glyph: &'static str,
    pub color: &'static str,
}

/// What one input row shows, derived only from its region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub index: usize,
    pub original_id: String,
    pub placeholder: String,
    pub value: String,
    pub disabled: bool,
    pub toggle: ToggleAffordance,
}

impl RowView {
    pub fn of(region: &Region) -> RowView {
        let (value, toggle) = if region.excluded {
            (String::new(), ToggleAffordance { glyph: RESTORE_GLYPH, color: RESTORE_COLOR })
        } else {
            (region.label.clone(), ToggleAffordance { glyph: EXCLUDE_GLYPH, color: EXCLUDE_COLOR })
        };
        RowView {
            index: region.index,
            original_id: region.original_id.clone(),
            placeholder: region.original_id.clone(),
            value,
            disabled: region.excluded,
            toggle,
        }
    }
}

/// A parsed map and everything the user has done to it.
#[derive(Clone, Debug)]
pub struct LoadedMap {
    source: String,
    preview: String,
    file_name: Option<String>,
    store: RegionStore,
    emphasis: EmphasisState,
}

impl LoadedMap {
    pub fn new(doc: MapDocument, file_name: Option<String>) -> LoadedMap {
        LoadedMap {
            source: doc.source,
            preview: doc.preview,
            file_name,
            store: RegionStore::new(doc.regions),
            emphasis: EmphasisState::default(),
        }
    }

    pub fn source(&self) -> &str { &self.source }
    pub fn preview(&self) -> &str { &self.preview }
    pub fn file_name(&self) -> Option<&str> { self.file_name.as_deref() }
    pub fn store(&self) -> &RegionStore { &self.store }
    pub fn emphasis(&self) -> EmphasisState { self.emphasis }

    pub fn rows(&self) -> Vec<RowView> { self.store.iter().map(RowView::of).collect() }

    pub fn row(&self, index: usize) -> Option<RowView> { self.store.get(index).map(RowView::of) }

    pub fn interact(&mut self, event: Interaction) -> Transition {
        self.emphasis.apply(event, self.store.len())
    }

    pub fn paint(&self, config: &EditorConfig) -> Vec<RegionPaint> {
        paint_plan(&self.store, &self.emphasis, &config.emphasis)
    }

    pub fn input_changed(&mut self, index: usize, value: &str) -> bool {
        self.store.set_label(index, value)
    }

    /// Flips exclusion and returns the row as it must now be rendered.
    pub fn toggle_excluded(&mut self, index: usize) -> Option<RowView> {
        self.store.toggle_excluded(index)?;
        self.row(index)
    }

    pub fn set_excluded(&mut self, index: usize, excluded: bool) -> Option<RowView> {
        self.store.set_excluded(index, excluded).then(|| self.row(index)).flatten()
    }

    /// Emphasizes the first region whose name matches `query`.
    pub fn locate(&mut self, query: &str) -> Option<Transition> {
        let index = self.store.find(query)?;
        Some(self.interact(Interaction::Hover(index)))
    }

    pub fn export(&self, config: &EditorConfig) -> Result<ExportPayload, ExportError> {
        let name = config
            .payload_name
            .clone()
            .or_else(|| self.file_name.as_deref().and_then(file_stem).map(str::to_string))
            .unwrap_or_else(|| "map".to_string());
        build_payload(&self.source, &self.store, &name, config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    InvalidFileType,
    ReadFailure,
    ParseFailure,
    SubmissionSucceeded,
    SubmissionFailed,
}

/// User-facing message about the last load or upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
}

/// Identifies one upload: the document it was built from and its place among
/// the uploads of that session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitTicket {
    pub generation: u64,
    pub sequence: u64,
}

#[derive(Clone, Debug)]
pub struct PendingSubmission {
    pub ticket: SubmitTicket,
    pub endpoint: String,
    pub payload: ExportPayload,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { regions: usize },
    Stale,
}

/// HTTP status of a finished upload, or the transport failure.
pub type SubmitResult = Result<u16, String>;

#[derive(Debug, Default)]
pub struct Session {
    config: EditorConfig,
    generation: u64,
    submissions: u64,
    map: Option<LoadedMap>,
    notice: Option<Notice>,
    submission: SubmissionStatus,
}

impl Session {
    pub fn new(config: EditorConfig) -> Session {
        Session { config, ..Session::default() }
    }

    pub fn config(&self) -> &EditorConfig { &self.config }
    pub fn generation(&self) -> u64 { self.generation }
    pub fn map(&self) -> Option<&LoadedMap> { self.map.as_ref() }
    pub fn map_mut(&mut self) -> Option<&mut LoadedMap> { self.map.as_mut() }
    pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }
    pub fn submission(&self) -> &SubmissionStatus { &self.submission }

    /// True while the upload prompt should be shown.
    pub fn is_empty(&self) -> bool { self.map.is_none() }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket { generation: self.generation }
    }

    /// Applies a finished file read. Success replaces the whole document at
    /// once; failure clears it. A read superseded by a newer `begin_load`
    /// changes nothing.
    pub fn finish_load(&mut self, ticket: LoadTicket, file: IncomingFile) -> Result<LoadOutcome, IngestError> {
        if self.is_stale(ticket) {
            return Ok(LoadOutcome::Stale);
        }
        let name = file.name.clone();
        let parsed = ingest::ingest(file, &self.config);
        self.apply_load(name, parsed)
    }

    /// Records a file that could not be read at all.
    pub fn fail_load(&mut self, ticket: LoadTicket, reason: impl Into<String>) -> Result<LoadOutcome, IngestError> {
        if self.is_stale(ticket) {
            return Ok(LoadOutcome::Stale);
        }
        self.apply_load(None, Err(IngestError::Read(reason.into())))
    }

    fn is_stale(&self, ticket: LoadTicket) -> bool {
        let stale = ticket.generation != self.generation;
        if stale {
            tracing::warn!(ticket = ticket.generation, current = self.generation, "stale file read dropped");
        }
        stale
    }

    fn apply_load(
        &mut self,
        name: Option<String>,
        parsed: Result<MapDocument, IngestError>,
    ) -> Result<LoadOutcome, IngestError> {
        self.submission = SubmissionStatus::Idle;
        match parsed {
            Ok(doc) => {
                let regions = doc.regions.len();
                self.map = Some(LoadedMap::new(doc, name));
                self.notice = None;
                Ok(LoadOutcome::Loaded { regions })
            }
            Err(err) => {
                tracing::warn!(error = %err, "map rejected");
                self.map = None;
                let kind = match err {
                    IngestError::InvalidFileType { .. } => NoticeKind::InvalidFileType,
                    IngestError::Read(_) => NoticeKind::ReadFailure,
                    _ => NoticeKind::ParseFailure,
                };
                self.notice = Some(Notice { kind, message: err.to_string() });
                Err(err)
            }
        }
    }

    pub fn load(&mut self, file: IncomingFile) -> Result<LoadOutcome, IngestError> {
        let ticket = self.begin_load();
        self.finish_load(ticket, file)
    }

    /// Drops the document and returns to the upload prompt.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.map = None;
        self.notice = None;
        self.submission = SubmissionStatus::Idle;
    }

    pub fn begin_submit(&mut self) -> Result<PendingSubmission, ExportError> {
        let map = self.map.as_ref().ok_or(ExportError::NothingLoaded)?;
        let payload = map.export(&self.config)?;
        self.submissions += 1;
        self.submission = SubmissionStatus::InFlight;
        Ok(PendingSubmission {
            ticket: SubmitTicket { generation: self.generation, sequence: self.submissions },
            endpoint: self.config.endpoint.clone(),
            payload,
        })
    }

    /// Records how an upload ended. Local edits are never rolled back; an
    /// upload for a document that has since been replaced, or one overtaken by
    /// a newer upload, only gets logged.
    pub fn finish_submit(&mut self, ticket: SubmitTicket, result: SubmitResult) -> Result<(), SubmitError> {
        let outcome = match result {
            Ok(status) if (200..300).contains(&status) => Ok(()),
            Ok(status) => Err(SubmitError::Status(status)),
            Err(reason) => Err(SubmitError::Transport(reason)),
        };
        if ticket.generation != self.generation {
            tracing::warn!(ticket = ticket.generation, ok = outcome.is_ok(), "upload finished for a replaced map");
            return outcome;
        }
        if ticket.sequence != self.submissions {
            tracing::warn!(
                ticket = ticket.sequence,
                latest = self.submissions,
                ok = outcome.is_ok(),
                "superseded upload finished"
            );
            return outcome;
        }
        match &outcome {
            Ok(()) => {
                tracing::info!("map uploaded");
                self.submission = SubmissionStatus::Succeeded;
                self.notice = Some(Notice {
                    kind: NoticeKind::SubmissionSucceeded,
                    message: "map uploaded".to_string(),
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "map upload failed");
                self.submission = SubmissionStatus::Failed(err.to_string());
                self.notice = Some(Notice { kind: NoticeKind::SubmissionFailed, message: err.to_string() });
            }
        }
        outcome
    }
}

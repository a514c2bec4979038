//! Region-mapping editor core: load a map SVG, rename or exclude its path
//! regions, keep map and input-list emphasis in sync, and export the edited
//! map with an original-to-new id mapping.

pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod highlight;
pub mod ingest;
pub mod limits;
pub mod model;
pub mod names;
pub mod sanitize;
pub mod store;

pub use config::{EditorConfig, EmphasisTheme};
pub use editor::{
    LoadOutcome, LoadTicket, LoadedMap, Notice, NoticeKind, PendingSubmission, RowView, Session,
    SubmissionStatus, SubmitResult, SubmitTicket,
};
pub use error::{ExportError, IngestError, SubmitError};
pub use export::{ExportPayload, Part};
pub use highlight::{paint_plan, EmphasisState, Interaction, RegionPaint, Transition};
pub use ingest::{ingest, ingest_text, MapDocument, SVG_MIME};
pub use model::{IncomingFile, PaintStyle, Region};
pub use store::RegionStore;

//! beth-prep - Deterministic feature engineering for BETH-style audit events
//!
//! beth-prep turns raw security-event tables (process/system-call audit logs
//! in the style of the BETH dataset) into flat feature tables through a
//! deterministic pipeline: shape validation → structured-column bucket
//! encoding → args flattening → column assembly.
//!
//! ## Modules
//!
//! - **flattener**: parses the semi-structured `args` text of each record
//!   into `{position}_{key}` columns
//! - **encoder**: fixed bucket encodings of the structured audit columns
//! - **transformer**: the stateless `fit` / `transform` pair tying it all
//!   together

pub mod encoder;
pub mod error;
pub mod flattener;
pub mod report;
pub mod transformer;
pub mod types;

pub use encoder::FeatureEncoder;
pub use error::{ArgsParseError, TransformError};
pub use flattener::{ArgsFlattener, ArgsFragment};
pub use report::RunReport;
pub use transformer::BethPrep;
pub use types::{FlatArgsRow, ParseDiagnostic, Table, TransformOutput};

/// Engine version embedded in run reports
pub const PREP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for run reports
pub const PRODUCER_NAME: &str = "beth-prep";

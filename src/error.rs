//! Rich diagnostic error types for the chronicler pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the chronicler pipeline.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum ChroniclerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Merge(#[from] MergeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Diff(#[from] DiffError),
}

// ---------------------------------------------------------------------------
// File I/O errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum IoError {
    #[error("input file not found: {path}")]
    #[diagnostic(
        code(chronicler::io::not_found),
        help("Check the path for typos. Chapter files and knowledge bases must exist before a run.")
    )]
    NotFound { path: String },

    #[error("failed to read {path}")]
    #[diagnostic(
        code(chronicler::io::read),
        help("Check file permissions and that the file is valid UTF-8.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    #[diagnostic(
        code(chronicler::io::write),
        help("Check that the output directory exists and that the disk is not full.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory: {path}")]
    #[diagnostic(
        code(chronicler::io::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("knowledge base file {path} is not valid JSON: {message}")]
    #[diagnostic(
        code(chronicler::io::malformed_kb),
        help(
            "The knowledge base must be a JSON object mapping entity names to records. \
             Start a fresh run with a file containing just `{{}}`."
        )
    )]
    MalformedKb { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Oracle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OracleError {
    #[error("failed to reach the oracle endpoint: {message}")]
    #[diagnostic(
        code(chronicler::oracle::transport),
        help(
            "Is the completion server running? Check the endpoint URL and that the \
             server is reachable. Long chapters can also exhaust the request timeout."
        )
    )]
    Transport { message: String },

    #[error("oracle endpoint returned HTTP {status}: {body}")]
    #[diagnostic(
        code(chronicler::oracle::http),
        help("Check the model name and bearer token; the server rejected the request.")
    )]
    Http { status: u16, body: String },

    #[error("oracle response body is not valid JSON: {message}")]
    #[diagnostic(
        code(chronicler::oracle::decode),
        help("The server replied 2xx but the body was not a chat-completion document.")
    )]
    Decode { message: String },

    #[error("oracle response contained no message content")]
    #[diagnostic(
        code(chronicler::oracle::empty),
        help(
            "The completion arrived without a populated `choices[0].message.content` \
             field. Inspect `llm_response.txt` in the output directory for the full reply."
        )
    )]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Extraction parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("oracle output is not valid JSON: {message}")]
    #[diagnostic(
        code(chronicler::parse::invalid_json),
        help(
            "The model must emit strictly valid JSON with no surrounding commentary \
             or markdown fences. Inspect `llm_raw_output.txt` in the output directory."
        )
    )]
    InvalidJson { message: String },

    #[error("oracle output is valid JSON but not an object")]
    #[diagnostic(
        code(chronicler::parse::not_an_object),
        help("The extraction document must be a JSON object with an `entities` member.")
    )]
    NotAnObject,

    #[error("`entities` in the oracle output is not an object")]
    #[diagnostic(
        code(chronicler::parse::entities_not_an_object),
        help("`entities` must map entity names to records, e.g. {{\"Castle\": {{\"description\": ...}}}}.")
    )]
    EntitiesNotAnObject,
}

// ---------------------------------------------------------------------------
// Merge errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MergeError {
    #[error("entity \"{entity}\" has no description")]
    #[diagnostic(
        code(chronicler::merge::missing_description),
        help(
            "Every entity the oracle reports must carry a `description` field. \
             The merge is aborted whole; no partial knowledge base is written."
        )
    )]
    MissingDescription { entity: String },

    #[error("description of entity \"{entity}\" is not a string")]
    #[diagnostic(
        code(chronicler::merge::description_not_text),
        help("Descriptions must be JSON strings, not objects or numbers.")
    )]
    DescriptionNotText { entity: String },
}

// ---------------------------------------------------------------------------
// Diff errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DiffError {
    #[error("failed to read extraction file {path}")]
    #[diagnostic(
        code(chronicler::diff::read),
        help("Pass two `parsed_output.json` files produced by `chronicler run`.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction file {path} is not valid JSON: {message}")]
    #[diagnostic(
        code(chronicler::diff::malformed),
        help("Pass two `parsed_output.json` files produced by `chronicler run`.")
    )]
    Malformed { path: String, message: String },

    #[error("extraction file {path} has no `entities` object")]
    #[diagnostic(
        code(chronicler::diff::missing_entities),
        help("Only extraction documents with an `entities` member can be diffed.")
    )]
    MissingEntities { path: String },
}

/// Convenience alias for functions returning chronicler results.
pub type ChroniclerResult<T> = std::result::Result<T, ChroniclerError>;

//! Analysis layer: one compilation unit in, a stream of facts out.
//!
//! ```text
//! CompilationUnit + FileData[]
//!     ↓
//! SourceTree + DescriptorPool   (schema files, imported by relative path)
//!     ↓
//! textformat parse              (relaxed, with a ParseInfoTree)
//!     ↓
//! TextprotoAnalyzer             (schema comments, then the message walk)
//!     ↓
//! GraphRecorder                 (anchors, refs, file node, diagnostics)
//! ```

mod analyzer;
mod error;
pub mod recorder;
pub mod schema_comments;
pub mod unit;

pub use analyzer::LANGUAGE_NAME;
pub use error::AnalyzerError;
pub use recorder::{EdgeKind, GraphRecorder, NodeKind, Property, PropertyValue};
pub use unit::{CompilationUnit, FileData, FileInfo, RequiredInput, VName};

use tracing::{debug, error};

use crate::schema::{
    full_to_relative, parse_substitution_args, DescriptorPool, SourceTree, SubstitutionCache,
};
use crate::textformat::{parse_with_options, ParseOptions};

use analyzer::TextprotoAnalyzer;

/// Analyze one compilation unit end-to-end, emitting facts into `recorder`.
///
/// `files` must contain the textproto named by `unit.source_file[0]` plus
/// at least one schema file. The unit's arguments carry the path
/// substitutions and the mandatory `--proto_message`.
pub fn analyze_compilation_unit(
    unit: &CompilationUnit,
    files: &[FileData],
    recorder: &mut dyn GraphRecorder,
) -> Result<(), AnalyzerError> {
    if unit.source_file.len() != 1 {
        return Err(AnalyzerError::FailedPrecondition(
            "expected unit to contain 1 source file".to_string(),
        ));
    }
    if files.len() < 2 {
        return Err(AnalyzerError::FailedPrecondition(
            "must provide at least 2 files: a textproto and 1+ .proto files".to_string(),
        ));
    }
    let textproto_name = &unit.source_file[0];

    let (substitutions, mut args) = parse_substitution_args(&unit.argument);
    let Some(message_name) = take_proto_message_arg(&mut args) else {
        return Err(AnalyzerError::Unknown(
            "compilation unit arguments must specify --proto_message".to_string(),
        ));
    };
    debug!("proto message name: {message_name}");

    // Register schema files; the textproto itself stays out of the tree.
    let mut source_tree = SourceTree::new();
    let mut schema_paths = Vec::new();
    let mut textproto_data = None;
    for file in files {
        if &file.path == textproto_name {
            textproto_data = Some(file);
            continue;
        }
        source_tree
            .add_file(&file.path, file.content.clone())
            .map_err(|err| {
                AnalyzerError::Unknown(format!("unable to add file to source tree: {err}"))
            })?;
        schema_paths.push(file.path.clone());
    }
    let Some(textproto_data) = textproto_data else {
        return Err(AnalyzerError::NotFound(
            "couldn't find textproto source in file data".to_string(),
        ));
    };

    // Import every schema file by its relative path. Importing the same
    // file under two names would produce duplicate symbols, because proto
    // `import` statements resolve against the search root.
    let mut substitution_cache = SubstitutionCache::new();
    let relative_paths: Vec<String> = schema_paths
        .iter()
        .map(|full| full_to_relative(full, &substitutions, &mut substitution_cache))
        .collect();
    let pool = DescriptorPool::build(
        &source_tree,
        &relative_paths,
        &substitutions,
        &mut substitution_cache,
    )
    .map_err(|err| AnalyzerError::Unknown(format!("error importing proto file: {}", err.path())))?;

    let Some(descriptor) = pool.find_message_by_name(&message_name) else {
        return Err(AnalyzerError::NotFound(format!(
            "unable to find proto message in descriptor pool: {message_name}"
        )));
    };

    let content = std::str::from_utf8(&textproto_data.content).map_err(|_| {
        AnalyzerError::Unknown(format!("textproto is not valid UTF-8: {textproto_name}"))
    })?;

    // Relaxed parse: partially invalid input should still be analyzable.
    let options = ParseOptions {
        allow_unknown_extension: true,
    };
    let (message, parse_tree) = parse_with_options(content, descriptor, &pool, options)
        .map_err(|err| AnalyzerError::Unknown(format!("failed to parse text proto: {err}")))?;

    let Some(file_vname) = unit.vname_for_full_path(textproto_name) else {
        return Err(AnalyzerError::Unknown(format!(
            "unable to find vname for textproto: {textproto_name}"
        )));
    };
    let file_vname = file_vname.clone();
    recorder.add_node(&file_vname, NodeKind::File);
    recorder.add_property(
        &file_vname,
        Property::Text,
        PropertyValue::Bytes(textproto_data.content.clone()),
    );

    let mut analyzer =
        TextprotoAnalyzer::new(unit, content, &substitution_cache, recorder, &pool);

    // Schema-comment problems tag the file but never block the body walk.
    if let Err(err) = analyzer.analyze_schema_comments(&file_vname, descriptor) {
        let message = format!("error analyzing schema comments: {err}");
        error!("{message}");
        analyzer.emit_diagnostic(&file_vname, "schema_comments", &message);
    }

    analyzer.analyze_message(&file_vname, &message, &parse_tree)
}

/// Find and remove `--proto_message <name>` from `args`.
fn take_proto_message_arg(args: &mut Vec<String>) -> Option<String> {
    let position = args.iter().position(|arg| arg == "--proto_message")?;
    if position + 1 >= args.len() {
        return None;
    }
    let value = args.remove(position + 1);
    args.remove(position);
    Some(value)
}

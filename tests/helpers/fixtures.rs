//! Common schema sources and compilation-unit builders for analyzer tests.

use textproto_indexer::analysis::{
    CompilationUnit, FileData, FileInfo, RequiredInput, VName,
};

pub const ANY_PROTO: &str = r#"
syntax = "proto3";
package google.protobuf;
message Any {
  string type_url = 1;
  bytes value = 2;
}
"#;

/// The schema most tests bind against: scalars, repeated fields, nested
/// and repeated messages, an Any, an enum, and an extension.
pub const EXAMPLE_PROTO: &str = r#"
syntax = "proto2";
package pkg;
import "google/protobuf/any.proto";

enum Color {
  RED = 0;
  GREEN = 1;
}

message Inner {
  optional int32 f = 1;
}

message M {
  optional string my_string = 1;
  repeated int32 xs = 2;
  optional Inner inner = 3;
  repeated Inner inners = 4;
  optional google.protobuf.Any payload = 5;
  optional Color color = 6;
  extensions 100 to 199;
}

extend M {
  optional int32 ext = 100;
}
"#;

pub fn vname_for_path(path: &str) -> VName {
    VName {
        corpus: "corpus".to_string(),
        path: path.to_string(),
        ..Default::default()
    }
}

/// A unit binding `textproto.textproto` against the given schema files,
/// with `--proto_message` plus any extra arguments.
pub fn unit_with_args(
    textproto: &str,
    schemas: &[(&str, &str)],
    message: &str,
    extra_args: &[&str],
) -> (CompilationUnit, Vec<FileData>) {
    const TEXTPROTO_PATH: &str = "textproto.textproto";

    let mut required_input = vec![RequiredInput {
        info: FileInfo {
            path: TEXTPROTO_PATH.to_string(),
        },
        v_name: vname_for_path(TEXTPROTO_PATH),
    }];
    let mut files = vec![FileData {
        path: TEXTPROTO_PATH.to_string(),
        content: textproto.as_bytes().to_vec(),
    }];
    for (path, content) in schemas {
        required_input.push(RequiredInput {
            info: FileInfo {
                path: path.to_string(),
            },
            v_name: vname_for_path(path),
        });
        files.push(FileData {
            path: path.to_string(),
            content: content.as_bytes().to_vec(),
        });
    }

    let mut argument: Vec<String> = extra_args.iter().map(|s| s.to_string()).collect();
    argument.push("--proto_message".to_string());
    argument.push(message.to_string());

    let unit = CompilationUnit {
        source_file: vec![TEXTPROTO_PATH.to_string()],
        required_input,
        argument,
    };
    (unit, files)
}

/// Standard unit: the example schema (plus any.proto) and `pkg.M` on top.
pub fn example_unit(textproto: &str) -> (CompilationUnit, Vec<FileData>) {
    unit_with_args(
        textproto,
        &[
            ("m.proto", EXAMPLE_PROTO),
            ("google/protobuf/any.proto", ANY_PROTO),
        ],
        "pkg.M",
        &[],
    )
}

//! Descriptor fixtures shared by the unit tests, assembled from
//! `prost_types` descriptor protos so no `protoc` run is needed.

use std::sync::LazyLock;

use prost::Message as _;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, Value};
use prost_types::descriptor_proto::ExtensionRange;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
};

static POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet {
        file: vec![rules_file(), options_file(), model_file()],
    })
    .expect("test descriptors are valid")
});

/// Options on the model types are real `google.protobuf.*Options`
/// extensions, encoded the way `protoc` would emit them.
static ANNOTATED: LazyLock<DescriptorPool> = LazyLock::new(|| {
    let mut pool = DescriptorPool::global();
    pool.add_file_descriptor_proto(descriptor_options_file())
        .expect("option extensions are valid");
    let model = annotate(&pool, annotated_model_file());
    pool.decode_file_descriptor_proto(model.as_slice())
        .expect("annotated model is valid");
    pool
});

/// The shared fixture pool.
pub(crate) fn pool() -> DescriptorPool {
    POOL.clone()
}

/// A fixture message by full name.
pub(crate) fn message(name: &str) -> MessageDescriptor {
    POOL.get_message_by_name(name)
        .unwrap_or_else(|| panic!("fixture message {name} exists"))
}

/// A message from the pool whose constraints live on descriptor options.
pub(crate) fn annotated(name: &str) -> MessageDescriptor {
    ANNOTATED
        .get_message_by_name(name)
        .unwrap_or_else(|| panic!("annotated message {name} exists"))
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..FieldDescriptorProto::default()
    }
}

fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, ty)
    }
}

fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

fn in_oneof(mut field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    field.oneof_index = Some(index);
    field
}

fn extension(name: &str, number: i32, field: FieldDescriptorProto) -> FieldDescriptorProto {
    extending(".test.rules.FieldOptions", name, number, field)
}

fn extending(
    extendee: &str,
    name: &str,
    number: i32,
    field: FieldDescriptorProto,
) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        extendee: Some(extendee.to_string()),
        ..field
    }
}

fn message_proto(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..DescriptorProto::default()
    }
}

/// Payload messages for message-valued options, and an options message the
/// `validate` extensions attach to.
fn rules_file() -> FileDescriptorProto {
    let mut options = message_proto("FieldOptions", Vec::new());
    options.extension_range = vec![ExtensionRange {
        start: Some(50_000),
        end: Some(60_000),
        options: None,
    }];

    FileDescriptorProto {
        name: Some("test/rules.proto".to_string()),
        package: Some("test.rules".to_string()),
        syntax: Some("proto2".to_string()),
        message_type: vec![
            message_proto(
                "PatternRules",
                vec![
                    scalar("regex", 1, Type::String),
                    scalar("flags", 2, Type::String),
                    scalar("message", 3, Type::String),
                ],
            ),
            message_proto(
                "BoundRules",
                vec![
                    scalar("value", 1, Type::String),
                    scalar("exclusive", 2, Type::Bool),
                    scalar("message", 3, Type::String),
                ],
            ),
            message_proto(
                "ChoiceRules",
                vec![
                    scalar("required", 1, Type::Bool),
                    scalar("message", 2, Type::String),
                ],
            ),
            options,
        ],
        ..FileDescriptorProto::default()
    }
}

/// `validate.*` extensions of `test.rules.FieldOptions`, plus one foreign
/// extension outside the package.
fn options_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("validate/test_options.proto".to_string()),
        package: Some("validate".to_string()),
        dependency: vec!["test/rules.proto".to_string()],
        syntax: Some("proto2".to_string()),
        extension: vec![
            extension("required", 50_001, scalar("", 0, Type::Bool)),
            extension(
                "pattern",
                50_002,
                typed("", 0, Type::Message, ".test.rules.PatternRules"),
            ),
            extension("range", 50_003, scalar("", 0, Type::String)),
            extension("once", 50_004, scalar("", 0, Type::Bool)),
            extension("choice", 50_005, scalar("", 0, Type::Bool)),
        ],
        ..FileDescriptorProto::default()
    }
}

fn model_file() -> FileDescriptorProto {
    let mut roster_entry = message_proto(
        "RosterEntry",
        vec![
            scalar("key", 1, Type::String),
            typed("value", 2, Type::Message, ".test.Member"),
        ],
    );
    roster_entry.options = Some(MessageOptions {
        map_entry: Some(true),
        ..MessageOptions::default()
    });

    let mut team = message_proto(
        "Team",
        vec![
            repeated(typed("members", 1, Type::Message, ".test.Member")),
            repeated(typed("roster", 2, Type::Message, ".test.Team.RosterEntry")),
            typed("address", 3, Type::Message, ".test.Address"),
            scalar("name", 4, Type::String),
        ],
    );
    team.nested_type = vec![roster_entry];

    let mut payment = message_proto(
        "Payment",
        vec![
            scalar("amount", 1, Type::Int64),
            in_oneof(scalar("card", 2, Type::String), 0),
            in_oneof(scalar("iban", 3, Type::String), 0),
            FieldDescriptorProto {
                proto3_optional: Some(true),
                ..in_oneof(scalar("memo", 4, Type::String), 1)
            },
        ],
    );
    payment.oneof_decl = ["method", "_memo"]
        .iter()
        .map(|name| OneofDescriptorProto {
            name: Some((*name).to_string()),
            options: None,
        })
        .collect();

    let status = EnumDescriptorProto {
        name: Some("Status".to_string()),
        value: ["STATUS_UNSPECIFIED", "STATUS_ACTIVE", "STATUS_RETIRED"]
            .iter()
            .zip(0..)
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some((*name).to_string()),
                number: Some(number),
                options: None,
            })
            .collect(),
        ..EnumDescriptorProto::default()
    };

    FileDescriptorProto {
        name: Some("test/model.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            message_proto(
                "Contact",
                vec![
                    scalar("id", 1, Type::Int64),
                    scalar("email", 2, Type::String),
                    scalar("phone", 3, Type::String),
                    scalar("country_code", 4, Type::String),
                    scalar("given_name", 5, Type::String),
                    scalar("honorific_prefix", 6, Type::String),
                    scalar("family_name", 7, Type::String),
                    scalar("username", 8, Type::String),
                    scalar("password", 9, Type::String),
                    scalar("oauth_token", 10, Type::String),
                ],
            ),
            message_proto(
                "Address",
                vec![
                    scalar("city", 1, Type::String),
                    scalar("street", 2, Type::String),
                    scalar("postal_code", 3, Type::String),
                ],
            ),
            message_proto("Member", vec![scalar("name", 1, Type::String)]),
            team,
            message_proto(
                "Reading",
                vec![
                    scalar("hour", 1, Type::Int32),
                    scalar("angle", 2, Type::Double),
                    scalar("percentage", 3, Type::Int32),
                    repeated(scalar("samples", 4, Type::Int32)),
                    scalar("ratio", 5, Type::Float),
                    scalar("count", 6, Type::Uint32),
                    repeated(scalar("tags", 7, Type::String)),
                    typed("status", 8, Type::Enum, ".test.Status"),
                    scalar("active", 9, Type::Bool),
                    scalar("payload", 10, Type::Bytes),
                    repeated(typed("statuses", 11, Type::Enum, ".test.Status")),
                ],
            ),
            payment,
            message_proto(
                "Node",
                vec![
                    scalar("label", 1, Type::String),
                    typed("child", 2, Type::Message, ".test.Node"),
                ],
            ),
        ],
        enum_type: vec![status],
        ..FileDescriptorProto::default()
    }
}

/// The `validate` option vocabulary on top of `google/protobuf/descriptor.proto`.
fn descriptor_options_file() -> FileDescriptorProto {
    const FIELD: &str = ".google.protobuf.FieldOptions";
    FileDescriptorProto {
        name: Some("validate/options.proto".to_string()),
        package: Some("validate".to_string()),
        dependency: vec!["google/protobuf/descriptor.proto".to_string()],
        syntax: Some("proto2".to_string()),
        message_type: vec![
            message_proto(
                "PatternRules",
                vec![
                    scalar("regex", 1, Type::String),
                    scalar("flags", 2, Type::String),
                    scalar("message", 3, Type::String),
                ],
            ),
            message_proto(
                "ChoiceRules",
                vec![
                    scalar("required", 1, Type::Bool),
                    scalar("message", 2, Type::String),
                ],
            ),
            message_proto("CombinationRules", vec![scalar("fields", 1, Type::String)]),
        ],
        extension: vec![
            extending(FIELD, "required", 51_001, scalar("", 0, Type::Bool)),
            extending(
                FIELD,
                "pattern",
                51_002,
                typed("", 0, Type::Message, ".validate.PatternRules"),
            ),
            extending(FIELD, "range", 51_005, scalar("", 0, Type::String)),
            extending(FIELD, "goes", 51_007, scalar("", 0, Type::String)),
            extending(FIELD, "recurse", 51_008, scalar("", 0, Type::Bool)),
            extending(FIELD, "once", 51_090, scalar("", 0, Type::Bool)),
            extending(
                ".google.protobuf.OneofOptions",
                "choice",
                51_101,
                typed("", 0, Type::Message, ".validate.ChoiceRules"),
            ),
            extending(
                ".google.protobuf.MessageOptions",
                "require",
                51_201,
                typed("", 0, Type::Message, ".validate.CombinationRules"),
            ),
        ],
        ..FileDescriptorProto::default()
    }
}

fn annotated_model_file() -> FileDescriptorProto {
    let mut signup = message_proto(
        "Signup",
        vec![
            scalar("email", 1, Type::String),
            scalar("phone", 2, Type::String),
            scalar("country_code", 3, Type::String),
            scalar("age", 4, Type::Int32),
            typed("address", 5, Type::Message, ".annotated.Address"),
            in_oneof(scalar("free", 6, Type::String), 0),
            in_oneof(scalar("paid", 7, Type::String), 0),
        ],
    );
    signup.oneof_decl = vec![OneofDescriptorProto {
        name: Some("plan".to_string()),
        options: None,
    }];

    FileDescriptorProto {
        name: Some("annotated/signup.proto".to_string()),
        package: Some("annotated".to_string()),
        dependency: vec!["validate/options.proto".to_string()],
        syntax: Some("proto3".to_string()),
        message_type: vec![
            signup,
            message_proto("Address", vec![scalar("city", 1, Type::String)]),
            message_proto("Ticket", vec![scalar("serial", 1, Type::String)]),
        ],
        ..FileDescriptorProto::default()
    }
}

/// Re-encode `file` with option extensions set on its fields, oneofs and
/// messages. `prost_types` option structs drop unknown fields, so the
/// options are written through a `DynamicMessage`.
fn annotate(pool: &DescriptorPool, file: FileDescriptorProto) -> Vec<u8> {
    let descriptor = pool
        .get_message_by_name("google.protobuf.FileDescriptorProto")
        .expect("descriptor.proto is in the pool");
    let mut dynamic = DynamicMessage::new(descriptor);
    dynamic
        .transcode_from(&file)
        .expect("file descriptor transcodes");

    let payload = |name: &str, fields: &[(&str, Value)]| {
        let mut msg = DynamicMessage::new(
            pool.get_message_by_name(name)
                .unwrap_or_else(|| panic!("payload message {name} exists")),
        );
        for (field, value) in fields {
            msg.set_field_by_name(field, value.clone());
        }
        Value::Message(msg)
    };
    let text = |s: &str| Value::String(s.to_string());

    let options = [
        (
            vec![("message_type", "Signup")],
            "require",
            payload("validate.CombinationRules", &[("fields", text("email | phone"))]),
        ),
        (
            vec![("message_type", "Signup"), ("field", "email")],
            "pattern",
            payload("validate.PatternRules", &[("regex", text("^[^@]+@[^@]+$"))]),
        ),
        (
            vec![("message_type", "Signup"), ("field", "phone")],
            "goes",
            text("country_code"),
        ),
        (
            vec![("message_type", "Signup"), ("field", "age")],
            "range",
            text("[18..130)"),
        ),
        (
            vec![("message_type", "Signup"), ("field", "address")],
            "recurse",
            Value::Bool(true),
        ),
        (
            vec![("message_type", "Signup"), ("oneof_decl", "plan")],
            "choice",
            payload("validate.ChoiceRules", &[("required", Value::Bool(true))]),
        ),
        (
            vec![("message_type", "Address"), ("field", "city")],
            "required",
            Value::Bool(true),
        ),
        (
            vec![("message_type", "Ticket"), ("field", "serial")],
            "once",
            Value::Bool(true),
        ),
    ];
    for (path, extension, value) in options {
        let extension = pool
            .get_extension_by_name(&format!("validate.{extension}"))
            .unwrap_or_else(|| panic!("extension validate.{extension} exists"));
        let mut target = &mut dynamic;
        for (list, name) in path {
            target = element(target, list, name);
        }
        match target.get_field_by_name_mut("options") {
            Some(Value::Message(opts)) => opts.set_extension(&extension, value),
            _ => panic!("options field is a message"),
        }
    }
    dynamic.encode_to_vec()
}

/// The entry of a repeated descriptor field with the given `name`.
fn element<'a>(
    parent: &'a mut DynamicMessage,
    list: &str,
    name: &str,
) -> &'a mut DynamicMessage {
    let Some(Value::List(items)) = parent.get_field_by_name_mut(list) else {
        panic!("{list} is a repeated field");
    };
    items
        .iter_mut()
        .find_map(|item| match item {
            Value::Message(msg)
                if msg
                    .get_field_by_name("name")
                    .is_some_and(|value| value.as_str() == Some(name)) =>
            {
                Some(msg)
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("no {list} entry named {name}"))
}

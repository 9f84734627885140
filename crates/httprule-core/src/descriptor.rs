//! Protobuf descriptor types that keep the `google.api.http` annotation.
//!
//! [`prost_types::MethodOptions`](https://docs.rs/prost-types) discards the
//! `google.api.http` extension (field 72295728) because prost does not retain
//! unknown fields. These trimmed-down types decode just enough of a
//! `FileDescriptorSet` to read HTTP bindings, including `custom` patterns and
//! `additional_bindings`, and to resolve the request fields they bind.

#[allow(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
mod types {
    use prost::Message;

    #[derive(Clone, PartialEq, Message)]
    pub struct FileDescriptorSet {
        #[prost(message, repeated, tag = "1")]
        pub file: Vec<FileDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct FileDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub package: Option<String>,
        #[prost(message, repeated, tag = "4")]
        pub message_type: Vec<DescriptorProto>,
        #[prost(message, repeated, tag = "6")]
        pub service: Vec<ServiceDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct DescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub field: Vec<FieldDescriptorProto>,
        #[prost(message, repeated, tag = "3")]
        pub nested_type: Vec<DescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct FieldDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        /// 1=optional, 2=required, 3=repeated.
        #[prost(int32, optional, tag = "4")]
        pub label: Option<i32>,
        /// Protobuf field type enum: 9=string, 10=group, 11=message, ...
        #[prost(int32, optional, tag = "5")]
        pub r#type: Option<i32>,
        /// Fully-qualified type name for message/enum fields (e.g. `.library.v1.Book`).
        #[prost(string, optional, tag = "6")]
        pub type_name: Option<String>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct ServiceDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub method: Vec<MethodDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct MethodDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub input_type: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub output_type: Option<String>,
        #[prost(message, optional, tag = "4")]
        pub options: Option<MethodOptions>,
        #[prost(bool, optional, tag = "5")]
        pub client_streaming: Option<bool>,
        #[prost(bool, optional, tag = "6")]
        pub server_streaming: Option<bool>,
    }

    /// Method options with the `google.api.http` extension (field 72295728).
    #[derive(Clone, PartialEq, Message)]
    pub struct MethodOptions {
        #[prost(message, optional, tag = "72295728")]
        pub http: Option<HttpRule>,
    }

    /// `google.api.HttpRule`: the REST mapping of one RPC.
    #[derive(Clone, PartialEq, Message)]
    pub struct HttpRule {
        /// Fully qualified method the rule applies to. Only read for rules
        /// supplied outside the proto files.
        #[prost(string, tag = "1")]
        pub selector: String,
        #[prost(oneof = "HttpPattern", tags = "2, 3, 4, 5, 6, 8")]
        pub pattern: Option<HttpPattern>,
        #[prost(string, tag = "7")]
        pub body: String,
        /// Extra bindings; these must not nest further.
        #[prost(message, repeated, tag = "11")]
        pub additional_bindings: Vec<HttpRule>,
        #[prost(string, tag = "12")]
        pub response_body: String,
    }

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum HttpPattern {
        #[prost(string, tag = "2")]
        Get(String),
        #[prost(string, tag = "3")]
        Put(String),
        #[prost(string, tag = "4")]
        Post(String),
        #[prost(string, tag = "5")]
        Delete(String),
        #[prost(string, tag = "6")]
        Patch(String),
        #[prost(message, tag = "8")]
        Custom(CustomHttpPattern),
    }

    /// A binding for a method outside the five standard verbs, e.g. `HEAD`.
    #[derive(Clone, PartialEq, Message)]
    pub struct CustomHttpPattern {
        #[prost(string, tag = "1")]
        pub kind: String,
        #[prost(string, tag = "2")]
        pub path: String,
    }
}

pub use types::*;

/// Proto field type constants (from `google.protobuf.FieldDescriptorProto.Type`).
pub mod field_type {
    /// `TYPE_INT64 = 3`
    pub const INT64: i32 = 3;
    /// `TYPE_STRING = 9`
    pub const STRING: i32 = 9;
    /// `TYPE_GROUP = 10`
    pub const GROUP: i32 = 10;
    /// `TYPE_MESSAGE = 11`
    pub const MESSAGE: i32 = 11;
}

/// Proto field label constants (from `google.protobuf.FieldDescriptorProto.Label`).
pub mod field_label {
    /// `LABEL_OPTIONAL = 1`
    pub const OPTIONAL: i32 = 1;
    /// `LABEL_REPEATED = 3`
    pub const REPEATED: i32 = 3;
}

impl FieldDescriptorProto {
    /// Message or group field, i.e. one a field path can descend into.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        matches!(self.r#type, Some(field_type::MESSAGE | field_type::GROUP))
    }

    /// Declared `repeated`.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.label == Some(field_label::REPEATED)
    }
}

impl MethodDescriptorProto {
    /// The `google.api.http` rule, if the method has one.
    #[must_use]
    pub fn http_rule(&self) -> Option<&HttpRule> {
        self.options.as_ref().and_then(|o| o.http.as_ref())
    }
}

impl HttpRule {
    /// The rule itself followed by its `additional_bindings`.
    pub fn bindings(&self) -> impl Iterator<Item = &Self> {
        std::iter::once(self).chain(&self.additional_bindings)
    }
}

/// `(HTTP method, path template)` of a rule. Standard verbs are upper-cased;
/// a custom pattern yields its `kind` verbatim.
#[must_use]
pub fn extract_http_pattern(rule: &HttpRule) -> Option<(&str, &str)> {
    Some(match rule.pattern.as_ref()? {
        HttpPattern::Get(p) => ("GET", p.as_str()),
        HttpPattern::Put(p) => ("PUT", p.as_str()),
        HttpPattern::Post(p) => ("POST", p.as_str()),
        HttpPattern::Delete(p) => ("DELETE", p.as_str()),
        HttpPattern::Patch(p) => ("PATCH", p.as_str()),
        HttpPattern::Custom(custom) => (custom.kind.as_str(), custom.path.as_str()),
    })
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::*;

    fn rule(pattern: HttpPattern) -> HttpRule {
        HttpRule {
            pattern: Some(pattern),
            ..HttpRule::default()
        }
    }

    #[test]
    fn standard_verbs_are_upper_case() {
        let cases = [
            (HttpPattern::Get("/v1/items".into()), "GET"),
            (HttpPattern::Put("/v1/items".into()), "PUT"),
            (HttpPattern::Post("/v1/items".into()), "POST"),
            (HttpPattern::Delete("/v1/items".into()), "DELETE"),
            (HttpPattern::Patch("/v1/items".into()), "PATCH"),
        ];
        for (pattern, want) in cases {
            let rule = rule(pattern);
            assert_eq!(extract_http_pattern(&rule), Some((want, "/v1/items")));
        }
    }

    #[test]
    fn custom_kind_is_kept_verbatim() {
        let rule = rule(HttpPattern::Custom(CustomHttpPattern {
            kind: "HEAD".into(),
            path: "/v1/items/{id}".into(),
        }));
        assert_eq!(extract_http_pattern(&rule), Some(("HEAD", "/v1/items/{id}")));
    }

    #[test]
    fn rule_without_pattern() {
        assert_eq!(extract_http_pattern(&HttpRule::default()), None);
    }

    #[test]
    fn bindings_start_with_the_primary_rule() {
        let mut primary = rule(HttpPattern::Get("/v1/{name=messages/*}".into()));
        primary
            .additional_bindings
            .push(rule(HttpPattern::Get("/v1/users/{user_id}/messages/{message_id}".into())));

        let paths: Vec<_> = primary
            .bindings()
            .filter_map(extract_http_pattern)
            .map(|(_, path)| path)
            .collect();
        assert_eq!(
            paths,
            vec!["/v1/{name=messages/*}", "/v1/users/{user_id}/messages/{message_id}"]
        );
    }

    #[test]
    fn field_kinds() {
        let field = |label, ty| FieldDescriptorProto {
            name: Some("f".into()),
            label: Some(label),
            r#type: Some(ty),
            type_name: None,
        };
        assert!(field(field_label::OPTIONAL, field_type::MESSAGE).is_aggregate());
        assert!(field(field_label::OPTIONAL, field_type::GROUP).is_aggregate());
        assert!(!field(field_label::OPTIONAL, field_type::STRING).is_aggregate());
        assert!(field(field_label::REPEATED, field_type::STRING).is_repeated());
        assert!(!FieldDescriptorProto::default().is_repeated());
    }

    #[test]
    fn http_rule_lookup() {
        let method = MethodDescriptorProto {
            options: Some(MethodOptions {
                http: Some(rule(HttpPattern::Post("/v1/items".into()))),
            }),
            ..MethodDescriptorProto::default()
        };
        assert!(method.http_rule().is_some());
        assert!(MethodDescriptorProto::default().http_rule().is_none());
    }

    /// The extension survives an encode/decode cycle.
    #[test]
    fn descriptor_set_keeps_http_extension() {
        let mut http = rule(HttpPattern::Post("/v1/test".into()));
        http.body = "*".into();
        let original = FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("test.proto".into()),
                package: Some("test.v1".into()),
                message_type: vec![DescriptorProto {
                    name: Some("CreateRequest".into()),
                    field: vec![FieldDescriptorProto {
                        name: Some("tags".into()),
                        label: Some(field_label::REPEATED),
                        r#type: Some(field_type::STRING),
                        type_name: None,
                    }],
                    nested_type: vec![],
                }],
                service: vec![ServiceDescriptorProto {
                    name: Some("Svc".into()),
                    method: vec![MethodDescriptorProto {
                        name: Some("Create".into()),
                        options: Some(MethodOptions { http: Some(http) }),
                        ..MethodDescriptorProto::default()
                    }],
                }],
            }],
        };

        let decoded = FileDescriptorSet::decode(original.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, original);
    }
}

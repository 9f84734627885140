//! Descriptor set to route table to request dispatch.

use http::Method;
use httprule::{Dispatch, Pattern, ServeMux};
use httprule_build::{BindingConfig, Error, ProjectConfig};
use httprule_core::descriptor::{
    field_type, CustomHttpPattern, DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet, HttpPattern, HttpRule, MethodDescriptorProto, MethodOptions,
    ServiceDescriptorProto,
};
use pretty_assertions::assert_eq;
use prost::Message as _;

fn rpc(name: &str, pattern: HttpPattern, body: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(format!(".library.v1.{name}Request")),
        output_type: Some(".library.v1.Book".to_string()),
        options: Some(MethodOptions {
            http: Some(HttpRule {
                pattern: Some(pattern),
                body: body.to_string(),
                ..HttpRule::default()
            }),
        }),
        client_streaming: None,
        server_streaming: None,
    }
}

fn message(name: &str, fields: &[(&str, Option<&str>)]) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields
            .iter()
            .map(|(field, message)| FieldDescriptorProto {
                name: Some((*field).to_string()),
                label: None,
                r#type: Some(if message.is_some() {
                    field_type::MESSAGE
                } else {
                    field_type::STRING
                }),
                type_name: message.map(ToString::to_string),
            })
            .collect(),
        nested_type: vec![],
    }
}

fn library_descriptor() -> Vec<u8> {
    let mut get_book = rpc(
        "GetBook",
        HttpPattern::Get("/v1/{name=shelves/*/books/*}".into()),
        "",
    );
    if let Some(rule) = get_book
        .options
        .as_mut()
        .and_then(|options| options.http.as_mut())
    {
        rule.additional_bindings.push(HttpRule {
            pattern: Some(HttpPattern::Custom(CustomHttpPattern {
                kind: "HEAD".into(),
                path: "/v1/{name=shelves/*/books/*}".into(),
            })),
            ..HttpRule::default()
        });
    }

    FileDescriptorSet {
        file: vec![
            FileDescriptorProto {
                name: Some("library/v1/library.proto".into()),
                package: Some("library.v1".into()),
                message_type: vec![
                    message("Book", &[("name", None)]),
                    message("GetBookRequest", &[("name", None)]),
                    message("ListBooksRequest", &[("parent", None)]),
                    message(
                        "CreateBookRequest",
                        &[("parent", None), ("book", Some(".library.v1.Book"))],
                    ),
                    message("DeleteBookRequest", &[("name", None)]),
                    message("ArchiveBookRequest", &[("name", None)]),
                ],
                service: vec![ServiceDescriptorProto {
                    name: Some("LibraryService".into()),
                    method: vec![
                        get_book,
                        rpc(
                            "ListBooks",
                            HttpPattern::Get("/v1/{parent=shelves/*}/books".into()),
                            "",
                        ),
                        rpc(
                            "CreateBook",
                            HttpPattern::Post("/v1/{parent=shelves/*}/books".into()),
                            "book",
                        ),
                        rpc(
                            "DeleteBook",
                            HttpPattern::Delete("/v1/{name=shelves/*/books/*}".into()),
                            "",
                        ),
                        rpc(
                            "ArchiveBook",
                            HttpPattern::Post("/v1/{name=shelves/*/books/*}:archive".into()),
                            "*",
                        ),
                    ],
                }],
            },
            FileDescriptorProto {
                name: Some("health.proto".into()),
                package: Some("grpc.health.v1".into()),
                message_type: vec![message("CheckRequest", &[("service", None)])],
                service: vec![ServiceDescriptorProto {
                    name: Some("Health".into()),
                    method: vec![
                        rpc("Check", HttpPattern::Get("/healthz".into()), ""),
                        MethodDescriptorProto {
                            name: Some("Watch".into()),
                            input_type: Some(".grpc.health.v1.CheckRequest".into()),
                            server_streaming: Some(true),
                            ..MethodDescriptorProto::default()
                        },
                    ],
                }],
            },
        ],
    }
    .encode_to_vec()
}

#[test]
fn generated_table_is_valid_rust() {
    let config = BindingConfig::new().runtime_crate("crate::rest");
    let code = httprule_build::generate(&library_descriptor(), &config).unwrap();

    let file = syn::parse_file(&code).expect("generated code should be valid Rust syntax");
    let consts: Vec<String> = file
        .items
        .iter()
        .filter_map(|item| match item {
            syn::Item::Const(c) => Some(c.ident.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        consts,
        vec![
            "LIBRARY_SERVICE_GET_BOOK",
            "LIBRARY_SERVICE_GET_BOOK_1",
            "LIBRARY_SERVICE_LIST_BOOKS",
            "LIBRARY_SERVICE_CREATE_BOOK",
            "LIBRARY_SERVICE_DELETE_BOOK",
            "LIBRARY_SERVICE_ARCHIVE_BOOK",
            "HEALTH_CHECK",
            "ROUTES",
        ]
    );
    assert!(code.contains("crate::rest::RouteSpec"));
    assert!(code.contains(r#"method: "HEAD","#));
    assert!(code.contains(r#"verb: "archive","#));
    assert!(code.contains("opcodes: &[2, 0, 2, 1, 1, 0, 2, 2, 1, 0, 4, 4, 5, 3],"));
}

#[test]
fn package_filter_limits_the_table() {
    let config = BindingConfig::new().package("grpc.health.v1");
    let bindings = httprule_build::extract_bindings(&library_descriptor(), &config).unwrap();
    let rpcs: Vec<_> = bindings.iter().map(|b| b.rpc.as_str()).collect();
    assert_eq!(rpcs, vec!["/grpc.health.v1.Health/Check"]);
}

#[test]
fn extracted_bindings_dispatch_requests() {
    let bindings =
        httprule_build::extract_bindings(&library_descriptor(), &BindingConfig::default()).unwrap();

    let mut mux = ServeMux::new();
    for binding in &bindings {
        let method = Method::from_bytes(binding.http_method.as_bytes()).unwrap();
        let pattern = Pattern::from_template(&binding.template).unwrap();
        mux.handle(method, pattern, binding.rpc.clone());
    }
    assert_eq!(mux.len(), 7);

    let request = http::Request::post("/v1/shelves/s1/books/b9:archive")
        .body(())
        .unwrap();
    match mux.dispatch_request(&request) {
        Dispatch::Matched { handler, params } => {
            assert_eq!(handler, "/library.v1.LibraryService/ArchiveBook");
            assert_eq!(params.get("name"), Some("shelves/s1/books/b9"));
        }
        other => panic!("unexpected {other:?}"),
    }

    let head = Method::from_bytes(b"HEAD").unwrap();
    match mux.dispatch(&head, "/v1/shelves/s1/books/b9") {
        Dispatch::Matched { handler, .. } => {
            assert_eq!(handler, "/library.v1.LibraryService/GetBook");
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(
        mux.dispatch(&Method::PUT, "/v1/shelves/s1/books"),
        Dispatch::MethodNotAllowed {
            allowed: vec![Method::GET, Method::POST]
        }
    );
    assert_eq!(mux.dispatch(&Method::GET, "/v1/shelves"), Dispatch::NotFound);
}

#[test]
fn strict_policy_rejects_the_descriptor() {
    let config = BindingConfig::new().validator(
        httprule_core::ValidatorConfig::default().max_static_segments_at_start(0),
    );
    let err = httprule_build::extract_bindings(&library_descriptor(), &config).unwrap_err();
    match err {
        Error::Validation { rpc, source } => {
            assert_eq!(rpc, "/library.v1.LibraryService/GetBook");
            assert_eq!(source.pattern, "/v1/{name=shelves/*/books/*}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn project_config_binds_unannotated_methods() {
    let yaml = indoc::indoc! {"
        type: google.api.Service
        config_version: 3
        packages:
          - grpc.health.v1
        http:
          rules:
            - selector: grpc.health.v1.Health.Watch
              get: /healthz/{service}:watch
    "};
    let project: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
    let bindings =
        httprule_build::extract_bindings(&library_descriptor(), &project.binding_config()).unwrap();

    let routes: Vec<_> = bindings
        .iter()
        .map(|b| (b.rpc.as_str(), b.path.as_str(), b.server_streaming))
        .collect();
    assert_eq!(
        routes,
        vec![
            ("/grpc.health.v1.Health/Check", "/healthz", false),
            ("/grpc.health.v1.Health/Watch", "/healthz/{service}:watch", true),
        ]
    );
}

#[test]
fn project_config_rules_resolve_fields() {
    let yaml = indoc::indoc! {"
        http:
          rules:
            - selector: grpc.health.v1.Health.Watch
              get: /healthz/{name}
    "};
    let project: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
    let err = httprule_build::extract_bindings(&library_descriptor(), &project.binding_config())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"/grpc.health.v1.Health/Watch: no field "name" found in CheckRequest"#
    );
}

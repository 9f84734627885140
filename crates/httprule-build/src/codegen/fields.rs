//! Request-message lookup and field-path resolution.

use std::collections::HashMap;

use httprule_core::descriptor::{
    field_type, DescriptorProto, FieldDescriptorProto, FileDescriptorSet,
};

use crate::error::FieldPathError;

/// Fully-qualified message name (`.library.v1.Book`) to its descriptor,
/// nested types included.
pub(crate) struct MessageIndex<'a> {
    messages: HashMap<String, &'a DescriptorProto>,
}

impl<'a> MessageIndex<'a> {
    pub(crate) fn collect(fdset: &'a FileDescriptorSet) -> Self {
        let mut messages = HashMap::new();
        for file in &fdset.file {
            let scope = match file.package.as_deref() {
                None | Some("") => String::new(),
                Some(package) => format!(".{package}"),
            };
            for msg in &file.message_type {
                collect_message(&mut messages, &scope, msg);
            }
        }
        Self { messages }
    }

    /// Resolve `name` as protoc does: absolute when it starts with `.`,
    /// otherwise relative to `scope` and then each enclosing scope.
    pub(crate) fn lookup(
        &self,
        scope: &str,
        name: &str,
    ) -> Result<&'a DescriptorProto, FieldPathError> {
        if name.starts_with('.') {
            return self
                .messages
                .get(name)
                .copied()
                .ok_or_else(|| FieldPathError::UnknownMessage(name.to_string()));
        }

        let mut components: Vec<&str> = scope.split('.').filter(|c| !c.is_empty()).collect();
        loop {
            let mut fqmn = String::new();
            for component in &components {
                fqmn.push('.');
                fqmn.push_str(component);
            }
            fqmn.push('.');
            fqmn.push_str(name);
            if let Some(msg) = self.messages.get(&fqmn) {
                return Ok(*msg);
            }
            if components.pop().is_none() {
                return Err(FieldPathError::UnknownMessage(name.to_string()));
            }
        }
    }

    /// Walk a dotted field path from `root`.
    ///
    /// Every component must exist and be singular; every component but the
    /// last must be a message.
    pub(crate) fn resolve(
        &self,
        root: &'a DescriptorProto,
        path: &str,
    ) -> Result<Vec<&'a FieldDescriptorProto>, FieldPathError> {
        let mut msg = root;
        let mut fields: Vec<&'a FieldDescriptorProto> = Vec::new();

        for component in path.split('.') {
            if let Some(parent) = fields.last() {
                if !parent.is_aggregate() {
                    return Err(FieldPathError::NotAggregate {
                        field: parent.name.clone().unwrap_or_default(),
                        path: path.to_string(),
                    });
                }
                msg = self.lookup("", parent.type_name.as_deref().unwrap_or(""))?;
            }

            tracing::trace!(component, message = msg.name.as_deref(), "field lookup");
            let Some(field) = msg
                .field
                .iter()
                .find(|f| f.name.as_deref() == Some(component))
            else {
                return Err(FieldPathError::UnknownField {
                    path: path.to_string(),
                    message: root.name.clone().unwrap_or_default(),
                });
            };
            if field.is_repeated() {
                return Err(FieldPathError::Repeated {
                    field: field.name.clone().unwrap_or_default(),
                    path: path.to_string(),
                });
            }
            fields.push(field);
        }

        Ok(fields)
    }

    /// A path variable: resolves to a scalar field.
    pub(crate) fn check_param(
        &self,
        root: &'a DescriptorProto,
        path: &str,
    ) -> Result<(), FieldPathError> {
        let fields = self.resolve(root, path)?;
        match fields.last() {
            Some(leaf) if leaf.is_aggregate() => Err(FieldPathError::AggregateParameter {
                type_name: type_label(leaf).to_string(),
                path: path.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// The body selector: `""` and `"*"` need no field, anything else must resolve.
    pub(crate) fn check_body(
        &self,
        root: &'a DescriptorProto,
        body: &str,
    ) -> Result<(), FieldPathError> {
        match body {
            "" | "*" => Ok(()),
            path => self.resolve(root, path).map(drop),
        }
    }
}

/// Recursively index a message and its nested types.
fn collect_message<'a>(
    map: &mut HashMap<String, &'a DescriptorProto>,
    parent_path: &str,
    msg: &'a DescriptorProto,
) {
    let fqmn = format!("{parent_path}.{}", msg.name.as_deref().unwrap_or(""));
    for nested in &msg.nested_type {
        collect_message(map, &fqmn, nested);
    }
    map.insert(fqmn, msg);
}

fn type_label(field: &FieldDescriptorProto) -> &'static str {
    match field.r#type {
        Some(field_type::GROUP) => "TYPE_GROUP",
        _ => "TYPE_MESSAGE",
    }
}

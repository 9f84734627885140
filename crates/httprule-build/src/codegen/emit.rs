//! Rust source emission for the static route table.

use std::collections::HashSet;
use std::fmt::Write as _;

use super::config::BindingConfig;
use super::to_snake_case;
use super::types::Binding;

pub(crate) fn generate_code(bindings: &[Binding], config: &BindingConfig) -> String {
    let runtime = &config.runtime_crate;
    let mut out = String::with_capacity(256 + bindings.len() * 512);
    out.push_str("// @generated by httprule-build. Do not edit.\n");

    let mut taken = HashSet::new();
    let mut names = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let name = const_name(binding, &mut taken);
        emit_route(&mut out, &name, binding, runtime);
        names.push(name);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "/// Every binding, in descriptor order.");
    let _ = writeln!(out, "pub const ROUTES: &[{runtime}::RouteSpec] = &[");
    for name in &names {
        let _ = writeln!(out, "    {name},");
    }
    out.push_str("];\n");
    out
}

fn emit_route(out: &mut String, name: &str, binding: &Binding, runtime: &str) {
    let template = &binding.template;
    let opcodes = template
        .opcodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let pool = template
        .pool
        .iter()
        .map(|s| format!("{s:?}"))
        .collect::<Vec<_>>()
        .join(", ");

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "/// `{} {}` for `{}`.",
        binding.http_method, binding.path, binding.rpc
    );
    let _ = writeln!(out, "pub const {name}: {runtime}::RouteSpec = {runtime}::RouteSpec {{");
    let _ = writeln!(out, "    method: {:?},", binding.http_method);
    let _ = writeln!(out, "    rpc: {:?},", binding.rpc);
    let _ = writeln!(out, "    template: {:?},", binding.path);
    let _ = writeln!(out, "    version: {},", template.version);
    let _ = writeln!(out, "    opcodes: &[{opcodes}],");
    let _ = writeln!(out, "    pool: &[{pool}],");
    let _ = writeln!(out, "    verb: {:?},", template.verb);
    out.push_str("};\n");
}

/// `LibraryService.GetBook` binding 0 becomes `LIBRARY_SERVICE_GET_BOOK`,
/// binding 2 `LIBRARY_SERVICE_GET_BOOK_2`. A clash across packages is
/// resolved by prefixing the package, then by a `_DUP{n}` counter.
fn const_name(binding: &Binding, taken: &mut HashSet<String>) -> String {
    let mut base = format!(
        "{}_{}",
        to_snake_case(&binding.service),
        to_snake_case(&binding.method)
    );
    if binding.index > 0 {
        let _ = write!(base, "_{}", binding.index);
    }

    let mut name = base.to_ascii_uppercase();
    if taken.contains(&name) {
        let package = binding.package.replace('.', "_");
        let prefixed = format!("{package}_{base}").to_ascii_uppercase();
        name = prefixed.clone();
        let mut n = 2;
        while taken.contains(&name) {
            name = format!("{prefixed}_DUP{n}");
            n += 1;
        }
    }
    taken.insert(name.clone());
    name
}

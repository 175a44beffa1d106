//! Rule registration and the rule mutators.

use sky_eval::errors::argument_error;
use sky_eval::{ArgValue, Arguments, Builtin, EvalError, Thread, Value};
use sky_graph::{BuildLabel, BuildRule, Package};

use super::{bool_arg, graph_error, required, string_arg, strings_arg, unset};
use crate::context::current_package;

const BUILD_RULE_PARAMS: [&str; 19] = [
    "name",
    "cmd?",
    "test_cmd?",
    "srcs?",
    "data?",
    "outs?",
    "deps?",
    "exported_deps?",
    "tools?",
    "labels?",
    "visibility?",
    "licences?",
    "hashes?",
    "binary?",
    "test?",
    "test_only?",
    "building_description?",
    "needs_transitive_deps?",
    "output_is_complete?",
];

/// `build_rule(name, cmd=..., srcs=..., ...)`: register one rule in the
/// bound package.
pub(super) fn build_rule(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let package = current_package(thread)?;
    let [name, cmd, test_cmd, srcs, data, outs, deps, exported_deps, tools, labels, visibility, licences, hashes, binary, test, test_only, building_description, needs_transitive_deps, output_is_complete] =
        args.bind(builtin.name(), BUILD_RULE_PARAMS)?;

    let name = required(name, "build_rule: name")?;
    let defaults = package.defaults();
    let mut rule = BuildRule::new(BuildLabel::new(package.name(), name));

    match unset(cmd) {
        Some(Value::Dict(commands)) => {
            for (config, command) in commands.items() {
                let config = config.into_string("build_rule: cmd")?;
                rule.set_command_for(&config, command.into_string("build_rule: cmd")?);
            }
        }
        other => rule.command = string_arg(other, "build_rule: cmd")?,
    }
    rule.test_command = string_arg(test_cmd, "build_rule: test_cmd")?;
    rule.sources = strings_arg(srcs, "build_rule: srcs")?;
    rule.data = strings_arg(data, "build_rule: data")?;
    match unset(outs) {
        Some(Value::Dict(named)) => {
            for (out_name, files) in named.items() {
                let out_name = out_name.into_string("build_rule: outs")?;
                for file in files.into_string_list("build_rule: outs")? {
                    rule.add_named_output(&out_name, file);
                }
            }
        }
        other => rule.outputs = strings_arg(other, "build_rule: outs")?,
    }
    for dep in strings_arg(deps, "build_rule: deps")? {
        rule.add_dependency(parse_label(&dep, &package)?);
    }
    for dep in strings_arg(exported_deps, "build_rule: exported_deps")? {
        rule.add_exported_dependency(parse_label(&dep, &package)?);
    }
    rule.tools = strings_arg(tools, "build_rule: tools")?;
    rule.labels = strings_arg(labels, "build_rule: labels")?;
    rule.visibility = match unset(visibility) {
        Some(v) => v.into_string_list("build_rule: visibility")?,
        None => defaults.visibility.unwrap_or_default(),
    };
    rule.test_only = match unset(test_only) {
        Some(v) => v.into_bool("build_rule: test_only")?,
        None => defaults.test_only.unwrap_or(false),
    };
    rule.licences = match unset(licences) {
        Some(v) => v.into_string_list("build_rule: licences")?,
        None => defaults.licences.unwrap_or_default(),
    };
    rule.hashes = strings_arg(hashes, "build_rule: hashes")?;
    rule.is_binary = bool_arg(binary, "build_rule: binary")?;
    rule.is_test = bool_arg(test, "build_rule: test")?;
    rule.building_description = string_arg(building_description, "build_rule: building_description")?;
    rule.needs_transitive_dependencies =
        bool_arg(needs_transitive_deps, "build_rule: needs_transitive_deps")?;
    rule.output_is_complete = bool_arg(output_is_complete, "build_rule: output_is_complete")?;

    tracing::debug!(label = %rule.label, "build_rule");
    package.register_rule(rule).map_err(graph_error)?;
    Ok(Value::None)
}

fn parse_label(text: &str, package: &Package) -> Result<BuildLabel, EvalError> {
    BuildLabel::parse(text, package.name()).map_err(graph_error)
}

/// `package(default_visibility=..., default_testonly=..., default_licences=...)`
pub(super) fn package(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let pkg = current_package(thread)?;
    if !args.positional.is_empty() {
        return Err(argument_error(builtin.name(), "accepts keyword arguments only"));
    }
    let [visibility, testonly, licences] = args.bind(
        builtin.name(),
        ["default_visibility?", "default_testonly?", "default_licences?"],
    )?;

    let mut defaults = pkg.defaults();
    if let Some(v) = unset(visibility) {
        defaults.visibility = Some(v.into_string_list("package: default_visibility")?);
    }
    if let Some(v) = unset(testonly) {
        defaults.test_only = Some(v.into_bool("package: default_testonly")?);
    }
    if let Some(v) = unset(licences) {
        defaults.licences = Some(v.into_string_list("package: default_licences")?);
    }
    pkg.set_defaults(defaults).map_err(graph_error)?;
    Ok(Value::None)
}

pub(super) fn package_name(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [] = args.bind(builtin.name(), [])?;
    Ok(Value::string(current_package(thread)?.name()))
}

/// `get_labels(target, prefix)`. Labels of transitive dependencies are not
/// known while parsing, so the result is always empty.
pub(super) fn get_labels(
    _: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [target, prefix] = args.bind(builtin.name(), ["target", "prefix"])?;
    required(target, "get_labels: target")?;
    required(prefix, "get_labels: prefix")?;
    Ok(Value::list(Vec::new()))
}

/// Run `f` on the rule named by `target` in the bound package.
fn with_target<R>(
    thread: &Thread,
    target: Option<Value>,
    context: &str,
    f: impl FnOnce(&mut BuildRule, &Package) -> Result<R, EvalError>,
) -> Result<R, EvalError> {
    let pkg = current_package(thread)?;
    let target = required(target, context)?;
    let name = pkg.resolve_rule_name(&target).map_err(graph_error)?;
    pkg.with_rule(&name, |rule| f(rule, &pkg)).map_err(graph_error)?
}

pub(super) fn get_command(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [target, config] = args.bind(builtin.name(), ["target", "config?"])?;
    let config = string_arg(config, "get_command: config")?;
    with_target(thread, target, "get_command: target", |rule, _| {
        Ok(Value::string(rule.command_for(&config)))
    })
}

/// `set_command(target, command)` or `set_command(target, config, command)`.
pub(super) fn set_command(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [target, config_or_command, command] =
        args.bind(builtin.name(), ["target", "config_or_command", "command?"])?;
    let first = required(config_or_command, "set_command: config_or_command")?;
    let (config, command) = match unset(command) {
        Some(command) => (first, command.into_string("set_command: command")?),
        None => (String::new(), first),
    };
    with_target(thread, target, "set_command: target", |rule, _| {
        rule.set_command_for(&config, command);
        Ok(Value::None)
    })
}

/// `add_out(target, out)` or `add_out(target, name, out)`.
pub(super) fn add_out(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [target, name, out] = args.bind(builtin.name(), ["target", "name", "out?"])?;
    let name = required(name, "add_out: name")?;
    let out = string_arg(out, "add_out: out")?;
    with_target(thread, target, "add_out: target", |rule, _| {
        if out.is_empty() {
            rule.add_output(name);
        } else {
            rule.add_named_output(&name, out);
        }
        Ok(Value::None)
    })
}

pub(super) fn add_licence(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [target, licence] = args.bind(builtin.name(), ["target", "licence"])?;
    let licence = required(licence, "add_licence: licence")?;
    with_target(thread, target, "add_licence: target", |rule, _| {
        rule.add_licence(licence);
        Ok(Value::None)
    })
}

pub(super) fn add_dep(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [target, dep, exported] = args.bind(builtin.name(), ["target", "dep", "exported?"])?;
    let dep = required(dep, "add_dep: dep")?;
    let exported = bool_arg(exported, "add_dep: exported")?;
    with_target(thread, target, "add_dep: target", |rule, pkg| {
        let label = parse_label(&dep, pkg)?;
        if exported {
            rule.add_exported_dependency(label);
        } else {
            rule.add_dependency(label);
        }
        Ok(Value::None)
    })
}

pub(super) fn add_exported_dep(
    thread: &mut Thread,
    builtin: &Builtin,
    args: Arguments,
) -> Result<Value, EvalError> {
    let [target, dep] = args.bind(builtin.name(), ["target", "dep"])?;
    let dep = required(dep, "add_exported_dep: dep")?;
    with_target(thread, target, "add_exported_dep: target", |rule, pkg| {
        rule.add_exported_dependency(parse_label(&dep, pkg)?);
        Ok(Value::None)
    })
}

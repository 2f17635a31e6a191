//! Command template expansion, execution, and registry instantiation.
//!
//! Recipe commands reference their context through `{{…}}` placeholders:
//! `{{inputs.N}}` expands to the Nth input's filenames joined with spaces,
//! `{{output}}` to the primary output filename `{prefix}.{suffix}`, and
//! `{{prefix}}` / `{{suffix}}` to the raw parts. Expansion happens at
//! execution time, once input filenames are known; `check_template` performs
//! the static part of that validation at catalog load. Expanded commands run
//! through `bash -c` so redirections and pipelines in recipe templates
//! behave as written.

use std::process::Command;

use log::debug;

use crate::catalog::Catalog;
use crate::core::errors::{DynError, RegistryError};
use crate::core::registry::IndexRegistry;
use crate::core::types::ResolvedInput;

/// Statically check a template: placeholders must be well-formed, known, and
/// input ordinals must be in range.
pub fn check_template(template: &str, input_count: usize) -> Result<(), String> {
    let mut start = 0;
    while let Some(open) = template[start..].find("{{") {
        let open = start + open;
        let close = template[open..]
            .find("}}")
            .ok_or_else(|| format!("unclosed template at position {}", open))?;
        let close = open + close + 2;
        let key = template[open + 2..close - 2].trim();
        check_key(key, input_count)?;
        start = close;
    }
    Ok(())
}

fn check_key(key: &str, input_count: usize) -> Result<(), String> {
    match key {
        "output" | "prefix" | "suffix" => Ok(()),
        _ => {
            let ordinal = key
                .strip_prefix("inputs.")
                .ok_or_else(|| format!("unknown template variable: {}", key))?;
            let n: usize = ordinal
                .parse()
                .map_err(|_| format!("invalid input ordinal: {}", key))?;
            if n >= input_count {
                return Err(format!(
                    "template references {{{{{}}}}} but the recipe has {} input(s)",
                    key, input_count
                ));
            }
            Ok(())
        }
    }
}

/// Expand all placeholders in a template against resolved inputs.
pub fn expand_template(
    template: &str,
    inputs: &[ResolvedInput],
    prefix: &str,
    suffix: &str,
) -> Result<String, String> {
    let mut result = template.to_string();
    let mut start = 0;

    while let Some(open) = result[start..].find("{{") {
        let open = start + open;
        let close = result[open..]
            .find("}}")
            .ok_or_else(|| format!("unclosed template at position {}", open))?;
        let close = open + close + 2;
        let key = result[open + 2..close - 2].trim();

        let value = match key {
            "output" => format!("{}.{}", prefix, suffix),
            "prefix" => prefix.to_string(),
            "suffix" => suffix.to_string(),
            _ => {
                check_key(key, inputs.len())?;
                let n: usize = key
                    .strip_prefix("inputs.")
                    .expect("checked by check_key")
                    .parse()
                    .expect("checked by check_key");
                inputs[n].filenames.join(" ")
            }
        };

        result.replace_range(open..close, &value);
        start = open + value.len();
    }

    Ok(result)
}

/// Run an expanded recipe command, failing on a nonzero exit with the
/// command's stderr in the error.
fn run_command(script: &str) -> Result<(), DynError> {
    let output = Command::new("bash")
        .arg("-c")
        .arg(script)
        .output()
        .map_err(|e| format!("failed to run recipe command: {}", e))?;
    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "command exited with status {}: {}",
            code,
            stderr.trim()
        )
        .into());
    }
    Ok(())
}

/// Build an [`IndexRegistry`] from a catalog. Recipe executors expand their
/// command template, run it through local bash, and return the expanded
/// output filenames.
pub fn instantiate(catalog: &Catalog) -> Result<IndexRegistry, RegistryError> {
    let mut registry = IndexRegistry::new();

    for (id, decl) in &catalog.artifacts {
        registry.register_artifact(id, &decl.suffix)?;
    }

    for decl in &catalog.recipes {
        let inputs: Vec<&str> = decl.inputs.iter().map(String::as_str).collect();
        let command = decl.command.clone();
        let outputs = decl.outputs.clone();
        registry.register_recipe(
            &decl.output,
            &inputs,
            move |resolved: &[ResolvedInput], prefix: &str, suffix: &str| -> Result<Vec<String>, DynError> {
                let script = expand_template(&command, resolved, prefix, suffix)?;
                debug!("running: {}", script);
                run_command(&script)?;
                let mut produced = Vec::new();
                if outputs.is_empty() {
                    produced.push(format!("{}.{}", prefix, suffix));
                } else {
                    for template in &outputs {
                        produced.push(expand_template(template, resolved, prefix, suffix)?);
                    }
                }
                Ok(produced)
            },
        )?;
    }

    for (id, filenames) in &catalog.provide {
        registry.provide(id, filenames.clone())?;
    }

    if let Some(ref prefix) = catalog.output_prefix {
        registry.set_output_prefix(prefix);
    }
    registry.set_keep_intermediates(catalog.keep_intermediates);

    Ok(registry)
}

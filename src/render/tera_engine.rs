// src/render/tera_engine.rs

use std::collections::HashMap;

use anyhow::{Context as _, Result};
use serde_json::Value;
use tera::{Context, Tera};

use super::TemplateEngine;
use crate::resolve::Task;

/// Templating option that turns HTML autoescaping off.
pub const NO_ESCAPE_OPTION: &str = "noEscape";

const TEMPLATE_NAME: &str = "email.html";

/// `tera` backed templating.
///
/// Each render builds a fresh engine so the `t` helper can be bound to the
/// task's locale. Registered functions:
///
/// - `t(values=[...])`: entry at the task's locale index, else the first.
#[derive(Debug, Clone, Default)]
pub struct TeraEngine;

impl TemplateEngine for TeraEngine {
    fn render(&self, source: &str, task: &Task) -> Result<String> {
        let mut engine = Tera::default();
        if no_escape(task) {
            engine.autoescape_on(vec![]);
        }
        engine.register_function(
            "t",
            LocaleText {
                index: task.locale_index(),
            },
        );
        engine
            .add_raw_template(TEMPLATE_NAME, source)
            .with_context(|| format!("parsing template {:?}", task.input_path))?;

        let context = Context::from_value(Value::Object(task.templating_context.clone()))
            .context("building template context")?;

        engine
            .render(TEMPLATE_NAME, &context)
            .with_context(|| format!("rendering {:?} for locale {}", task.input_path, task.locale))
    }
}

fn no_escape(task: &Task) -> bool {
    task.templating_options
        .get(NO_ESCAPE_OPTION)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// The `t` template function.
struct LocaleText {
    index: usize,
}

impl tera::Function for LocaleText {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let values = match args.get("values") {
            Some(Value::Array(values)) => values,
            Some(other) => {
                return Err(tera::Error::msg(format!(
                    "t: `values` must be an array, got {other}"
                )));
            }
            None => return Err(tera::Error::msg("t: missing `values` argument")),
        };

        Ok(values
            .get(self.index)
            .or_else(|| values.first())
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn is_safe(&self) -> bool {
        false
    }
}

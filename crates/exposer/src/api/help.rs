//! The built-in `help` operation.

use super::declaration::{Declaration, Exposable};
use super::registry::{API_LABEL, Api};
use super::value::Value;

pub(crate) struct Help;

impl Exposable for Help {
    fn instance_name(&self) -> &str {
        "Help"
    }

    fn declarations(&self) -> Vec<Declaration> {
        vec![
            Declaration::new("help", |call| {
                let text = render(call.api(), call.str(0)?, call.str(1)?);
                Ok(Value::String(text))
            })
            .arguments(["SearchString", "Options"])
            .required(0)
            .description(
                "Lists the syntax of every operation whose name contains SearchString. \
                 Option v adds descriptions, option l lists labels instead.",
            )
            .labels([API_LABEL]),
        ]
    }
}

/// Renders help text for `api`.
///
/// Matching ignores ASCII case. Operations are listed by name.
pub(crate) fn render(api: &Api, search: &str, options: &str) -> String {
    let verbose = options.contains('v');
    if options.contains('l') {
        return api
            .labels()
            .map(|label| {
                if verbose && !label.description().is_empty() {
                    format!("{} - {}", label.name(), label.description())
                } else {
                    label.name().to_owned()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
    }
    let needle = search.to_ascii_lowercase();
    api.operations()
        .filter(|operation| operation.name().to_ascii_lowercase().contains(&needle))
        .map(|operation| {
            let syntax = operation.syntax();
            if verbose && !operation.description().is_empty() {
                format!("{syntax}\n    {}", operation.description())
            } else {
                syntax
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

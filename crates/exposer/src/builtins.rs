//! Operations the daemon exposes out of the box.

use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::api::{API_LABEL, Api, Argument, DataType, Declaration, Exposable, OperationFailure, Value};
use crate::errors::SetupError;

const MAX_ECHO_TIMES: i64 = 100;

/// `ping`, `echo` and `time`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinOperations;

impl Exposable for BuiltinOperations {
    fn instance_name(&self) -> &str {
        "BuiltinOperations"
    }

    fn declarations(&self) -> Vec<Declaration> {
        vec![
            Declaration::new("ping", |_call| Ok(Value::from("pong")))
                .description("Answers pong")
                .labels([API_LABEL]),
            Declaration::new("echo", |call| {
                let times = call.int(1)?;
                if !(1..=MAX_ECHO_TIMES).contains(&times) {
                    return Err(OperationFailure::new("Times must be between 1 and 100")
                        .with_property("times", times.to_string()));
                }
                let text = call.str(0)?;
                let repeated = (0..times).map(|_| text).collect::<Vec<_>>().join(" ");
                Ok(Value::from(repeated))
            })
            .arguments(["Text", "Times"])
            .required(1)
            .aliases(["say"])
            .description("Repeats Text Times times, separated by spaces")
            .labels([API_LABEL]),
            Declaration::new("time", |call| {
                Ok(Value::Json(json!({
                    "utc": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                    "sender": call.context().sender(),
                })))
            })
            .returns("JSON")
            .description("Current UTC time and the caller as seen by the server")
            .labels([API_LABEL]),
        ]
    }
}

/// Registry holding the built-in `help` plus [`BuiltinOperations`].
///
/// # Errors
///
/// Fails only if the built-in declarations are inconsistent.
pub fn builtin_api() -> Result<Api, SetupError> {
    let mut api = Api::new()?;
    api.add_argument(
        Argument::builder("Text", DataType::String)
            .description("Text to repeat")
            .build()?,
    )?;
    api.add_argument(
        Argument::builder("Times", DataType::Int)
            .description("Repetitions, 1 to 100")
            .default_value("1")
            .build()?,
    )?;
    api.register(&BuiltinOperations)?;
    Ok(api)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::api::CallError;
    use crate::context::RequestContext;

    #[fixture]
    fn api() -> Api {
        builtin_api().expect("built-ins register")
    }

    fn call(api: &Api, name: &str, values: &[&str]) -> Result<Value, CallError> {
        let values = values.iter().map(|v| (*v).to_owned()).collect::<Vec<_>>();
        let mut context = RequestContext::new("tester", 1);
        api.resolve(name)?.invoke(api, &values, &[], 1, &mut context)
    }

    #[rstest]
    fn ping_answers_pong(api: Api) {
        assert_eq!(call(&api, "ping", &[]).expect("ping"), Value::from("pong"));
    }

    #[rstest]
    #[case(&["hey"], "hey")]
    #[case(&["hey", "3"], "hey hey hey")]
    fn echo_repeats_text(api: Api, #[case] values: &[&str], #[case] expected: &str) {
        assert_eq!(call(&api, "echo", values).expect("echo"), Value::from(expected));
        assert_eq!(call(&api, "say", values).expect("alias"), Value::from(expected));
    }

    #[rstest]
    fn echo_rejects_excessive_repetition(api: Api) {
        let error = call(&api, "echo", &["hey", "500"]).expect_err("too many");
        assert!(matches!(error, CallError::Invocation(_)), "{error:?}");
    }

    #[rstest]
    fn time_reports_the_sender(api: Api) {
        let value = call(&api, "time", &[]).expect("time");
        let json = value.to_json();
        assert_eq!(json["sender"], "tester");
        assert!(json["utc"].as_str().is_some_and(|utc| utc.ends_with('Z')));
    }

    #[rstest]
    fn help_lists_the_builtins(api: Api) {
        let text = call(&api, "help", &[]).expect("help").to_canonical_string();
        for name in ["echo", "help", "ping", "time"] {
            assert!(text.contains(name), "missing {name} in {text}");
        }
    }
}

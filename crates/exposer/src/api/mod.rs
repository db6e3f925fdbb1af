//! Operation registry and invocation.
//!
//! Operations are declared explicitly through [`Exposable`] and resolved into
//! [`Operation`] descriptors at registration time. Each call then runs the
//! same pipeline: arity check, access check, conversion of the request text
//! through each argument's [`DataType`], defaulting, and finally the handler.

mod argument;
mod call;
mod data_type;
mod declaration;
mod errors;
mod failure;
mod help;
mod operation;
mod registry;
mod value;

pub use self::argument::{Argument, ArgumentBuilder};
pub use self::call::Call;
pub use self::data_type::DataType;
pub use self::declaration::{Declaration, Exposable};
pub use self::errors::{ArgumentCountError, CallError, InvocationError};
pub use self::failure::{FailureProperties, OperationFailure};
pub use self::operation::{Handler, Operation};
pub use self::registry::{API_LABEL, Api, Label};
pub use self::value::Value;

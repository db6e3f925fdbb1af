//! Behaviour tests spanning several modules.

mod bootstrap_behaviour;
mod dispatch_behaviour;
mod support;

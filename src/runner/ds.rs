//! Runtime data structures: values, objects, environments and the realm.

pub mod env_record;
pub mod error;
pub mod execution_context;
pub mod function_object;
pub mod lex_env;
pub mod object;
pub mod object_property;
pub mod operations;
pub mod realm;
pub mod value;

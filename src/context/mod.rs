//! 上下文快照协议：构建、确定性序列化、校验

pub mod builder;
pub mod model;
pub mod validator;

pub use builder::{build_context, EnvOverrides};
pub use model::{context_json_schema, Context, Env, Team, CONTEXT_KEY_ORDER};
pub use validator::{validate, validate_context};
